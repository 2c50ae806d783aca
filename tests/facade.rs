//! The facade re-exports, exercised the way an application would use them.

use async_trait::async_trait;
use cbquery::prelude::*;
use cbquery::{builder_shape, record};
use cbquery::cbquery_core::registry::Registry;
use cbquery::cbquery_persistent::{List, Map};
use cbquery::cbquery_statements::ExecuteResult;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
fn test_prelude_builds_every_statement() {
	let rendered = [
		select(["*"]).from("users").render().unwrap().0,
		insert("users").values([1]).render().unwrap().0,
		upsert("users").document("k", 1).render().unwrap().0,
		update("users").set("a", 1).render().unwrap().0,
		delete("users").render().unwrap().0,
	];

	assert_eq!(
		rendered,
		[
			"SELECT * FROM users",
			"INSERT INTO users VALUES (?)",
			"UPSERT INTO users (KEY, VALUE) VALUES (?, ?)",
			"UPDATE users SET a = ?",
			"DELETE FROM users",
		]
	);
}

#[rstest]
fn test_custom_shape_through_facade() {
	// Arrange
	builder_shape! {
		struct TagsBuilder;
	}
	record! {
		struct TagsData {
			tags: Vec<String>,
		}
	}
	let registry = Registry::new();
	let tags: TagsBuilder = registry.register::<TagsBuilder, TagsData>();

	// Act
	let tags = builder::append(&tags, "tags", ["a", "b"]);
	let record = registry.get_as_record(&tags).unwrap();

	// Assert
	assert_eq!(
		record.downcast_ref::<TagsData>().map(|d| d.tags.clone()),
		Some(vec!["a".to_owned(), "b".to_owned()])
	);
}

#[rstest]
fn test_persistent_containers_are_exposed() {
	let list = List::new().prepend(1).prepend(2);
	let map = Map::new().set("a", 1);

	assert_eq!(list.iter().copied().collect::<Vec<_>>(), vec![2, 1]);
	assert_eq!(map.lookup("a"), Some(&1));
}

struct NoRows;

#[async_trait]
impl QueryResult for NoRows {
	async fn next_row(&mut self) -> ExecuteResult<Option<serde_json::Value>> {
		Ok(None)
	}
}

struct EmptyExecutor;

#[async_trait]
impl QueryExecutor for EmptyExecutor {
	async fn execute(&self, _query: &str, _args: &[Value]) -> ExecuteResult<Box<dyn QueryResult>> {
		Ok(Box::new(NoRows))
	}
}

#[rstest]
#[tokio::test]
async fn test_execute_through_prelude() {
	let mut result = select(["*"]).from("users").execute(&EmptyExecutor).await.unwrap();

	let one = result.one::<serde_json::Value>().await;

	assert!(matches!(one, Err(ExecuteError::NoRows)));
}
