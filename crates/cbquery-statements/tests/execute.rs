//! Execution through a recording executor.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use cbquery_core::{PlaceholderFormat, RenderError, Value, args};
use cbquery_statements::{
	CancellationToken, ExecuteError, ExecuteResult, QueryExecutor, QueryResult, Statement, Gt,
	execute_with, insert, select,
};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use serde::Deserialize;

struct Rows(VecDeque<serde_json::Value>);

#[async_trait]
impl QueryResult for Rows {
	async fn next_row(&mut self) -> ExecuteResult<Option<serde_json::Value>> {
		Ok(self.0.pop_front())
	}
}

#[derive(Default)]
struct RecordingExecutor {
	calls: Mutex<Vec<(String, Vec<Value>)>>,
	rows: Vec<serde_json::Value>,
	delay: Option<Duration>,
	fail: bool,
}

impl RecordingExecutor {
	fn calls(&self) -> Vec<(String, Vec<Value>)> {
		self.calls.lock().clone()
	}
}

#[async_trait]
impl QueryExecutor for RecordingExecutor {
	async fn execute(&self, query: &str, args: &[Value]) -> ExecuteResult<Box<dyn QueryResult>> {
		self.calls.lock().push((query.to_owned(), args.to_vec()));
		if let Some(delay) = self.delay {
			tokio::time::sleep(delay).await;
		}
		if self.fail {
			return Err(ExecuteError::Backend("connection refused".into()));
		}
		Ok(Box::new(Rows(self.rows.iter().cloned().collect())))
	}
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
	id: String,
	name: String,
}

#[fixture]
fn executor() -> RecordingExecutor {
	RecordingExecutor {
		rows: vec![
			serde_json::json!({"id": "u1", "name": "Alice"}),
			serde_json::json!({"id": "u2", "name": "Bob"}),
		],
		..RecordingExecutor::default()
	}
}

#[rstest]
#[tokio::test]
async fn test_execute_forwards_rendered_text_and_args(executor: RecordingExecutor) {
	// Arrange
	let query = select(["id", "name"])
		.from("users")
		.where_("status = ?", ["active"])
		.placeholder_format(PlaceholderFormat::Dollar);

	// Act
	let mut result = query.execute(&executor).await.unwrap();
	let users: Vec<User> = result.all().await.unwrap();

	// Assert
	assert_eq!(
		executor.calls(),
		vec![("SELECT id, name FROM users WHERE status = $1".to_owned(), args!["active"])]
	);
	assert_eq!(users.len(), 2);
	assert_eq!(users[1], User { id: "u2".into(), name: "Bob".into() });
}

#[rstest]
#[tokio::test]
async fn test_one_returns_first_row(executor: RecordingExecutor) {
	let mut result = execute_with(&executor, &select(["*"]).from("users")).await.unwrap();

	let user: User = result.one().await.unwrap();

	assert_eq!(user.id, "u1");
}

#[rstest]
#[tokio::test]
async fn test_render_error_skips_executor(executor: RecordingExecutor) {
	let query = select(["*"]).from("users").where_expr(Gt::new().column("age", Value::Null));

	let result = query.execute(&executor).await;

	assert!(matches!(
		result,
		Err(ExecuteError::Render(RenderError::NullComparison { op: ">" }))
	));
	assert!(executor.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_backend_error_is_returned() {
	let executor = RecordingExecutor { fail: true, ..RecordingExecutor::default() };

	let result = insert("users").values([1]).execute(&executor).await;

	assert!(matches!(
		result,
		Err(ExecuteError::Backend(message)) if message == "connection refused"
	));
}

#[rstest]
#[tokio::test]
async fn test_cancelled_token_fails_before_execution(executor: RecordingExecutor) {
	// Arrange
	let token = CancellationToken::new();
	token.cancel();

	// Act
	let result = select(["*"]).from("users").execute_cancellable(&executor, &token).await;

	// Assert
	assert!(matches!(result, Err(ExecuteError::Cancelled)));
	assert!(executor.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn test_cancellation_interrupts_slow_execution() {
	// Arrange
	let executor = Arc::new(RecordingExecutor {
		delay: Some(Duration::from_secs(30)),
		..RecordingExecutor::default()
	});
	let token = CancellationToken::new();
	let canceller = token.clone();
	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(20)).await;
		canceller.cancel();
	});

	// Act
	let result = select(["*"]).from("users").execute_cancellable(executor.as_ref(), &token).await;

	// Assert
	assert!(matches!(result, Err(ExecuteError::Cancelled)));
	assert_eq!(executor.calls().len(), 1);
}

#[rstest]
#[tokio::test]
async fn test_uncancelled_token_runs_to_completion(executor: RecordingExecutor) {
	let token = CancellationToken::new();

	let mut result =
		select(["*"]).from("users").execute_cancellable(&executor, &token).await.unwrap();

	assert_eq!(result.all::<User>().await.unwrap().len(), 2);
}
