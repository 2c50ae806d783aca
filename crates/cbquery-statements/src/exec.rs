//! The execution boundary.
//!
//! This crate never talks to a database. A [`QueryExecutor`] receives the
//! final query text and its arguments exactly as rendered and hands back a
//! [`QueryResult`] of JSON rows.

use async_trait::async_trait;
use cbquery_core::{Fragment, RenderError, Value};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors raised while executing a statement.
#[derive(Debug, Error)]
pub enum ExecuteError {
	/// The statement could not be rendered; nothing was sent.
	#[error(transparent)]
	Render(#[from] RenderError),

	/// The executor reported a failure.
	#[error("query execution failed: {0}")]
	Backend(String),

	/// The cancellation token fired before the executor finished.
	#[error("query execution was cancelled")]
	Cancelled,

	/// [`one`](QueryResult::one) was called on an empty result.
	#[error("query returned no rows")]
	NoRows,

	/// A row did not deserialize into the requested type.
	#[error("failed to decode row: {0}")]
	Decode(#[from] serde_json::Error),
}

/// Result type for execution.
pub type ExecuteResult<T> = Result<T, ExecuteError>;

/// A stream of result rows.
#[async_trait]
pub trait QueryResult: Send {
	/// Returns the next row, or `None` once the result is exhausted.
	async fn next_row(&mut self) -> ExecuteResult<Option<serde_json::Value>>;

	/// Releases the result.
	async fn close(&mut self) -> ExecuteResult<()> {
		Ok(())
	}
}

impl dyn QueryResult {
	/// Decodes the first row and closes the result.
	pub async fn one<T: DeserializeOwned>(&mut self) -> ExecuteResult<T> {
		let row = self.next_row().await?;
		self.close().await?;
		match row {
			Some(row) => Ok(serde_json::from_value(row)?),
			None => Err(ExecuteError::NoRows),
		}
	}

	/// Decodes every remaining row and closes the result.
	pub async fn all<T: DeserializeOwned>(&mut self) -> ExecuteResult<Vec<T>> {
		let mut rows = Vec::new();
		while let Some(row) = self.next_row().await? {
			rows.push(serde_json::from_value(row)?);
		}
		self.close().await?;
		Ok(rows)
	}
}

/// Runs query text against a backend.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
	async fn execute(&self, query: &str, args: &[Value]) -> ExecuteResult<Box<dyn QueryResult>>;

	/// Like [`execute`](Self::execute), but gives up with
	/// [`ExecuteError::Cancelled`] once `token` is cancelled.
	async fn execute_cancellable(
		&self,
		token: &CancellationToken,
		query: &str,
		args: &[Value],
	) -> ExecuteResult<Box<dyn QueryResult>> {
		tokio::select! {
			biased;
			_ = token.cancelled() => Err(ExecuteError::Cancelled),
			result = self.execute(query, args) => result,
		}
	}
}

/// Renders `statement` and forwards its text and arguments to `executor`.
pub async fn execute_with(
	executor: &dyn QueryExecutor,
	statement: &dyn Fragment,
) -> ExecuteResult<Box<dyn QueryResult>> {
	let (query, args) = statement.render()?;
	tracing::trace!(%query, args = args.len(), "executing statement");
	executor.execute(&query, &args).await
}

/// Cancellable form of [`execute_with`].
///
/// An already cancelled token fails before the executor is called.
pub async fn execute_cancellable_with(
	executor: &dyn QueryExecutor,
	token: &CancellationToken,
	statement: &dyn Fragment,
) -> ExecuteResult<Box<dyn QueryResult>> {
	let (query, args) = statement.render()?;
	if token.is_cancelled() {
		return Err(ExecuteError::Cancelled);
	}
	tracing::trace!(%query, args = args.len(), "executing cancellable statement");
	executor.execute_cancellable(token, &query, &args).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::VecDeque;

	struct Rows(VecDeque<serde_json::Value>);

	#[async_trait]
	impl QueryResult for Rows {
		async fn next_row(&mut self) -> ExecuteResult<Option<serde_json::Value>> {
			Ok(self.0.pop_front())
		}
	}

	#[derive(Debug, serde::Deserialize, PartialEq)]
	struct User {
		id: String,
	}

	#[tokio::test]
	async fn test_one_decodes_first_row() {
		// Arrange
		let mut rows: Box<dyn QueryResult> = Box::new(Rows(VecDeque::from([
			serde_json::json!({"id": "u1"}),
			serde_json::json!({"id": "u2"}),
		])));

		// Act
		let user: User = rows.one().await.unwrap();

		// Assert
		assert_eq!(user, User { id: "u1".into() });
	}

	#[tokio::test]
	async fn test_one_on_empty_result() {
		let mut rows: Box<dyn QueryResult> = Box::new(Rows(VecDeque::new()));

		let result = rows.one::<User>().await;

		assert!(matches!(result, Err(ExecuteError::NoRows)));
	}

	#[tokio::test]
	async fn test_all_reports_decode_errors() {
		let mut rows: Box<dyn QueryResult> = Box::new(Rows(VecDeque::from([
			serde_json::json!({"id": "u1"}),
			serde_json::json!({"id": 7}),
		])));

		let result = rows.all::<User>().await;

		assert!(matches!(result, Err(ExecuteError::Decode(_))));
	}
}
