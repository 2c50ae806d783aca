//! # cbquery
//!
//! Immutable, composable builders for Couchbase N1QL statements.
//!
//! Every builder is a value: each method returns a new builder and leaves its
//! receiver untouched. Builders share their state structurally, so branching
//! a half-built query into several variants is cheap and thread-safe.
//!
//! ## Crates
//!
//! - [`cbquery_persistent`] - the persistent list and map builder state is
//!   made of
//! - [`cbquery_core`] - builder state, records, the shape registry and the
//!   fragment rendering protocol
//! - [`cbquery_statements`] - `SELECT`/`INSERT`/`UPSERT`/`UPDATE`/`DELETE`
//!   builders, expression helpers and the execution boundary
//!
//! ## Feature Flags
//!
//! - `statements` (default) - statement builders and expression helpers
//!
//! ## Quick Example
//!
//! ```
//! use cbquery::prelude::*;
//!
//! let base = select(["id", "name"]).from("users");
//! let active = base.where_expr(Equal::new().column("status", "active"));
//! let recent = active.order_by(["created_at DESC"]).limit(5);
//!
//! let (sql, args) = recent.placeholder_format(PlaceholderFormat::Dollar).render().unwrap();
//! assert_eq!(
//!     sql,
//!     "SELECT id, name FROM users WHERE status = $1 ORDER BY created_at DESC LIMIT 5"
//! );
//! assert_eq!(args, vec![Value::from("active")]);
//! assert_eq!(base.render().unwrap().0, "SELECT id, name FROM users");
//! ```

pub use cbquery_core;
pub use cbquery_persistent;

#[cfg(feature = "statements")]
pub use cbquery_statements;

pub use cbquery_core::{
	Builder, BuilderShape, Expr, Fragment, FragmentRef, PlaceholderFormat, Record, RenderError,
	RenderResult, Value, args, builder_shape, debug_render, record,
};

#[cfg(feature = "statements")]
pub use cbquery_statements::{
	StatementBuilder, delete, expr, insert, select, statement_builder, update, upsert,
};

/// Everything needed to build and render statements.
pub mod prelude {
	pub use cbquery_core::builder::{self, BuilderShape};
	pub use cbquery_core::{
		Expr, Fragment, PlaceholderFormat, RenderError, RenderResult, Value, args, debug_render,
	};

	#[cfg(feature = "statements")]
	pub use cbquery_statements::{
		AnalyticsSelectBuilder, And, Case, CancellationToken, DeleteBuilder, Equal, ExecuteError,
		Gt, Gte, InsertBuilder, LeftNest, LeftUnnest, Lt, Lte, Nest, NotEqual, Or, QueryExecutor,
		QueryResult, SearchOptions, SelectBuilder, Statement, StatementBuilder, Unnest,
		UpdateBuilder, UpsertBuilder, UseIndex, alias, analytics_select, delete, expr, insert,
		select, update, upsert,
	};
}
