//! N1QL statement builders for cbquery.
//!
//! Every builder here is an immutable shape over the core
//! [`Builder`](cbquery_core::Builder): each method returns a new statement,
//! so a partially built query can be reused as the base of several others.
//!
//! - **Statements**: [`select`], [`insert`], [`upsert`], [`update`],
//!   [`delete`] and the [`StatementBuilder`] factory
//! - **Expressions**: [`expr`], [`alias`], [`Equal`], [`NotEqual`],
//!   comparisons, [`And`], [`Or`] and [`Case`]
//! - **Joins**: [`Nest`], [`LeftNest`], [`Unnest`], [`LeftUnnest`]
//! - **Documents and search**: [`json`] field paths and constructors,
//!   [`UseIndex`] hints, [`fts`] search expressions and the
//!   [`analytics_select`] shape
//! - **Execution**: the [`QueryExecutor`] boundary
//!
//! # Quick Start
//!
//! ```
//! use cbquery_core::{Fragment, PlaceholderFormat};
//! use cbquery_statements::{Equal, Statement, select};
//!
//! let active = select(["id", "name"])
//!     .from("users")
//!     .where_expr(Equal::new().column("status", "active"));
//!
//! let page = active.order_by(["name"]).limit(10).offset(20);
//! let (sql, args) = page.placeholder_format(PlaceholderFormat::Dollar).render().unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT id, name FROM users WHERE status = $1 ORDER BY name LIMIT 10 OFFSET 20"
//! );
//! assert_eq!(args.len(), 1);
//! assert_eq!(active.render().unwrap().0, "SELECT id, name FROM users WHERE status = ?");
//! ```

pub mod analytics;
pub mod case;
pub mod delete;
pub mod exec;
pub mod expr;
pub mod fts;
pub mod insert;
pub mod json;
pub mod nest;
pub mod select;
pub mod settings;
pub mod statement;
pub mod update;
pub mod upsert;

pub use analytics::{AnalyticsSelectBuilder, AnalyticsSelectData};
pub use case::Case;
pub use delete::{DeleteBuilder, DeleteData};
pub use exec::{
	ExecuteError, ExecuteResult, QueryExecutor, QueryResult, execute_cancellable_with, execute_with,
};
pub use expr::{Alias, And, Equal, Gt, Gte, Lt, Lte, NotEqual, Or, alias, expr};
pub use fts::{SearchMatch, SearchOptions, SearchService};
pub use insert::{InsertBuilder, InsertData};
pub use json::{Document, IndexType, NestedField, UseIndex};
pub use nest::{LeftNest, LeftUnnest, Nest, Unnest};
pub use select::{SelectBuilder, SelectData};
pub use settings::{SettingsError, StatementSettings};
pub use statement::{
	Statement, StatementBuilder, analytics_select, delete, insert, select, statement_builder,
	update, upsert,
};
pub use update::{UpdateBuilder, UpdateData};
pub use upsert::{UpsertBuilder, UpsertData};

pub use tokio_util::sync::CancellationToken;
