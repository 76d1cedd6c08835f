//! # oxide-intercept
//!
//! Table-scoped field interception for SQL statement parameters and result
//! sets.
//!
//! This crate provides:
//! - A token-based resolver that finds the table a statement acts on
//! - A registry of pluggable field handlers keyed by (table, column)
//! - A walker over records, ordered maps, sequences and any nesting of them
//! - Parameter and result interceptors that rewrite matched values in place,
//!   all or nothing
//!
//! Statement execution is left to the caller: call
//! [`ParameterInterceptor::before_execute`] before binding parameters and
//! [`ResultInterceptor::after_execute`] after mapping rows.
//!
//! ## Example
//!
//! ```rust
//! use oxide_intercept::handler::{FnHandler, table_fields};
//! use oxide_intercept::{Node, ParameterInterceptor, Record, SqlValue};
//!
//! #[derive(Debug, Record)]
//! struct User {
//!     id: i64,
//!     name: String,
//!     phone_number: String,
//! }
//!
//! let mut interceptor = ParameterInterceptor::new();
//! interceptor
//!     .register_parameter_field_handler(FnHandler::new(
//!         table_fields("user", ["name", "phone_number"]),
//!         |_, _, value| Ok(SqlValue::Text(format!("Dear {value}"))),
//!     ))
//!     .unwrap();
//!
//! let mut user = User { id: 1, name: "Alice".into(), phone_number: "555".into() };
//! let mut params = Node::map([("user", Node::record(&mut user))]);
//! interceptor
//!     .before_execute("INSERT INTO `user` (id, name, phone_number) VALUES (?, ?, ?)", &mut params)
//!     .unwrap();
//! drop(params);
//!
//! assert_eq!(user.name, "Dear Alice");
//! assert_eq!(user.phone_number, "Dear 555");
//! assert_eq!(user.id, 1);
//! ```

extern crate self as oxide_intercept;

pub mod config;
pub mod error;
pub mod handler;
pub mod interceptor;
pub mod lexer;
pub mod naming;
pub mod node;
pub mod record;
pub mod resolver;
pub mod value;
pub mod walker;

pub use config::{InterceptorConfig, Properties};
pub use error::{InterceptError, Result};
pub use handler::{FieldHandler, HandlerRegistry};
pub use interceptor::{InterceptOutcome, ParameterInterceptor, ResultInterceptor};
pub use node::{FieldMap, Node};
pub use oxide_intercept_derive::Record;
pub use record::Record;
pub use resolver::{ResolvedStatement, StatementKind, resolve_statement, resolve_table};
pub use value::{FromSqlValue, SqlValue, ToSqlValue, ValueError};
pub use walker::walk;
