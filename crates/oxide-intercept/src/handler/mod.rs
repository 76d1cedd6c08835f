//! Field handlers and the registry that dispatches to them.
//!
//! A [`FieldHandler`] declares which columns of which tables it wants to see
//! and transforms their values. Handlers are collected in a
//! [`HandlerRegistry`], which resolves at most one handler per
//! (table, field) pair at dispatch time.

mod builtin;
mod registry;

use std::collections::BTreeMap;

use crate::error::BoxError;
use crate::value::SqlValue;

pub use builtin::{FnHandler, MaskHandler, TemporalCoercion, TemporalParseError, TemporalTarget};
pub use registry::HandlerRegistry;

/// Table token that matches every table at dispatch time.
pub const WILDCARD_TABLE: &str = "*";

/// A handler's declared scope: table name to the column names it handles.
pub type TableFields = BTreeMap<String, Vec<String>>;

/// Aggregated scope of all handlers in a registry: table name to the
/// ordered, de-duplicated column names any handler wants for that table.
pub type ScopeMap = BTreeMap<String, Vec<String>>;

/// Builds a [`TableFields`] declaration for a single table.
///
/// ```rust
/// use oxide_intercept::handler::table_fields;
///
/// let fields = table_fields("user", ["name", "phone_number"]);
/// assert_eq!(fields["user"], ["name", "phone_number"]);
/// ```
pub fn table_fields<I, S>(table: &str, columns: I) -> TableFields
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut fields = TableFields::new();
    fields.insert(
        table.to_string(),
        columns.into_iter().map(Into::into).collect(),
    );
    fields
}

/// A pluggable transformation applied to selected table columns.
///
/// # Example
///
/// ```rust
/// use oxide_intercept::error::BoxError;
/// use oxide_intercept::handler::{FieldHandler, TableFields, table_fields};
/// use oxide_intercept::SqlValue;
///
/// struct Greeting;
///
/// impl FieldHandler for Greeting {
///     fn handle(&self, _table: &str, _field: &str, value: SqlValue) -> Result<SqlValue, BoxError> {
///         Ok(SqlValue::Text(format!("Dear {value}")))
///     }
///
///     fn target_table_fields(&self) -> TableFields {
///         table_fields("user", ["name", "phone_number"])
///     }
/// }
/// ```
pub trait FieldHandler: Send + Sync {
    /// Transforms one field value.
    ///
    /// `field_name` is the column name as declared in
    /// [`target_table_fields`](Self::target_table_fields). The value is never
    /// `NULL`, and the returned replacement must not be `NULL` either.
    ///
    /// # Errors
    ///
    /// Any error aborts interception of the whole statement.
    fn handle(
        &self,
        table_name: &str,
        field_name: &str,
        field_value: SqlValue,
    ) -> Result<SqlValue, BoxError>;

    /// The tables and columns this handler wants to see. Use
    /// [`WILDCARD_TABLE`] to match a column in every table.
    fn target_table_fields(&self) -> TableFields;

    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
