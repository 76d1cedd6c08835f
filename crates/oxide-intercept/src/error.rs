//! Error types for interception.

use thiserror::Error;

use crate::value::ValueError;

/// Boxed error returned by field handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Interception errors.
///
/// None of these are recovered inside the crate: every failure is returned to
/// the caller of the hook, which decides whether the statement may proceed.
#[derive(Debug, Error)]
pub enum InterceptError {
    /// The target table of the statement could not be determined.
    #[error("cannot resolve target table from sql: {sql}")]
    TableResolution { sql: String },

    /// Malformed input to a pure helper (always a caller bug).
    #[error("illegal argument: {0}")]
    IllegalArgument(String),

    /// A registered handler failed while transforming a field.
    #[error("handler `{handler}` failed on field `{table}.{field}`")]
    FieldHandling {
        handler: String,
        table: String,
        field: String,
        #[source]
        source: BoxError,
    },

    /// A handler's replacement could not be stored back into a record.
    #[error(transparent)]
    FieldAssignment(#[from] AssignError),
}

/// A replacement value was rejected by the record field it was meant for.
#[derive(Debug, Error)]
#[error("cannot assign replacement to field `{field}`")]
pub struct AssignError {
    /// The record field name.
    pub field: String,
    /// Why the value was rejected.
    #[source]
    pub source: ValueError,
}

/// Raised on behalf of a handler that returned `NULL` as a replacement.
#[derive(Debug, Error)]
#[error("handler returned NULL; a concrete replacement value is required")]
pub struct NullReplacement;

/// Result type alias for interception operations.
pub type Result<T> = std::result::Result<T, InterceptError>;
