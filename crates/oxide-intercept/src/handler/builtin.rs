//! Ready-made field handlers.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use thiserror::Error;

use super::{FieldHandler, TableFields, WILDCARD_TABLE};
use crate::error::BoxError;
use crate::value::SqlValue;

type HandlerFn = dyn Fn(&str, &str, SqlValue) -> Result<SqlValue, BoxError> + Send + Sync;

/// A handler backed by a closure.
///
/// ```rust
/// use oxide_intercept::handler::{FieldHandler, FnHandler, table_fields};
/// use oxide_intercept::SqlValue;
///
/// let upper = FnHandler::new(table_fields("user", ["name"]), |_, _, value| {
///     Ok(match value {
///         SqlValue::Text(s) => SqlValue::Text(s.to_uppercase()),
///         other => other,
///     })
/// })
/// .named("upper");
///
/// assert_eq!(upper.name(), "upper");
/// ```
pub struct FnHandler {
    name: String,
    fields: TableFields,
    f: Box<HandlerFn>,
}

impl FnHandler {
    /// Creates a handler for `fields` that delegates to `f`.
    pub fn new<F>(fields: TableFields, f: F) -> Self
    where
        F: Fn(&str, &str, SqlValue) -> Result<SqlValue, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: String::from("fn"),
            fields,
            f: Box::new(f),
        }
    }

    /// Sets the name used in logs and errors.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl FieldHandler for FnHandler {
    fn handle(
        &self,
        table_name: &str,
        field_name: &str,
        field_value: SqlValue,
    ) -> Result<SqlValue, BoxError> {
        (self.f)(table_name, field_name, field_value)
    }

    fn target_table_fields(&self) -> TableFields {
        self.fields.clone()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Masks text values, keeping only a trailing window readable.
///
/// Values no longer than the window are masked entirely. Non-text values
/// are returned unchanged.
///
/// ```rust
/// use oxide_intercept::handler::MaskHandler;
///
/// let mask = MaskHandler::everywhere(["phone_number"]).keep_last(4);
/// assert_eq!(mask.mask("5551234567"), "******4567");
/// assert_eq!(mask.mask("123"), "***");
/// ```
#[derive(Debug, Clone)]
pub struct MaskHandler {
    fields: TableFields,
    mask_char: char,
    keep_last: usize,
}

impl MaskHandler {
    /// Default number of trailing characters left readable.
    pub const DEFAULT_KEEP_LAST: usize = 4;

    /// Creates a mask handler for the given scope.
    #[must_use]
    pub const fn new(fields: TableFields) -> Self {
        Self {
            fields,
            mask_char: '*',
            keep_last: Self::DEFAULT_KEEP_LAST,
        }
    }

    /// Creates a mask handler for the given columns of every table.
    pub fn everywhere<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(super::table_fields(WILDCARD_TABLE, columns))
    }

    /// Sets the mask character.
    #[must_use]
    pub fn mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    /// Sets how many trailing characters stay readable.
    #[must_use]
    pub fn keep_last(mut self, keep_last: usize) -> Self {
        self.keep_last = keep_last;
        self
    }

    /// Masks a string.
    #[must_use]
    pub fn mask(&self, text: &str) -> String {
        let len = text.chars().count();
        let masked = if len > self.keep_last {
            len - self.keep_last
        } else {
            len
        };
        std::iter::repeat(self.mask_char)
            .take(masked)
            .chain(text.chars().skip(masked))
            .collect()
    }
}

impl FieldHandler for MaskHandler {
    fn handle(
        &self,
        _table_name: &str,
        _field_name: &str,
        field_value: SqlValue,
    ) -> Result<SqlValue, BoxError> {
        Ok(match field_value {
            SqlValue::Text(text) => SqlValue::Text(self.mask(&text)),
            other => other,
        })
    }

    fn target_table_fields(&self) -> TableFields {
        self.fields.clone()
    }

    fn name(&self) -> &str {
        "mask"
    }
}

/// The temporal type a [`TemporalCoercion`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalTarget {
    /// Calendar date; timestamps are truncated to their date.
    Date,
    /// Date and time; dates are extended to midnight.
    Timestamp,
}

/// A text value that is neither an ISO date nor an ISO timestamp.
#[derive(Debug, Error)]
#[error("cannot read `{text}` as a date or timestamp")]
pub struct TemporalParseError {
    /// The rejected text.
    pub text: String,
}

/// Coerces temporal column values to a single temporal type.
///
/// Drivers often hand back `DATE` columns as timestamps, or temporal columns
/// as ISO text. This handler normalizes declared columns to `target`:
/// timestamps, dates and ISO text (`2024-01-31`, `2024-01-31 08:30:00`,
/// `2024-01-31T08:30:00.250`) are converted, other values pass through
/// unchanged, and unreadable text is an error.
#[derive(Debug, Clone)]
pub struct TemporalCoercion {
    fields: TableFields,
    target: TemporalTarget,
}

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

impl TemporalCoercion {
    /// Coerces the declared columns to dates.
    #[must_use]
    pub const fn dates(fields: TableFields) -> Self {
        Self {
            fields,
            target: TemporalTarget::Date,
        }
    }

    /// Coerces the declared columns to timestamps.
    #[must_use]
    pub const fn timestamps(fields: TableFields) -> Self {
        Self {
            fields,
            target: TemporalTarget::Timestamp,
        }
    }

    /// The type values are coerced to.
    #[must_use]
    pub const fn target(&self) -> TemporalTarget {
        self.target
    }

    /// Converts one value.
    ///
    /// # Errors
    ///
    /// Returns [`TemporalParseError`] for text that is not an ISO date or
    /// timestamp.
    pub fn coerce(&self, value: SqlValue) -> Result<SqlValue, TemporalParseError> {
        let value = match value {
            SqlValue::Text(text) => parse_temporal(&text)?,
            other => other,
        };
        Ok(match (self.target, value) {
            (TemporalTarget::Date, SqlValue::Timestamp(ts)) => SqlValue::Date(ts.date()),
            (TemporalTarget::Timestamp, SqlValue::Date(date)) => {
                SqlValue::Timestamp(date.and_time(NaiveTime::MIN))
            }
            (_, other) => other,
        })
    }
}

fn parse_temporal(text: &str) -> Result<SqlValue, TemporalParseError> {
    let text = text.trim();
    for format in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(SqlValue::Timestamp(ts));
        }
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .map(SqlValue::Date)
        .map_err(|_| TemporalParseError {
            text: text.to_string(),
        })
}

impl FieldHandler for TemporalCoercion {
    fn handle(
        &self,
        _table_name: &str,
        _field_name: &str,
        field_value: SqlValue,
    ) -> Result<SqlValue, BoxError> {
        Ok(self.coerce(field_value)?)
    }

    fn target_table_fields(&self) -> TableFields {
        self.fields.clone()
    }

    fn name(&self) -> &str {
        match self.target {
            TemporalTarget::Date => "temporal-date",
            TemporalTarget::Timestamp => "temporal-timestamp",
        }
    }
}
