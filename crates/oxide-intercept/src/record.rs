//! Named field access for structured records.
//!
//! This module provides the trait implemented by `#[derive(Record)]` so that
//! the walker can read and replace struct fields by name without reflection.

use std::fmt;

use crate::value::{SqlValue, ValueError};

/// A structured record whose fields can be read and replaced by name.
///
/// Field names follow the record's own naming convention. Records produced
/// by `#[derive(Record)]` expose their Rust field names in camelCase, which
/// matches what the handler registry derives from snake_case column names.
///
/// # Example
///
/// ```rust
/// use oxide_intercept::{Record, SqlValue};
///
/// #[derive(Debug, Record)]
/// struct User {
///     id: i64,
///     phone_number: Option<String>,
/// }
///
/// let mut user = User { id: 1, phone_number: None };
/// assert_eq!(user.field_names(), &["id", "phoneNumber"]);
///
/// user.set_field("phoneNumber", SqlValue::Text("555".into())).unwrap();
/// assert_eq!(user.phone_number.as_deref(), Some("555"));
/// ```
pub trait Record: fmt::Debug + Send {
    /// Field names in declaration order.
    fn field_names(&self) -> &'static [&'static str];

    /// Returns the current value of a field, or `None` for unknown names.
    fn get_field(&self, name: &str) -> Option<SqlValue>;

    /// Replaces the value of a field.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::UnknownField`] for unknown names, or the
    /// conversion error when the value does not fit the field's type.
    fn set_field(&mut self, name: &str, value: SqlValue) -> Result<(), ValueError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{FromSqlValue, ToSqlValue};

    /// Hand-written implementation, the way a caller without the derive
    /// macro would expose a record.
    #[derive(Debug, Default)]
    struct Account {
        id: i64,
        owner_name: String,
    }

    impl Record for Account {
        fn field_names(&self) -> &'static [&'static str] {
            &["id", "ownerName"]
        }

        fn get_field(&self, name: &str) -> Option<SqlValue> {
            match name {
                "id" => Some(self.id.to_sql_value()),
                "ownerName" => Some(self.owner_name.to_sql_value()),
                _ => None,
            }
        }

        fn set_field(&mut self, name: &str, value: SqlValue) -> Result<(), ValueError> {
            match name {
                "id" => self.id = i64::from_sql_value(value)?,
                "ownerName" => self.owner_name = String::from_sql_value(value)?,
                _ => return Err(ValueError::UnknownField(name.to_string())),
            }
            Ok(())
        }
    }

    #[test]
    fn test_manual_record_get_and_set() {
        let mut account = Account::default();
        account
            .set_field("ownerName", SqlValue::Text(String::from("Bob")))
            .unwrap();
        assert_eq!(account.get_field("ownerName"), Some(SqlValue::Text(String::from("Bob"))));
        assert_eq!(account.get_field("missing"), None);
    }

    #[test]
    fn test_manual_record_rejects_wrong_kind() {
        let mut account = Account::default();
        let err = account
            .set_field("id", SqlValue::Text(String::from("x")))
            .unwrap_err();
        assert!(matches!(err, ValueError::TypeMismatch { expected: "i64", .. }));
        assert_eq!(account.id, 0);
    }

    #[test]
    fn test_manual_record_is_object_safe() {
        let mut account = Account::default();
        let record: &mut dyn Record = &mut account;
        assert_eq!(record.field_names(), &["id", "ownerName"]);
        assert_eq!(
            record.set_field("nope", SqlValue::Int(1)),
            Err(ValueError::UnknownField(String::from("nope")))
        );
    }
}
