#![allow(dead_code)]

use oxide_intercept::handler::{FnHandler, HandlerRegistry, table_fields};
use oxide_intercept::{ParameterInterceptor, Record, ResultInterceptor, SqlValue};

#[derive(Debug, Clone, PartialEq, Eq, Record)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub phone_number: Option<String>,
    pub age: i32,
}

impl User {
    pub fn new(id: i64, name: &str, phone_number: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            phone_number: Some(phone_number.to_string()),
            age: 30,
        }
    }
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

/// A handler that prefixes every value of `columns` in `table` with `prefix`.
pub fn prefixing(table: &str, columns: &[&str], prefix: &'static str) -> FnHandler {
    FnHandler::new(table_fields(table, columns.iter().copied()), move |_, _, value| {
        Ok(SqlValue::Text(format!("{prefix}{value}")))
    })
    .named(prefix)
}

pub fn dear_registry(table: &str) -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register(prefixing(table, &["name", "phone_number"], "Dear "))
        .unwrap_or_else(|e| panic!("Failed to register handler: {e}"));
    registry
}

pub fn dear_parameters(table: &str) -> ParameterInterceptor {
    ParameterInterceptor::with_registry(dear_registry(table))
}

pub fn dear_results(table: &str) -> ResultInterceptor {
    ResultInterceptor::with_registry(dear_registry(table))
}
