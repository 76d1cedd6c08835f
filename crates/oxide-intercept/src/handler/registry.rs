//! Handler registry and dispatch.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::{FieldHandler, ScopeMap, WILDCARD_TABLE};
use crate::error::{BoxError, InterceptError, NullReplacement, Result};
use crate::naming::underscore_to_camel_case;
use crate::value::SqlValue;

/// Which handler fires for a field, and under what column name.
#[derive(Debug, Clone)]
struct Claim {
    handler: usize,
    column: String,
}

/// An ordered collection of field handlers.
///
/// Each handler's declared columns are indexed both as written and in
/// camelCase, so a `phone_number` column matches a `phone_number` map key
/// as well as a `phoneNumber` record field. When two handlers claim the same
/// (table, field) pair the one registered last wins; an exact-table claim
/// always beats a [`WILDCARD_TABLE`] claim.
///
/// Registration takes `&mut self`; once built, the registry is read-only and
/// can be shared across threads.
///
/// # Example
///
/// ```rust
/// use oxide_intercept::handler::{FnHandler, HandlerRegistry, table_fields};
/// use oxide_intercept::SqlValue;
///
/// let mut registry = HandlerRegistry::new();
/// registry
///     .register(FnHandler::new(table_fields("user", ["phone_number"]), |_, _, v| {
///         Ok(SqlValue::Text(format!("+1 {v}")))
///     }))
///     .unwrap();
///
/// let out = registry
///     .dispatch("user", "phoneNumber", &SqlValue::Text("555".into()))
///     .unwrap();
/// assert_eq!(out, Some(SqlValue::Text("+1 555".into())));
/// ```
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Arc<dyn FieldHandler>>,
    scope: ScopeMap,
    claims: HashMap<String, HashMap<String, Claim>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::IllegalArgument`] when the handler declares
    /// an empty table or column name. Nothing is registered in that case.
    pub fn register<H: FieldHandler + 'static>(&mut self, handler: H) -> Result<()> {
        self.register_arc(Arc::new(handler))
    }

    /// Registers a shared handler.
    ///
    /// # Errors
    ///
    /// See [`register`](Self::register).
    pub fn register_arc(&mut self, handler: Arc<dyn FieldHandler>) -> Result<()> {
        let declared = handler.target_table_fields();

        // Validate everything before touching the indexes.
        let mut entries = Vec::new();
        for (table, columns) in &declared {
            if table.is_empty() {
                return Err(InterceptError::IllegalArgument(format!(
                    "handler `{}` declares an empty table name",
                    handler.name()
                )));
            }
            for column in columns {
                let camel = underscore_to_camel_case(column)?;
                if camel.is_empty() {
                    return Err(InterceptError::IllegalArgument(format!(
                        "handler `{}` declares column `{column}` with no name",
                        handler.name()
                    )));
                }
                entries.push((table.as_str(), column.as_str(), camel));
            }
        }

        let index = self.handlers.len();
        for (table, column, camel) in entries {
            let fields = self.claims.entry(table.to_string()).or_default();
            for key in [column.to_string(), camel] {
                fields.insert(
                    key,
                    Claim {
                        handler: index,
                        column: column.to_string(),
                    },
                );
            }

            let scoped = self.scope.entry(table.to_string()).or_default();
            if !scoped.iter().any(|c| c == column) {
                scoped.push(column.to_string());
            }
        }

        debug!(
            handler = handler.name(),
            tables = ?declared.keys().collect::<Vec<_>>(),
            "registered field handler"
        );
        self.handlers.push(handler);
        Ok(())
    }

    /// Runs the handler claiming (`table`, `field`), if any.
    ///
    /// Returns `Ok(None)` when no handler claims the field.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::FieldHandling`] when the handler fails or
    /// returns `NULL`.
    pub fn dispatch(&self, table: &str, field: &str, value: &SqlValue) -> Result<Option<SqlValue>> {
        let Some(claim) = self.claim_for(table, field) else {
            return Ok(None);
        };
        let handler = &self.handlers[claim.handler];
        trace!(handler = handler.name(), table, field, column = %claim.column, "dispatching field");

        let failed = |source: BoxError| InterceptError::FieldHandling {
            handler: handler.name().to_string(),
            table: table.to_string(),
            field: field.to_string(),
            source,
        };

        let replacement = handler
            .handle(table, &claim.column, value.clone())
            .map_err(failed)?;
        if replacement.is_null() {
            return Err(failed(Box::new(NullReplacement)));
        }
        Ok(Some(replacement))
    }

    /// Returns `true` if some handler claims (`table`, `field`).
    #[must_use]
    pub fn claims(&self, table: &str, field: &str) -> bool {
        self.claim_for(table, field).is_some()
    }

    fn claim_for(&self, table: &str, field: &str) -> Option<&Claim> {
        self.claims
            .get(table)
            .and_then(|fields| fields.get(field))
            .or_else(|| {
                self.claims
                    .get(WILDCARD_TABLE)
                    .and_then(|fields| fields.get(field))
            })
    }

    /// The aggregated scope of every registered handler.
    #[must_use]
    pub const fn scope(&self) -> &ScopeMap {
        &self.scope
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no handler is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field(
                "handlers",
                &self.handlers.iter().map(|h| h.name()).collect::<Vec<_>>(),
            )
            .field("scope", &self.scope)
            .finish()
    }
}
