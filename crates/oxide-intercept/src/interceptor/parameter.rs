//! Parameter-side interception.

use std::sync::Arc;

use super::{InterceptOutcome, Side, intercept};
use crate::config::{InterceptorConfig, Properties};
use crate::error::Result;
use crate::handler::{FieldHandler, HandlerRegistry};
use crate::node::Node;
use crate::record::Record;

/// Rewrites statement parameters before execution.
///
/// By default only `INSERT` and `UPDATE` parameters are rewritten; see
/// [`InterceptorConfig::parameter_statements`].
///
/// ```rust
/// use oxide_intercept::handler::{FnHandler, table_fields};
/// use oxide_intercept::{ParameterInterceptor, Record, SqlValue};
///
/// #[derive(Debug, Record)]
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// let mut interceptor = ParameterInterceptor::new();
/// interceptor
///     .register_parameter_field_handler(FnHandler::new(table_fields("user", ["name"]), |_, _, v| {
///         Ok(SqlValue::Text(format!("Dear {v}")))
///     }))
///     .unwrap();
///
/// let mut user = User { id: 1, name: String::from("Alice") };
/// interceptor
///     .before_execute_record("INSERT INTO user (id, name) VALUES (?, ?)", &mut user)
///     .unwrap();
/// assert_eq!(user.name, "Dear Alice");
/// ```
#[derive(Debug, Default)]
pub struct ParameterInterceptor {
    registry: HandlerRegistry,
    config: InterceptorConfig,
}

impl ParameterInterceptor {
    /// Creates an interceptor with no handlers and default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an interceptor around a pre-built registry.
    #[must_use]
    pub fn with_registry(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            config: InterceptorConfig::default(),
        }
    }

    /// Replaces the settings.
    #[must_use]
    pub fn with_config(mut self, config: InterceptorConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the settings with ones read from `properties`.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::IllegalArgument`](crate::InterceptError::IllegalArgument)
    /// when a recognized property is malformed.
    pub fn with_properties(self, properties: &Properties) -> Result<Self> {
        Ok(self.with_config(InterceptorConfig::from_properties(properties)?))
    }

    /// Registers a parameter field handler.
    ///
    /// # Errors
    ///
    /// See [`HandlerRegistry::register`].
    pub fn register_parameter_field_handler<H: FieldHandler + 'static>(
        &mut self,
        handler: H,
    ) -> Result<()> {
        self.registry.register(handler)
    }

    /// Registers a shared parameter field handler.
    ///
    /// # Errors
    ///
    /// See [`HandlerRegistry::register`].
    pub fn register_shared_parameter_field_handler(
        &mut self,
        handler: Arc<dyn FieldHandler>,
    ) -> Result<()> {
        self.registry.register_arc(handler)
    }

    /// The handler registry.
    #[must_use]
    pub const fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// The current settings.
    #[must_use]
    pub const fn config(&self) -> &InterceptorConfig {
        &self.config
    }

    /// Rewrites the parameters of `sql` in place.
    ///
    /// # Errors
    ///
    /// Returns the resolution, handler or assignment error that stopped
    /// interception. `parameters` is unchanged in that case.
    pub fn before_execute(&self, sql: &str, parameters: &mut Node<'_>) -> Result<InterceptOutcome> {
        intercept(&self.registry, &self.config, Side::Parameters, sql, parameters)
    }

    /// Rewrites a single record passed as the statement's parameter.
    ///
    /// # Errors
    ///
    /// See [`before_execute`](Self::before_execute).
    pub fn before_execute_record<R: Record>(
        &self,
        sql: &str,
        record: &mut R,
    ) -> Result<InterceptOutcome> {
        self.before_execute(sql, &mut Node::record(record))
    }
}
