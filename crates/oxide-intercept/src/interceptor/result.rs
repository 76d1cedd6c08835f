//! Result-side interception.

use std::sync::Arc;

use super::{InterceptOutcome, Side, intercept};
use crate::config::{InterceptorConfig, Properties};
use crate::error::Result;
use crate::handler::{FieldHandler, HandlerRegistry};
use crate::node::Node;
use crate::record::Record;

/// Rewrites statement results after execution.
///
/// Results of every statement kind are rewritten, so `SELECT` rows and
/// `RETURNING` rows alike.
#[derive(Debug, Default)]
pub struct ResultInterceptor {
    registry: HandlerRegistry,
    config: InterceptorConfig,
}

impl ResultInterceptor {
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

    /// Registers a result set field handler.
    ///
    /// # Errors
    ///
    /// See [`HandlerRegistry::register`].
    pub fn register_result_set_field_handler<H: FieldHandler + 'static>(
        &mut self,
        handler: H,
    ) -> Result<()> {
        self.registry.register(handler)
    }

    /// Registers a shared result set field handler.
    ///
    /// # Errors
    ///
    /// See [`HandlerRegistry::register`].
    pub fn register_shared_result_set_field_handler(
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

    /// Rewrites the results of `sql` in place.
    ///
    /// # Errors
    ///
    /// Returns the resolution, handler or assignment error that stopped
    /// interception. `results` is unchanged in that case.
    pub fn after_execute(&self, sql: &str, results: &mut Node<'_>) -> Result<InterceptOutcome> {
        intercept(&self.registry, &self.config, Side::Results, sql, results)
    }

    /// Rewrites a list of records returned by `sql`.
    ///
    /// ```rust
    /// use oxide_intercept::handler::MaskHandler;
    /// use oxide_intercept::{Record, ResultInterceptor};
    ///
    /// #[derive(Debug, Record)]
    /// struct Contact {
    ///     id: i64,
    ///     phone_number: String,
    /// }
    ///
    /// let mut interceptor = ResultInterceptor::new();
    /// interceptor
    ///     .register_result_set_field_handler(MaskHandler::everywhere(["phone_number"]))
    ///     .unwrap();
    ///
    /// let mut rows = vec![Contact { id: 1, phone_number: String::from("5551234567") }];
    /// interceptor
    ///     .after_execute_records("SELECT id, phone_number FROM contact", &mut rows)
    ///     .unwrap();
    /// assert_eq!(rows[0].phone_number, "******4567");
    /// ```
    ///
    /// # Errors
    ///
    /// See [`after_execute`](Self::after_execute).
    pub fn after_execute_records<R: Record>(
        &self,
        sql: &str,
        records: &mut [R],
    ) -> Result<InterceptOutcome> {
        self.after_execute(sql, &mut Node::records(records))
    }
}
