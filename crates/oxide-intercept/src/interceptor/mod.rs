//! Statement interceptors.
//!
//! Both interceptors drive the same per-statement state machine,
//! [`Interception`]:
//!
//! ```text
//! Idle ──resolve──▶ TableResolved ──plan──▶ Walked ──apply──▶ Dispatched ──▶ Done
//!   └──────────────────────┴───────────────────┴──────────────────┴──▶ Failed
//! ```
//!
//! `plan` walks the graph once without changing it and asks the registry
//! for every replacement. `apply` walks it a second time and writes the
//! replacements back. If a record rejects a replacement, everything already
//! written is restored, so a failed statement leaves the graph as it was.

mod parameter;
mod result;

use std::cell::OnceCell;
use std::fmt;

use tracing::{debug, error, trace, warn};

use crate::config::{InterceptorConfig, UnresolvedTable};
use crate::error::{InterceptError, Result};
use crate::handler::HandlerRegistry;
use crate::node::Node;
use crate::resolver::{ResolvedStatement, StatementKind, resolve_statement};
use crate::value::SqlValue;
use crate::walker::walk;

pub use parameter::ParameterInterceptor;
pub use result::ResultInterceptor;

/// Where an [`Interception`] stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterceptPhase {
    /// Nothing done yet.
    Idle,
    /// The statement's target table is known.
    TableResolved,
    /// The graph was walked and every replacement computed.
    Walked,
    /// Replacements were written into the graph.
    Dispatched,
    /// Interception finished.
    Done,
    /// Interception failed; the graph is unchanged.
    Failed,
}

impl fmt::Display for InterceptPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::TableResolved => "table-resolved",
            Self::Walked => "walked",
            Self::Dispatched => "dispatched",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A statement's SQL text and, once needed, its resolved target.
#[derive(Debug)]
pub struct StatementContext<'s> {
    sql: &'s str,
    resolved: OnceCell<ResolvedStatement>,
}

impl<'s> StatementContext<'s> {
    /// Creates a context for `sql`.
    #[must_use]
    pub const fn new(sql: &'s str) -> Self {
        Self {
            sql,
            resolved: OnceCell::new(),
        }
    }

    /// The SQL text.
    #[must_use]
    pub const fn sql(&self) -> &'s str {
        self.sql
    }

    /// Resolves the statement on first call and returns the cached result
    /// afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::TableResolution`] when the target table
    /// cannot be determined.
    pub fn resolved(&self) -> Result<&ResolvedStatement> {
        if let Some(resolved) = self.resolved.get() {
            return Ok(resolved);
        }
        let resolved = resolve_statement(self.sql)?;
        Ok(self.resolved.get_or_init(|| resolved))
    }
}

/// Interception of one statement's graph.
///
/// The usual entry points are [`ParameterInterceptor`] and
/// [`ResultInterceptor`]; this type exposes the individual steps.
///
/// ```rust
/// use oxide_intercept::handler::{FnHandler, HandlerRegistry, table_fields};
/// use oxide_intercept::interceptor::{InterceptPhase, Interception};
/// use oxide_intercept::{Node, SqlValue};
/// use serde_json::json;
///
/// let mut registry = HandlerRegistry::new();
/// registry
///     .register(FnHandler::new(table_fields("user", ["name"]), |_, _, v| {
///         Ok(SqlValue::Text(format!("Dear {v}")))
///     }))
///     .unwrap();
///
/// let mut params = Node::from(json!({"name": "Alice", "age": 30}));
/// let mut interception = Interception::new(&registry, "INSERT INTO user (name, age) VALUES (?, ?)");
/// interception.resolve().unwrap();
/// assert_eq!(interception.plan(&mut params).unwrap(), 1);
/// assert_eq!(params.to_json(), json!({"name": "Alice", "age": 30}));
/// interception.apply(&mut params).unwrap();
/// assert_eq!(interception.phase(), InterceptPhase::Done);
/// assert_eq!(params.to_json(), json!({"name": "Dear Alice", "age": 30}));
/// ```
#[derive(Debug)]
pub struct Interception<'r, 's> {
    registry: &'r HandlerRegistry,
    context: StatementContext<'s>,
    phase: InterceptPhase,
    plan: Vec<PlannedField>,
}

/// One visited field and its replacement, if any.
#[derive(Debug)]
struct PlannedField {
    field: String,
    replacement: Option<SqlValue>,
}

impl<'r, 's> Interception<'r, 's> {
    /// Starts an interception of `sql`.
    #[must_use]
    pub const fn new(registry: &'r HandlerRegistry, sql: &'s str) -> Self {
        Self {
            registry,
            context: StatementContext::new(sql),
            phase: InterceptPhase::Idle,
            plan: Vec::new(),
        }
    }

    /// The current phase.
    #[must_use]
    pub const fn phase(&self) -> InterceptPhase {
        self.phase
    }

    /// The statement being intercepted.
    #[must_use]
    pub const fn context(&self) -> &StatementContext<'s> {
        &self.context
    }

    /// Resolves the statement's target table.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::TableResolution`] when the target table
    /// cannot be determined.
    pub fn resolve(&mut self) -> Result<ResolvedStatement> {
        self.expect(InterceptPhase::Idle)?;
        match self.context.resolved() {
            Ok(resolved) => {
                let resolved = resolved.clone();
                self.advance(InterceptPhase::TableResolved);
                Ok(resolved)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Walks the graph without changing it and computes every replacement.
    /// Returns the number of fields that will be replaced.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::FieldHandling`] when a handler fails.
    pub fn plan(&mut self, node: &mut Node<'_>) -> Result<usize> {
        self.expect(InterceptPhase::TableResolved)?;
        let table = match self.context.resolved() {
            Ok(resolved) => resolved.table.clone(),
            Err(err) => return Err(self.fail(err)),
        };

        let registry = self.registry;
        let mut plan = Vec::new();
        let walked = walk(node, |field, value| {
            let replacement = registry.dispatch(&table, field, value)?;
            plan.push(PlannedField {
                field: field.to_string(),
                replacement,
            });
            Ok::<_, InterceptError>(None)
        });
        if let Err(err) = walked {
            return Err(self.fail(err));
        }

        let replacements = plan.iter().filter(|p| p.replacement.is_some()).count();
        debug!(
            table = %table,
            visited = plan.len(),
            replacements,
            "planned field replacements"
        );
        self.plan = plan;
        self.advance(InterceptPhase::Walked);
        Ok(replacements)
    }

    /// Writes the planned replacements into the graph.
    ///
    /// `node` must be the graph passed to [`plan`](Self::plan), unchanged.
    /// Every visited field is checked against the plan before it is written.
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::FieldAssignment`] when a record rejects a
    /// replacement, and [`InterceptError::IllegalArgument`] when `node` does
    /// not visit the planned fields in the planned order. Replacements
    /// already written are rolled back first.
    pub fn apply(&mut self, node: &mut Node<'_>) -> Result<usize> {
        self.expect(InterceptPhase::Walked)?;

        let plan = std::mem::take(&mut self.plan);
        let mut originals: Vec<Option<SqlValue>> = vec![None; plan.len()];
        let mut position = 0;
        let mut applied = walk(node, |field, value| {
            let planned = plan
                .get(position)
                .filter(|planned| planned.field == field)
                .ok_or_else(|| {
                    InterceptError::IllegalArgument(format!(
                        "field `{field}` at position {position} was not planned"
                    ))
                })?;
            if planned.replacement.is_some() {
                originals[position] = Some(value.clone());
            }
            position += 1;
            Ok::<_, InterceptError>(planned.replacement.clone())
        });
        if applied.is_ok() && position != plan.len() {
            applied = Err(InterceptError::IllegalArgument(format!(
                "graph has {position} fields, plan has {}",
                plan.len()
            )));
        }

        if let Err(err) = applied {
            let mut position = 0;
            let restored = walk(node, |_, _| {
                let original = originals.get_mut(position).and_then(Option::take);
                position += 1;
                Ok::<_, InterceptError>(original)
            });
            if let Err(rollback) = restored {
                error!(sql = self.context.sql, error = %rollback, "rollback of field replacements failed");
            }
            return Err(self.fail(err));
        }

        self.advance(InterceptPhase::Dispatched);
        self.advance(InterceptPhase::Done);
        Ok(plan.iter().filter(|p| p.replacement.is_some()).count())
    }

    /// Resolves, plans and applies in one go.
    ///
    /// # Errors
    ///
    /// See [`resolve`](Self::resolve), [`plan`](Self::plan) and
    /// [`apply`](Self::apply).
    pub fn run(mut self, node: &mut Node<'_>) -> Result<usize> {
        self.resolve()?;
        self.plan(node)?;
        self.apply(node)
    }

    fn advance(&mut self, next: InterceptPhase) {
        trace!(from = %self.phase, to = %next, "interception phase");
        self.phase = next;
    }

    fn fail(&mut self, err: InterceptError) -> InterceptError {
        self.advance(InterceptPhase::Failed);
        err
    }

    fn expect(&self, phase: InterceptPhase) -> Result<()> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(InterceptError::IllegalArgument(format!(
                "interception step expects phase `{phase}`, found `{}`",
                self.phase
            )))
        }
    }
}

/// Why a statement was not intercepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Interception is disabled in the configuration.
    Disabled,
    /// No handler is registered.
    NoHandlers,
    /// The interceptor does not rewrite this kind of statement.
    StatementKind(StatementKind),
    /// The target table could not be resolved and the configuration says
    /// to carry on.
    UnresolvedTable,
}

/// What an interceptor hook did with a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterceptOutcome {
    /// The graph was intercepted.
    Intercepted {
        /// The resolved target table.
        table: String,
        /// Number of field values replaced.
        replaced: usize,
    },
    /// The graph was left untouched.
    Skipped(SkipReason),
}

impl InterceptOutcome {
    /// Number of field values replaced.
    #[must_use]
    pub const fn replaced(&self) -> usize {
        match self {
            Self::Intercepted { replaced, .. } => *replaced,
            Self::Skipped(_) => 0,
        }
    }
}

/// Which side of statement execution a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Parameters,
    Results,
}

impl Side {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Parameters => "parameters",
            Self::Results => "results",
        }
    }

    fn intercepts(self, config: &InterceptorConfig, kind: StatementKind) -> bool {
        match self {
            Self::Parameters => config.intercepts_parameters_of(kind),
            Self::Results => true,
        }
    }
}

fn intercept(
    registry: &HandlerRegistry,
    config: &InterceptorConfig,
    side: Side,
    sql: &str,
    node: &mut Node<'_>,
) -> Result<InterceptOutcome> {
    if !config.enabled {
        return Ok(InterceptOutcome::Skipped(SkipReason::Disabled));
    }
    if registry.is_empty() {
        return Ok(InterceptOutcome::Skipped(SkipReason::NoHandlers));
    }

    let mut interception = Interception::new(registry, sql);
    let resolved = match interception.resolve() {
        Ok(resolved) => resolved,
        Err(err @ InterceptError::TableResolution { .. })
            if config.on_unresolved_table == UnresolvedTable::Skip =>
        {
            warn!(side = side.as_str(), error = %err, "skipping interception");
            return Ok(InterceptOutcome::Skipped(SkipReason::UnresolvedTable));
        }
        Err(err) => return Err(err),
    };

    if !side.intercepts(config, resolved.kind) {
        debug!(side = side.as_str(), kind = %resolved.kind, "statement kind not intercepted");
        return Ok(InterceptOutcome::Skipped(SkipReason::StatementKind(
            resolved.kind,
        )));
    }

    interception.plan(node)?;
    let replaced = interception.apply(node)?;
    debug!(side = side.as_str(), table = %resolved.table, replaced, "intercepted statement");
    Ok(InterceptOutcome::Intercepted {
        table: resolved.table,
        replaced,
    })
}
