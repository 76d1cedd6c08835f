//! Interceptor configuration.
//!
//! Interceptors accept a flat [`Properties`] bag of string keys and values,
//! typically loaded from the environment. Recognized keys:
//!
//! | key | values | default |
//! |---|---|---|
//! | `enabled` | `true`, `false` | `true` |
//! | `parameter.statements` | comma list of `insert`, `update`, `delete`, `select` | `insert,update` |
//! | `on_unresolved_table` | `fail`, `skip` | `fail` |
//!
//! Other keys are ignored.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{InterceptError, Result};
use crate::resolver::StatementKind;

/// Prefix of environment variables read by [`Properties::from_env`].
pub const ENV_PREFIX: &str = "OXIDE_INTERCEPT_";

const ENABLED: &str = "enabled";
const PARAMETER_STATEMENTS: &str = "parameter.statements";
const ON_UNRESOLVED_TABLE: &str = "on_unresolved_table";
const RECOGNIZED: [&str; 3] = [ENABLED, PARAMETER_STATEMENTS, ON_UNRESOLVED_TABLE];

/// A string key/value property bag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    /// Creates an empty property bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Sets a property.
    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns a property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Reads properties from the process environment.
    ///
    /// See [`from_vars`](Self::from_vars).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(std::env::vars())
    }

    /// Reads properties from `OXIDE_INTERCEPT_*` variables.
    ///
    /// The prefix is stripped and the rest lowercased; a name matching a
    /// recognized key with dots written as underscores maps to that key, so
    /// `OXIDE_INTERCEPT_PARAMETER_STATEMENTS` sets `parameter.statements`.
    pub fn from_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        vars.into_iter()
            .filter_map(|(name, value)| {
                let key = name.strip_prefix(ENV_PREFIX)?.to_lowercase();
                let key = RECOGNIZED
                    .iter()
                    .find(|known| known.replace('.', "_") == key)
                    .map_or(key, |known| (*known).to_string());
                Some((key, value))
            })
            .collect()
    }

    /// Iterates properties in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut properties = Self::new();
        for (key, value) in iter {
            properties.insert(key, value);
        }
        properties
    }
}

/// What to do when a statement's target table cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedTable {
    /// Return the resolution error.
    #[default]
    Fail,
    /// Log a warning and leave the graph untouched.
    Skip,
}

/// Typed interceptor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterceptorConfig {
    /// Whether interception runs at all.
    pub enabled: bool,
    /// Statement kinds whose parameters are rewritten.
    pub parameter_statements: BTreeSet<StatementKind>,
    /// Behavior on unresolvable statements.
    pub on_unresolved_table: UnresolvedTable,
}

impl Default for InterceptorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            parameter_statements: BTreeSet::from([StatementKind::Insert, StatementKind::Update]),
            on_unresolved_table: UnresolvedTable::Fail,
        }
    }
}

impl InterceptorConfig {
    /// Builds settings from properties, starting from the defaults.
    ///
    /// ```rust
    /// use oxide_intercept::config::{InterceptorConfig, Properties, UnresolvedTable};
    ///
    /// let properties = Properties::new().set("on_unresolved_table", "skip");
    /// let config = InterceptorConfig::from_properties(&properties).unwrap();
    /// assert!(config.enabled);
    /// assert_eq!(config.on_unresolved_table, UnresolvedTable::Skip);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`InterceptError::IllegalArgument`] when a recognized key has
    /// a malformed value.
    pub fn from_properties(properties: &Properties) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in properties.iter() {
            match key {
                ENABLED => config.enabled = parse_bool(key, value)?,
                PARAMETER_STATEMENTS => {
                    config.parameter_statements = parse_statement_kinds(key, value)?;
                }
                ON_UNRESOLVED_TABLE => {
                    config.on_unresolved_table = match value.trim().to_lowercase().as_str() {
                        "fail" => UnresolvedTable::Fail,
                        "skip" => UnresolvedTable::Skip,
                        _ => return Err(invalid(key, value, "fail or skip")),
                    };
                }
                _ => debug!(key, "ignoring unrecognized property"),
            }
        }
        Ok(config)
    }

    /// Returns `true` if parameters of `kind` statements are rewritten.
    #[must_use]
    pub fn intercepts_parameters_of(&self, kind: StatementKind) -> bool {
        self.parameter_statements.contains(&kind)
    }
}

fn invalid(key: &str, value: &str, expected: &str) -> InterceptError {
    InterceptError::IllegalArgument(format!(
        "invalid value `{value}` for property `{key}`, expected {expected}"
    ))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(key, value, "true or false")),
    }
}

fn parse_statement_kinds(key: &str, value: &str) -> Result<BTreeSet<StatementKind>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.to_lowercase().as_str() {
            "select" => Ok(StatementKind::Select),
            "insert" => Ok(StatementKind::Insert),
            "update" => Ok(StatementKind::Update),
            "delete" => Ok(StatementKind::Delete),
            _ => Err(invalid(key, value, "a list of insert, update, delete, select")),
        })
        .collect()
}
