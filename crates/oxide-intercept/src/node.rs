//! The parameter and result object graph.
//!
//! A [`Node`] is what an interceptor walks: a scalar, an ordered map, a
//! sequence, or a borrowed [`Record`]. Records are never owned by the graph,
//! so replacements land directly in the caller's structs.

use serde_json::{Map, Number, Value};

use crate::record::Record;
use crate::value::{SqlValue, ToSqlValue};

/// One node of a parameter or result graph.
#[derive(Debug)]
pub enum Node<'a> {
    /// A bare scalar value. Never visited on its own.
    Scalar(SqlValue),
    /// An ordered map of named entries.
    Map(FieldMap<'a>),
    /// A sequence of nodes.
    Seq(Vec<Node<'a>>),
    /// A borrowed structured record.
    Record(&'a mut dyn Record),
}

impl<'a> Node<'a> {
    /// Wraps a record.
    pub fn record<R: Record>(record: &'a mut R) -> Self {
        Self::Record(record)
    }

    /// Wraps a slice of records as a sequence.
    pub fn records<R: Record>(records: &'a mut [R]) -> Self {
        Self::Seq(
            records
                .iter_mut()
                .map(|record| Node::Record(record))
                .collect(),
        )
    }

    /// Builds a map node from `(key, node)` pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Node<'a>)>,
    {
        Self::Map(entries.into_iter().collect())
    }

    /// Wraps a scalar value.
    pub fn scalar(value: impl ToSqlValue) -> Self {
        Self::Scalar(value.to_sql_value())
    }

    /// Converts the graph to JSON.
    ///
    /// Records become objects keyed by their field names; map key order is
    /// preserved.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(value) => scalar_to_json(value),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(key, node)| (key.to_string(), node.to_json()))
                    .collect(),
            ),
            Self::Seq(items) => Value::Array(items.iter().map(Node::to_json).collect()),
            Self::Record(record) => {
                let mut object = Map::new();
                for name in record.field_names() {
                    let value = record.get_field(name).unwrap_or(SqlValue::Null);
                    object.insert((*name).to_string(), scalar_to_json(&value));
                }
                Value::Object(object)
            }
        }
    }
}

fn scalar_to_json(value: &SqlValue) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

fn number_to_value(number: &Number) -> SqlValue {
    number
        .as_i64()
        .map_or_else(|| SqlValue::Float(number.as_f64().unwrap_or(f64::NAN)), SqlValue::Int)
}

impl From<Value> for Node<'_> {
    /// Converts JSON into an owned graph. Integers that fit `i64` become
    /// [`SqlValue::Int`], other numbers [`SqlValue::Float`].
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Scalar(SqlValue::Null),
            Value::Bool(b) => Self::Scalar(SqlValue::Bool(b)),
            Value::Number(n) => Self::Scalar(number_to_value(&n)),
            Value::String(s) => Self::Scalar(SqlValue::Text(s)),
            Value::Array(items) => Self::Seq(items.into_iter().map(Node::from).collect()),
            Value::Object(object) => Self::Map(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Node::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<SqlValue> for Node<'_> {
    fn from(value: SqlValue) -> Self {
        Self::Scalar(value)
    }
}

/// An insertion-ordered map with unique keys.
#[derive(Debug, Default)]
pub struct FieldMap<'a> {
    entries: Vec<(String, Node<'a>)>,
}

impl<'a> FieldMap<'a> {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Inserts an entry. An existing key keeps its position and its old
    /// node is returned.
    pub fn insert(&mut self, key: impl Into<String>, node: Node<'a>) -> Option<Node<'a>> {
        let key = key.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, node)),
            None => {
                self.entries.push((key, node));
                None
            }
        }
    }

    /// Returns the node stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Node<'a>> {
        self.position(key).map(|i| &self.entries[i].1)
    }

    /// Returns the node stored under `key` mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Node<'a>> {
        self.position(key).map(|i| &mut self.entries[i].1)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node<'a>)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// Iterates entries mutably in insertion order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Node<'a>)> {
        self.entries.iter_mut().map(|(key, node)| (key.as_str(), node))
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<'a, K: Into<String>> FromIterator<(K, Node<'a>)> for FieldMap<'a> {
    fn from_iter<I: IntoIterator<Item = (K, Node<'a>)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, node) in iter {
            map.insert(key, node);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_field_map_insert_replaces_in_place() {
        let mut map = FieldMap::new();
        map.insert("b", Node::scalar(1));
        map.insert("a", Node::scalar(2));
        let old = map.insert("b", Node::scalar(3));
        assert!(matches!(old, Some(Node::Scalar(SqlValue::Int(1)))));
        assert_eq!(map.iter().map(|(k, _)| k).collect::<Vec<_>>(), ["b", "a"]);
        assert!(matches!(map.get("b"), Some(Node::Scalar(SqlValue::Int(3)))));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_json_round_trip_keeps_key_order() {
        let value = json!({
            "z": 1,
            "a": [true, null, 1.5],
            "m": {"name": "Alice"}
        });
        let node = Node::from(value.clone());
        assert_eq!(node.to_json(), value);
        assert_eq!(node.to_json().to_string(), value.to_string());
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        let node = Node::from(json!(u64::MAX));
        assert!(matches!(node, Node::Scalar(SqlValue::Float(_))));
    }
}
