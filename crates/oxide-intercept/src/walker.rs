//! Depth-first traversal of parameter and result graphs.

use crate::error::AssignError;
use crate::node::Node;
use crate::value::SqlValue;

/// Visits every named, non-`NULL` scalar field reachable from `node`.
///
/// The visitor receives the field name and its current value. Returning
/// `Ok(Some(value))` replaces the field; `Ok(None)` leaves it as is.
///
/// - Record fields are visited in [`field_names`](crate::Record::field_names)
///   order and replaced through [`set_field`](crate::Record::set_field).
/// - Map entries are visited in insertion order. Scalar entries are visited
///   under their key; container entries are descended into.
/// - Sequence elements are descended into in order. Bare scalars (the
///   root, or sequence elements) have no name and are never visited.
///
/// Traversal order depends only on the shape of the graph, so two walks
/// over an unchanged graph visit the same fields in the same order.
///
/// ```rust
/// use oxide_intercept::{Node, SqlValue, walk};
/// use oxide_intercept::error::InterceptError;
/// use serde_json::json;
///
/// let mut node = Node::from(json!({"name": "Alice", "tags": [{"label": "x"}]}));
/// let mut seen = Vec::new();
/// walk(&mut node, |field, _| {
///     seen.push(field.to_string());
///     Ok::<_, InterceptError>(None)
/// })
/// .unwrap();
/// assert_eq!(seen, ["name", "label"]);
/// ```
///
/// # Errors
///
/// Stops at the first error returned by the visitor, or at the first
/// replacement a record refuses. Replacements made before the error stay in
/// place.
pub fn walk<E, F>(node: &mut Node<'_>, mut visitor: F) -> Result<(), E>
where
    F: FnMut(&str, &SqlValue) -> Result<Option<SqlValue>, E>,
    E: From<AssignError>,
{
    walk_node(node, &mut visitor)
}

fn walk_node<E, F>(node: &mut Node<'_>, visitor: &mut F) -> Result<(), E>
where
    F: FnMut(&str, &SqlValue) -> Result<Option<SqlValue>, E>,
    E: From<AssignError>,
{
    match node {
        Node::Scalar(_) => {}
        Node::Record(record) => {
            for &name in record.field_names() {
                let Some(value) = record.get_field(name) else {
                    continue;
                };
                if value.is_null() {
                    continue;
                }
                if let Some(replacement) = visitor(name, &value)? {
                    record
                        .set_field(name, replacement)
                        .map_err(|source| AssignError {
                            field: name.to_string(),
                            source,
                        })?;
                }
            }
        }
        Node::Map(map) => {
            for (key, child) in map.iter_mut() {
                match child {
                    Node::Scalar(value) => {
                        if value.is_null() {
                            continue;
                        }
                        if let Some(replacement) = visitor(key, value)? {
                            *value = replacement;
                        }
                    }
                    container => walk_node(container, visitor)?,
                }
            }
        }
        Node::Seq(items) => {
            for item in items {
                walk_node(item, visitor)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InterceptError;
    use crate::record::Record;
    use crate::value::{FromSqlValue, ToSqlValue, ValueError};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[derive(Debug, Default)]
    struct Person {
        name: String,
        age: i64,
        nickname: Option<String>,
    }

    impl Record for Person {
        fn field_names(&self) -> &'static [&'static str] {
            &["name", "age", "nickname"]
        }

        fn get_field(&self, name: &str) -> Option<SqlValue> {
            match name {
                "name" => Some(self.name.to_sql_value()),
                "age" => Some(self.age.to_sql_value()),
                "nickname" => Some(self.nickname.to_sql_value()),
                _ => None,
            }
        }

        fn set_field(&mut self, name: &str, value: SqlValue) -> Result<(), ValueError> {
            match name {
                "name" => self.name = String::from_sql_value(value)?,
                "age" => self.age = i64::from_sql_value(value)?,
                "nickname" => self.nickname = Option::from_sql_value(value)?,
                _ => return Err(ValueError::UnknownField(name.to_string())),
            }
            Ok(())
        }
    }

    fn visited(node: &mut Node<'_>) -> Vec<String> {
        let mut seen = Vec::new();
        walk(node, |field, value| {
            seen.push(format!("{field}={value}"));
            Ok::<_, InterceptError>(None)
        })
        .unwrap();
        seen
    }

    #[test]
    fn test_record_fields_in_declared_order_skipping_null() {
        let mut person = Person {
            name: String::from("Ann"),
            age: 30,
            nickname: None,
        };
        assert_eq!(visited(&mut Node::record(&mut person)), ["name=Ann", "age=30"]);
    }

    #[test]
    fn test_nested_map_and_seq_order() {
        let mut node = Node::from(json!({
            "a": 1,
            "b": {"c": 2, "d": null},
            "e": [{"f": 3}, 4, [{"g": 5}]],
            "h": 6
        }));
        assert_eq!(visited(&mut node), ["a=1", "c=2", "f=3", "g=5", "h=6"]);
    }

    #[test]
    fn test_bare_scalars_are_not_visited() {
        assert!(visited(&mut Node::scalar("x")).is_empty());
        assert!(visited(&mut Node::from(json!([1, "two"]))).is_empty());
    }

    #[test]
    fn test_replacements_land_in_records_and_maps() {
        let mut person = Person {
            name: String::from("Ann"),
            ..Person::default()
        };
        let mut node = Node::map([
            ("person", Node::record(&mut person)),
            ("note", Node::scalar("hi")),
        ]);
        walk(&mut node, |field, value| {
            Ok::<_, InterceptError>(match (field, value) {
                ("name" | "note", SqlValue::Text(s)) => Some(SqlValue::Text(s.to_uppercase())),
                _ => None,
            })
        })
        .unwrap();
        assert_eq!(
            node.to_json(),
            json!({"person": {"name": "ANN", "age": 0, "nickname": null}, "note": "HI"})
        );
        drop(node);
        assert_eq!(person.name, "ANN");
    }

    #[test]
    fn test_rejected_assignment_stops_the_walk() {
        let mut person = Person {
            name: String::from("Ann"),
            age: 3,
            nickname: None,
        };
        let err = walk(&mut Node::record(&mut person), |_, _| {
            Ok::<_, InterceptError>(Some(SqlValue::Text(String::from("x"))))
        })
        .unwrap_err();
        assert!(matches!(
            err,
            InterceptError::FieldAssignment(AssignError { ref field, .. }) if field == "age"
        ));
        assert_eq!(person.name, "x");
        assert_eq!(person.age, 3);
    }

    #[test]
    fn test_visitor_error_propagates() {
        let mut node = Node::from(json!({"a": 1, "b": 2}));
        let mut calls = 0;
        let err = walk(&mut node, |_, _| {
            calls += 1;
            Err(InterceptError::IllegalArgument(String::from("stop")))
        })
        .unwrap_err();
        assert!(matches!(err, InterceptError::IllegalArgument(_)));
        assert_eq!(calls, 1);
    }
}
