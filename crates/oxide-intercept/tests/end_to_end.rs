//! End-to-end interception: parameter and result hooks over records, maps,
//! lists and nested graphs, precedence rules, configuration and fail-closed
//! behavior.

use pretty_assertions::assert_eq;
use serde_json::json;

use oxide_intercept::config::{Properties, UnresolvedTable};
use oxide_intercept::handler::{
    FnHandler, MaskHandler, TemporalCoercion, WILDCARD_TABLE, table_fields,
};
use oxide_intercept::interceptor::SkipReason;
use oxide_intercept::{
    InterceptError, InterceptOutcome, Node, ParameterInterceptor, Record, ResultInterceptor,
    SqlValue, StatementKind,
};

mod common;
use common::*;

const INSERT_USER: &str = "INSERT INTO `user` (id, name, phone_number, age) VALUES (?, ?, ?, ?)";
const SELECT_USER: &str = "SELECT id, name, phone_number, age FROM user WHERE id = ?";

fn greeted(user: &User) -> User {
    User {
        name: format!("Dear {}", user.name),
        phone_number: user.phone_number.as_ref().map(|p| format!("Dear {p}")),
        ..user.clone()
    }
}

#[test]
fn flat_record_parameter() {
    let interceptor = dear_parameters("user");
    let mut user = User::new(1, "Alice", "555");
    let expected = greeted(&user);

    let outcome = interceptor.before_execute_record(INSERT_USER, &mut user).unwrap();
    assert_eq!(
        outcome,
        InterceptOutcome::Intercepted {
            table: String::from("user"),
            replaced: 2,
        }
    );
    assert_eq!(user, expected);
}

#[test]
fn record_inside_a_map_parameter() {
    let interceptor = dear_parameters("user");
    let mut user = User::new(1, "Alice", "555");
    let expected = greeted(&user);

    let mut params = Node::map([("user", Node::record(&mut user))]);
    interceptor.before_execute(INSERT_USER, &mut params).unwrap();
    drop(params);
    assert_eq!(user, expected);
}

#[test]
fn list_of_records_inside_a_map_parameter() {
    let interceptor = dear_parameters("user");
    let mut users = vec![User::new(1, "Alice", "555"), User::new(2, "Bob", "666")];
    let expected: Vec<User> = users.iter().map(greeted).collect();

    let mut params = Node::map([("users", Node::records(&mut users))]);
    let outcome = interceptor.before_execute(INSERT_USER, &mut params).unwrap();
    drop(params);
    assert_eq!(outcome.replaced(), 4);
    assert_eq!(users, expected);
}

#[test]
fn snake_case_map_keys_match_declared_columns() {
    let interceptor = dear_parameters("user");
    let mut params = Node::from(json!({"id": 1, "name": "Alice", "phone_number": "555"}));
    interceptor
        .before_execute("UPDATE user SET name = ?, phone_number = ? WHERE id = ?", &mut params)
        .unwrap();
    assert_eq!(
        params.to_json(),
        json!({"id": 1, "name": "Dear Alice", "phone_number": "Dear 555"})
    );
}

#[test]
fn result_rows_are_rewritten() {
    let interceptor = dear_results("user");
    let mut rows = vec![User::new(1, "Alice", "555")];
    let expected: Vec<User> = rows.iter().map(greeted).collect();
    interceptor.after_execute_records(SELECT_USER, &mut rows).unwrap();
    assert_eq!(rows, expected);
}

#[test]
fn joined_result_rows_use_the_driving_table() {
    let interceptor = dear_results("user");
    let mut rows = Node::from(json!([
        {"name": "Alice", "score": 3},
        {"name": "Bob", "score": 5}
    ]));
    interceptor
        .after_execute(
            "select u.name, s.score from `user` u join score s on s.user_id = u.id",
            &mut rows,
        )
        .unwrap();
    assert_eq!(
        rows.to_json(),
        json!([
            {"name": "Dear Alice", "score": 3},
            {"name": "Dear Bob", "score": 5}
        ])
    );
}

#[test]
fn other_tables_are_left_alone() {
    let interceptor = dear_parameters("user");
    let mut user = User::new(1, "Alice", "555");
    let before = user.clone();
    let outcome = interceptor
        .before_execute_record("INSERT INTO account (name) VALUES (?)", &mut user)
        .unwrap();
    assert_eq!(
        outcome,
        InterceptOutcome::Intercepted {
            table: String::from("account"),
            replaced: 0,
        }
    );
    assert_eq!(user, before);
}

#[test]
fn wildcard_mask_applies_to_every_table_unless_overridden() {
    let mut interceptor = ResultInterceptor::new();
    interceptor
        .register_result_set_field_handler(MaskHandler::everywhere(["phone_number"]))
        .unwrap();
    interceptor
        .register_result_set_field_handler(prefixing("admin", &["phone_number"], "internal:"))
        .unwrap();

    let mut contact = Node::from(json!({"phone_number": "5551234567"}));
    interceptor
        .after_execute("SELECT phone_number FROM contact", &mut contact)
        .unwrap();
    assert_eq!(contact.to_json(), json!({"phone_number": "******4567"}));

    let mut admin = Node::from(json!({"phone_number": "5551234567"}));
    interceptor
        .after_execute("SELECT phone_number FROM admin", &mut admin)
        .unwrap();
    assert_eq!(admin.to_json(), json!({"phone_number": "internal:5551234567"}));
}

#[test]
fn select_parameters_are_not_rewritten_by_default() {
    let interceptor = dear_parameters("user");
    let mut params = Node::from(json!({"name": "Alice"}));
    let outcome = interceptor.before_execute(SELECT_USER, &mut params).unwrap();
    assert_eq!(
        outcome,
        InterceptOutcome::Skipped(SkipReason::StatementKind(StatementKind::Select))
    );
    assert_eq!(params.to_json(), json!({"name": "Alice"}));
}

#[test]
fn parameter_statement_kinds_are_configurable() {
    let interceptor = dear_parameters("user")
        .with_properties(&Properties::new().set("parameter.statements", "select"))
        .unwrap();
    let mut params = Node::from(json!({"name": "Alice"}));
    interceptor.before_execute(SELECT_USER, &mut params).unwrap();
    assert_eq!(params.to_json(), json!({"name": "Dear Alice"}));

    let mut params = Node::from(json!({"name": "Alice"}));
    interceptor.before_execute(INSERT_USER, &mut params).unwrap();
    assert_eq!(params.to_json(), json!({"name": "Alice"}));
}

#[test]
fn disabled_interceptor_does_nothing() {
    let interceptor = dear_results("user")
        .with_properties(&Properties::new().set("enabled", "false"))
        .unwrap();
    let mut rows = Node::from(json!([{"name": "Alice"}]));
    assert_eq!(
        interceptor.after_execute(SELECT_USER, &mut rows).unwrap(),
        InterceptOutcome::Skipped(SkipReason::Disabled)
    );
    assert_eq!(rows.to_json(), json!([{"name": "Alice"}]));
}

#[test]
fn empty_interceptor_skips_without_resolving() {
    let interceptor = ParameterInterceptor::new();
    let mut params = Node::from(json!({"name": "Alice"}));
    assert_eq!(
        interceptor.before_execute("not sql at all", &mut params).unwrap(),
        InterceptOutcome::Skipped(SkipReason::NoHandlers)
    );
}

#[test]
fn unresolved_table_fails_or_skips() {
    let mut params = Node::from(json!({"name": "Alice"}));

    let failing = dear_results("user");
    assert!(matches!(
        failing.after_execute("SELECT 1", &mut params),
        Err(InterceptError::TableResolution { .. })
    ));

    let skipping = dear_results("user")
        .with_properties(&Properties::new().set("on_unresolved_table", "skip"))
        .unwrap();
    assert_eq!(skipping.config().on_unresolved_table, UnresolvedTable::Skip);
    assert_eq!(
        skipping.after_execute("SELECT 1", &mut params).unwrap(),
        InterceptOutcome::Skipped(SkipReason::UnresolvedTable)
    );
    assert_eq!(params.to_json(), json!({"name": "Alice"}));
}

#[test]
fn handler_failure_leaves_the_graph_untouched() {
    let mut interceptor = ParameterInterceptor::new();
    interceptor
        .register_parameter_field_handler(prefixing("user", &["name"], "Dear "))
        .unwrap();
    interceptor
        .register_parameter_field_handler(
            FnHandler::new(table_fields("user", ["phone_number"]), |_, _, _| {
                Err("no key".into())
            })
            .named("encrypt"),
        )
        .unwrap();

    let mut users = vec![User::new(1, "Alice", "555"), User::new(2, "Bob", "666")];
    let before = users.clone();
    let mut params = Node::map([("users", Node::records(&mut users))]);
    let err = interceptor.before_execute(INSERT_USER, &mut params).unwrap_err();
    drop(params);

    match err {
        InterceptError::FieldHandling { handler, field, .. } => {
            assert_eq!(handler, "encrypt");
            assert_eq!(field, "phoneNumber");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(users, before);
}

#[test]
fn rejected_replacement_rolls_back_earlier_fields() {
    let mut interceptor = ParameterInterceptor::new();
    interceptor
        .register_parameter_field_handler(prefixing("user", &["name", "age"], "Dear "))
        .unwrap();

    let mut user = User::new(1, "Alice", "555");
    let before = user.clone();
    let err = interceptor
        .before_execute_record(INSERT_USER, &mut user)
        .unwrap_err();
    assert!(matches!(err, InterceptError::FieldAssignment(_)));
    assert_eq!(user, before);
}

#[derive(Debug, Record)]
struct Event {
    id: i64,
    happened_on: chrono::NaiveDate,
}

#[test]
fn temporal_coercion_of_result_columns() {
    let mut interceptor = ResultInterceptor::new();
    interceptor
        .register_result_set_field_handler(TemporalCoercion::dates(table_fields(
            WILDCARD_TABLE,
            ["happened_on"],
        )))
        .unwrap();

    let day = chrono::NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    let mut rows = Node::from(json!([{"id": 1, "happened_on": "2024-02-29 13:45:00"}]));
    interceptor
        .after_execute("SELECT id, happened_on FROM event", &mut rows)
        .unwrap();
    assert_eq!(rows.to_json(), json!([{"id": 1, "happened_on": "2024-02-29"}]));

    let mut event = Event { id: 1, happened_on: day };
    interceptor
        .after_execute("SELECT id, happened_on FROM event", &mut Node::record(&mut event))
        .unwrap();
    assert_eq!(event.happened_on, day);
    assert_eq!(event.id, 1);
    assert_eq!(event.get_field("happenedOn"), Some(SqlValue::Date(day)));
}
