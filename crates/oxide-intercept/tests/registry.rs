//! Tests for handler registration and dispatch precedence.

use std::sync::Arc;
use std::thread;

use oxide_intercept::handler::{
    FieldHandler, FnHandler, HandlerRegistry, MaskHandler, WILDCARD_TABLE, table_fields,
};
use oxide_intercept::{InterceptError, SqlValue};

mod common;
use common::*;

#[test]
fn exact_claim_beats_wildcard_regardless_of_order() {
    for exact_first in [true, false] {
        let exact = prefixing("user", &["name"], "exact:");
        let wildcard = prefixing(WILDCARD_TABLE, &["name"], "any:");
        let mut registry = HandlerRegistry::new();
        if exact_first {
            registry.register(exact).unwrap();
            registry.register(wildcard).unwrap();
        } else {
            registry.register(wildcard).unwrap();
            registry.register(exact).unwrap();
        }

        assert_eq!(
            registry.dispatch("user", "name", &text("x")).unwrap(),
            Some(text("exact:x"))
        );
        assert_eq!(
            registry.dispatch("score", "name", &text("x")).unwrap(),
            Some(text("any:x"))
        );
    }
}

#[test]
fn last_registered_wins_for_overlapping_claims() {
    let mut registry = HandlerRegistry::new();
    registry
        .register(prefixing("user", &["name", "phone_number"], "first:"))
        .unwrap();
    registry
        .register(prefixing("user", &["phone_number"], "second:"))
        .unwrap();

    assert_eq!(
        registry.dispatch("user", "name", &text("x")).unwrap(),
        Some(text("first:x"))
    );
    assert_eq!(
        registry.dispatch("user", "phoneNumber", &text("x")).unwrap(),
        Some(text("second:x"))
    );
}

#[test]
fn at_most_one_handler_fires() {
    let mut registry = HandlerRegistry::new();
    registry.register(prefixing("user", &["name"], "a:")).unwrap();
    registry.register(prefixing("user", &["name"], "b:")).unwrap();
    registry
        .register(prefixing(WILDCARD_TABLE, &["name"], "c:"))
        .unwrap();
    assert_eq!(
        registry.dispatch("user", "name", &text("x")).unwrap(),
        Some(text("b:x"))
    );
}

#[test]
fn table_names_are_case_sensitive() {
    let registry = dear_registry("user");
    assert_eq!(registry.dispatch("USER", "name", &text("x")).unwrap(), None);
}

#[test]
fn failing_handler_reports_its_name_and_field() {
    let mut registry = HandlerRegistry::new();
    registry
        .register(
            FnHandler::new(table_fields("user", ["name"]), |_, _, _| {
                Err("key store unavailable".into())
            })
            .named("encrypt"),
        )
        .unwrap();
    let err = registry.dispatch("user", "name", &text("x")).unwrap_err();
    assert!(matches!(err, InterceptError::FieldHandling { .. }));
    assert_eq!(err.to_string(), "handler `encrypt` failed on field `user.name`");
}

#[test]
fn shared_registry_dispatches_from_many_threads() {
    let mut registry = HandlerRegistry::new();
    let mask: Arc<dyn FieldHandler> = Arc::new(MaskHandler::everywhere(["phone"]).keep_last(2));
    registry.register_arc(mask).unwrap();
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry
                    .dispatch("t", "phone", &SqlValue::Text(format!("12345{i}")))
                    .unwrap()
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), Some(SqlValue::Text(format!("****5{i}"))));
    }
}
