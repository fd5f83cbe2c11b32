//! Call-time enforcement: decorated free functions and record methods
//! check every bound argument before the wrapped body runs, and
//! interface-only types share behavior without sharing field slots.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

use invar_core::{ContractError, ErrorKind, TypeTag, Value};
use invar_runtime::{CheckedFn, Param, RecordTypeBuilder, Registries, Signature};
use pretty_assertions::assert_eq;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

#[test]
fn test_decorated_function_blocks_side_effects() {
    init_tracing();
    let registries = Registries::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();

    let greet = CheckedFn::wrap(
        "greet",
        Signature::new(vec![Param::new("name", TypeTag::Str)]),
        &registries,
        move |args| {
            seen.fetch_add(1, Ordering::SeqCst);
            let name = args[0].as_str().unwrap_or_default();
            Ok(Value::Str(format!("hello {name}")))
        },
    );

    let err = greet.call(&[Value::Int(42)]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Violation);
    assert_eq!(calls.load(Ordering::SeqCst), 0, "body must not run on a raising call");

    let out = greet.call(&[Value::Str("x".into())]).unwrap();
    assert_eq!(out, Value::Str("hello x".into()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_decorated_function_resolves_registered_validators() {
    init_tracing();
    let registries = Registries::new();
    registries
        .contracts()
        .define(invar_core::ValidatorSpec::matches("Email", r"^[^@]+@[^@]+$").unwrap())
        .unwrap();

    let invite = CheckedFn::wrap(
        "invite",
        Signature::new(vec![
            Param::new("email", "Email"),
            Param::new("seats", "NaturalNum").with_default(1i64),
        ]),
        &registries,
        |args| Ok(Value::Tuple(args.to_vec())),
    );

    let out = invite
        .call(&[Value::Str("a@b.example".into())])
        .unwrap();
    assert_eq!(
        out,
        Value::Tuple(vec![Value::Str("a@b.example".into()), Value::Int(1)])
    );

    let err = invite.call(&[Value::Str("not-an-email".into())]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Violation);

    let err = invite
        .call_with(
            &[Value::Str("a@b.example".into())],
            &[("seats".to_string(), Value::Int(0))],
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "parameter 'seats': value 0 must be > 0");
}

#[test]
fn test_record_methods_are_wrapped() {
    init_tracing();
    let registries = Registries::new();
    let rtype = RecordTypeBuilder::contract("Counter")
        .field("count", "NaturalNum")
        .method(
            "grow",
            Signature::new(vec![Param::new("by", "NaturalNum")]),
            |receiver, args| {
                let current = receiver.get("count").and_then(Value::as_int).unwrap_or(0);
                let by = args[0].as_int().unwrap_or(0);
                receiver.set("count", Value::Int(current + by))?;
                Ok(Value::Null)
            },
        )
        .finalize(&registries)
        .unwrap();

    let mut counter = rtype.construct(&[Value::Int(1)]).unwrap();
    counter.call_method("grow", &[Value::Int(4)]).unwrap();
    assert_eq!(counter.get("count"), Some(&Value::Int(5)));

    // Argument checking happens before the body touches the receiver.
    let err = counter.call_method("grow", &[Value::Int(0)]).unwrap_err();
    assert_eq!(err.to_string(), "parameter 'by': value 0 must be > 0");
    assert_eq!(counter.get("count"), Some(&Value::Int(5)));

    let err = counter
        .call_method("grow", &[Value::Str("2".into())])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Violation);

    let err = counter.call_method("shrink", &[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Binding);
}

#[test]
fn test_interface_only_siblings_share_no_fields() {
    init_tracing();
    let registries = Registries::new();

    // A base declaring only behavior.
    let base = RecordTypeBuilder::contract("Named")
        .method(
            "describe",
            Signature::new(vec![]),
            |receiver, _| {
                let name = receiver
                    .get("name")
                    .cloned()
                    .unwrap_or(Value::Str("anonymous".into()));
                Ok(name)
            },
        )
        .finalize(&registries)
        .unwrap();
    assert!(base.interface_only());

    let person = RecordTypeBuilder::contract("Person")
        .derive_from("Named")
        .field("name", TypeTag::Str)
        .field("age", "NaturalNum")
        .finalize(&registries)
        .unwrap();
    let city = RecordTypeBuilder::contract("City")
        .derive_from("Named")
        .field("name", TypeTag::Str)
        .field("population", "NaturalNum")
        .finalize(&registries)
        .unwrap();

    // Each sibling gets its own independent field set.
    let mut alice = person
        .construct(&[Value::Str("alice".into()), Value::Int(30)])
        .unwrap();
    let mut oslo = city
        .construct(&[Value::Str("oslo".into()), Value::Int(700_000)])
        .unwrap();
    assert!(alice.get("population").is_none());
    assert!(oslo.get("age").is_none());
    assert_eq!(
        alice.set("population", Value::Int(1)).unwrap_err().kind(),
        ErrorKind::Binding
    );
    assert_eq!(
        oslo.set("age", Value::Int(1)).unwrap_err().kind(),
        ErrorKind::Binding
    );

    // Both reuse the interface's behavior, checked.
    assert_eq!(
        alice.call_method("describe", &[]).unwrap(),
        Value::Str("alice".into())
    );
    assert_eq!(
        oslo.call_method("describe", &[]).unwrap(),
        Value::Str("oslo".into())
    );
}

#[test]
fn test_custom_predicate_parameters() {
    init_tracing();
    let registries = Registries::new();
    registries
        .contracts()
        .define(invar_core::ValidatorSpec::predicate("NonEmpty", |value| {
            if value.is_truthy() {
                Ok(())
            } else {
                Err(ContractError::PredicateFailed {
                    name: "NonEmpty".to_string(),
                    value: value.to_string(),
                })
            }
        }))
        .unwrap();

    let rtype = RecordTypeBuilder::contract("Note")
        .field("text", "NonEmpty")
        .finalize(&registries)
        .unwrap();

    assert!(rtype.construct(&[Value::Str("hi".into())]).is_ok());
    let err = rtype.construct(&[Value::Str(String::new())]).unwrap_err();
    assert_eq!(err.to_string(), "field 'text': check 'NonEmpty' rejected value \"\"");
}

#[test]
fn test_checked_function_stored_in_function_field() {
    init_tracing();
    let registries = Registries::new();
    let rtype = RecordTypeBuilder::contract("Handler")
        .field("callback", "Function")
        .finalize(&registries)
        .unwrap();

    let double = CheckedFn::wrap(
        "double",
        Signature::new(vec![Param::new("n", TypeTag::Int)]),
        &registries,
        |args| Ok(Value::Int(args[0].as_int().unwrap_or(0) * 2)),
    );

    let handler = rtype.construct(&[double.as_value()]).unwrap();
    let Some(Value::Fn(callback)) = handler.get("callback") else {
        panic!("callback field should hold a callable");
    };
    assert_eq!(callback.invoke(&[Value::Int(21)]).unwrap(), Value::Int(42));

    // The stored callable still enforces its own contract.
    assert!(callback.invoke(&[Value::Str("21".into())]).is_err());
}
