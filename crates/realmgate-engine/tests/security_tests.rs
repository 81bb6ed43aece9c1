//! Security token administration tests

mod common;

use common::Fixture;
use realmgate_engine::{get_security_token, set_security_token, use_default_security_token, GateError};
use realmgate_sdk::{HostRuntime, HostValue, PropertyKey};

#[test]
fn test_set_returns_previous_and_get_observes_new() {
    let fx = Fixture::new();
    let inner_global = HostValue::Object(fx.heap.realm_global(fx.inner));
    let default = get_security_token(&fx.heap, &inner_global).unwrap();
    assert_eq!(default, inner_global);

    let token = HostValue::from("shared");
    let previous = set_security_token(&fx.heap, &inner_global, token.clone()).unwrap();
    assert_eq!(previous, default);
    assert_eq!(get_security_token(&fx.heap, &inner_global).unwrap(), token);
}

#[test]
fn test_token_follows_creation_realm_of_any_object() {
    let fx = Fixture::new();
    let inner_object = HostValue::Object(fx.object(fx.inner));
    set_security_token(&fx.heap, &inner_object, HostValue::from(7)).unwrap();

    let inner_global = HostValue::Object(fx.heap.realm_global(fx.inner));
    assert_eq!(get_security_token(&fx.heap, &inner_global).unwrap(), HostValue::from(7));
    let outer_global = HostValue::Object(fx.heap.realm_global(fx.outer));
    assert_eq!(get_security_token(&fx.heap, &outer_global).unwrap(), outer_global);
}

#[test]
fn test_default_reset_is_idempotent() {
    let fx = Fixture::new();
    let inner_global = HostValue::Object(fx.heap.realm_global(fx.inner));
    set_security_token(&fx.heap, &inner_global, HostValue::from("temporary")).unwrap();

    let previous = use_default_security_token(&fx.heap, &inner_global).unwrap();
    assert_eq!(previous, HostValue::from("temporary"));
    let first = get_security_token(&fx.heap, &inner_global).unwrap();

    let previous = use_default_security_token(&fx.heap, &inner_global).unwrap();
    assert_eq!(previous, first);
    assert_eq!(get_security_token(&fx.heap, &inner_global).unwrap(), first);
}

#[test]
fn test_primitive_is_rejected() {
    let fx = Fixture::new();
    for value in [HostValue::Undefined, HostValue::from(1), HostValue::from("x")] {
        let err = get_security_token(&fx.heap, &value).unwrap_err();
        assert!(matches!(err, GateError::InvalidArgumentType { .. }));
        assert!(set_security_token(&fx.heap, &value, HostValue::Null).is_err());
        assert!(use_default_security_token(&fx.heap, &value).is_err());
    }
}

#[test]
fn test_shared_token_opens_cross_realm_access() {
    let fx = Fixture::new();
    let inner_global = fx.heap.realm_global(fx.inner);
    let outer_global = HostValue::Object(fx.heap.realm_global(fx.outer));
    let key = PropertyKey::named("marker");

    let err = fx.heap.get(inner_global, &key).unwrap_err();
    assert_eq!(fx.message(&err), "no access");

    let token = HostValue::Object(fx.object(fx.outer));
    set_security_token(&fx.heap, &outer_global, token.clone()).unwrap();
    set_security_token(&fx.heap, &HostValue::Object(inner_global), token).unwrap();
    assert_eq!(fx.heap.get(inner_global, &key).unwrap(), HostValue::Undefined);

    use_default_security_token(&fx.heap, &outer_global).unwrap();
    assert!(fx.heap.get(inner_global, &key).is_err());
}
