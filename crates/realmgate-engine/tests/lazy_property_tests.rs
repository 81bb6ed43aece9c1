//! Lazy data property tests

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{counter, Fixture};
use realmgate_core::RealmOptions;
use realmgate_engine::{
    create_lazy_data_property, define_lazy_property, GateError, LazyDataPropertyOptions, LazyFlags,
};
use realmgate_sdk::{HostRuntime, HostValue, PropertyAttributes, PropertyKey, RealmId};

// ============================================================================
// create_lazy_data_property
// ============================================================================

#[test]
fn test_getter_runs_once_in_its_own_realm() {
    let fx = Fixture::new();
    let calls = counter();
    let seen = Rc::new(RefCell::new(Vec::<(RealmId, HostValue, Vec<HostValue>)>::new()));
    let (hits, record) = (Rc::clone(&calls), Rc::clone(&seen));
    let getter = fx.function(fx.inner, "getter", move |host, info| {
        hits.set(hits.get() + 1);
        record
            .borrow_mut()
            .push((host.current_realm(), info.this.clone(), info.args.clone()));
        Ok(HostValue::from(42))
    });
    let receiver = fx.object(fx.outer);
    let options =
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("answer"), fx.platform, getter);

    let returned = create_lazy_data_property(&fx.heap, options).unwrap();
    assert_eq!(returned, receiver);
    assert_eq!(calls.get(), 0);
    assert!(fx.heap.is_lazy_pending(receiver, &PropertyKey::named("answer")));

    assert_eq!(fx.get(receiver, "answer"), HostValue::from(42));
    assert_eq!(fx.get(receiver, "answer"), HostValue::from(42));
    assert_eq!(calls.get(), 1);
    assert!(!fx.heap.is_lazy_pending(receiver, &PropertyKey::named("answer")));

    let seen = seen.borrow();
    let (realm, this, args) = &seen[0];
    assert_eq!(*realm, fx.inner);
    assert_eq!(*this, HostValue::Object(receiver));
    assert_eq!(
        *args,
        vec![HostValue::Object(receiver), HostValue::from("answer"), fx.platform_value()]
    );
}

#[test]
fn test_getter_receives_installed_receiver_when_read_through_child() {
    let fx = Fixture::new();
    let seen = Rc::new(RefCell::new(None));
    let record = Rc::clone(&seen);
    let getter = fx.function(fx.inner, "getter", move |_, info| {
        *record.borrow_mut() = Some((info.this.clone(), info.args.clone()));
        Ok(HostValue::from("shared"))
    });
    let receiver = fx.object(fx.outer);
    let child = fx.heap.new_object(fx.outer, Some(receiver)).unwrap();
    create_lazy_data_property(
        &fx.heap,
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("value"), fx.platform, getter),
    )
    .unwrap();

    assert_eq!(fx.get(child, "value"), HostValue::from("shared"));
    let (this, args) = seen.borrow().clone().unwrap();
    assert_eq!(this, HostValue::Object(child));
    assert_eq!(
        args,
        vec![HostValue::Object(receiver), HostValue::from("value"), fx.platform_value()]
    );
}

#[test]
fn test_symbol_name_reaches_getter_as_symbol() {
    let fx = Fixture::new();
    let name = Rc::new(RefCell::new(HostValue::Undefined));
    let record = Rc::clone(&name);
    let getter = fx.function(fx.inner, "getter", move |_, info| {
        *record.borrow_mut() = info.arg(1);
        Ok(HostValue::from(1))
    });
    let receiver = fx.object(fx.outer);
    let key = PropertyKey::Symbol(4);
    create_lazy_data_property(
        &fx.heap,
        LazyDataPropertyOptions::new(receiver, key.clone(), fx.platform, getter),
    )
    .unwrap();

    assert_eq!(fx.heap.get(receiver, &key).unwrap(), HostValue::from(1));
    assert_eq!(*name.borrow(), HostValue::Symbol(4));
    assert_ne!(*name.borrow(), HostValue::from("Symbol(4)"));
}

#[test]
fn test_defaults_are_restrictive() {
    let fx = Fixture::new();
    let receiver = fx.object(fx.outer);
    let getter = fx.constant(HostValue::from(1));
    let options =
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("locked"), fx.platform, getter);
    create_lazy_data_property(&fx.heap, options).unwrap();

    let key = PropertyKey::named("locked");
    assert_eq!(
        fx.heap.property_attributes(receiver, &key).unwrap(),
        Some(PropertyAttributes::FROZEN)
    );
    assert!(!fx.heap.delete(receiver, &key).unwrap());
    assert!(fx.heap.own_keys(receiver, true).is_empty());
}

#[test]
fn test_opted_in_flags_are_honored() {
    let fx = Fixture::new();
    let receiver = fx.object(fx.outer);
    let getter = fx.constant(HostValue::from(1));
    let options =
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("open"), fx.platform, getter)
            .configurable(true)
            .enumerable(true)
            .writable(true);
    create_lazy_data_property(&fx.heap, options).unwrap();

    let key = PropertyKey::named("open");
    assert_eq!(
        fx.heap.property_attributes(receiver, &key).unwrap(),
        Some(PropertyAttributes::NONE)
    );
    assert!(fx.heap.set(receiver, &key, HostValue::from(2)).unwrap());
    assert_eq!(fx.get(receiver, "open"), HostValue::from(2));
    assert!(fx.heap.delete(receiver, &key).unwrap());
}

#[test]
fn test_read_only_write_is_silent_in_sloppy_realm() {
    let fx = Fixture::new();
    let receiver = fx.object(fx.outer);
    let getter = fx.constant(HostValue::from("fixed"));
    let options =
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("value"), fx.platform, getter);
    create_lazy_data_property(&fx.heap, options).unwrap();

    let key = PropertyKey::named("value");
    assert!(!fx.heap.set(receiver, &key, HostValue::from("changed")).unwrap());
    assert_eq!(fx.get(receiver, "value"), HostValue::from("fixed"));
}

#[test]
fn test_read_only_write_throws_in_strict_realm() {
    let fx = Fixture::with_realms(RealmOptions::named("outer").strict(), RealmOptions::named("inner"));
    let receiver = fx.object(fx.outer);
    let getter = fx.constant(HostValue::from("fixed"));
    let options =
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("value"), fx.platform, getter);
    create_lazy_data_property(&fx.heap, options).unwrap();

    let key = PropertyKey::named("value");
    let err = fx.heap.set(receiver, &key, HostValue::from("changed")).unwrap_err();
    assert_eq!(fx.error_name(&err), "TypeError");
    assert_eq!(fx.get(receiver, "value"), HostValue::from("fixed"));
}

#[test]
fn test_getter_exception_leaves_property_pending() {
    let fx = Fixture::new();
    let receiver = fx.object(fx.outer);
    let getter = fx.thrower(HostValue::from("not yet"));
    let options =
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("late"), fx.platform, getter);
    create_lazy_data_property(&fx.heap, options).unwrap();

    let key = PropertyKey::named("late");
    assert!(fx.heap.get(receiver, &key).is_err());
    assert!(fx.heap.is_lazy_pending(receiver, &key));
}

#[test]
fn test_non_callable_getter_is_rejected() {
    let fx = Fixture::new();
    let receiver = fx.object(fx.outer);
    let not_callable = fx.object(fx.inner);
    let options =
        LazyDataPropertyOptions::new(receiver, PropertyKey::named("x"), fx.platform, not_callable);
    assert!(matches!(
        create_lazy_data_property(&fx.heap, options),
        Err(GateError::InvalidArgumentType { .. })
    ));
}

// ============================================================================
// define_lazy_property
// ============================================================================

#[test]
fn test_define_lazy_property_getter_contract() {
    let fx = Fixture::with_realms(RealmOptions::named("outer").strict(), RealmOptions::named("inner"));
    let seen = Rc::new(RefCell::new(None));
    let record = Rc::clone(&seen);
    let getter = fx.function(fx.inner, "getter", move |host, info| {
        *record.borrow_mut() = Some((host.current_realm(), info.this.clone(), info.args.clone()));
        Ok(HostValue::from("loaded"))
    });
    let receiver = fx.object(fx.outer);
    define_lazy_property(
        &fx.heap,
        fx.platform,
        receiver,
        PropertyKey::named("module"),
        LazyFlags::DONT_ENUM | LazyFlags::READ_ONLY,
        getter,
    )
    .unwrap();

    assert_eq!(fx.get(receiver, "module"), HostValue::from("loaded"));
    let (realm, this, args) = seen.borrow().clone().unwrap();
    assert_eq!(realm, fx.inner);
    assert_eq!(this, HostValue::Undefined);
    assert_eq!(
        args,
        vec![
            fx.platform_value(),
            HostValue::Object(receiver),
            HostValue::from("module"),
            HostValue::Bool(true),
        ]
    );
}

#[test]
fn test_define_lazy_property_flags() {
    let fx = Fixture::new();
    let receiver = fx.object(fx.outer);
    let getter = fx.constant(HostValue::Null);
    define_lazy_property(
        &fx.heap,
        fx.platform,
        receiver,
        PropertyKey::named("hidden"),
        LazyFlags::from_bits(LazyFlags::DONT_DELETE.bits() | LazyFlags::DONT_ENUM.bits()),
        getter,
    )
    .unwrap();

    let key = PropertyKey::named("hidden");
    assert_eq!(
        fx.heap.property_attributes(receiver, &key).unwrap(),
        Some(PropertyAttributes::DONT_DELETE | PropertyAttributes::DONT_ENUM)
    );
    assert!(fx.heap.set(receiver, &key, HostValue::from(1)).unwrap());
    assert_eq!(fx.get(receiver, "hidden"), HostValue::from(1));
}

#[test]
fn test_should_throw_is_false_from_sloppy_realm() {
    let fx = Fixture::new();
    let flag = Rc::new(RefCell::new(HostValue::Undefined));
    let record = Rc::clone(&flag);
    let getter = fx.function(fx.inner, "getter", move |_, info| {
        *record.borrow_mut() = info.arg(3);
        Ok(HostValue::Null)
    });
    let receiver = fx.object(fx.outer);
    define_lazy_property(&fx.heap, fx.platform, receiver, PropertyKey::named("p"), LazyFlags::NONE, getter)
        .unwrap();

    fx.get(receiver, "p");
    assert_eq!(*flag.borrow(), HostValue::Bool(false));
}
