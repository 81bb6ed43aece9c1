//! Script-facing bindings tests
//!
//! Everything here goes through the exported functions with `Heap::call`, the
//! way script would reach the boundary.

mod common;

use common::{counter, Fixture};
use realmgate_engine::{bindings, GateConfig};
use realmgate_sdk::{HostRuntime, HostValue, ObjectHandle, PropertyAttributes, PropertyKey};

const ENTRY_POINTS: [&str; 11] = [
    "createNativeFunction",
    "createLazyDataProperty",
    "getSecurityToken",
    "setSecurityToken",
    "useDefaultSecurityToken",
    "nativeFunction",
    "nativeFunctionStrict",
    "nativeFunctionPermissive",
    "defineLazyProperty",
    "getCreationContextGlobal",
    "getCreationRealmGlobal",
];

fn installed(fx: &Fixture, config: &GateConfig) -> ObjectHandle {
    let exports = fx.object(fx.outer);
    bindings::install(&fx.heap, fx.outer, exports, config).unwrap();
    exports
}

fn export(fx: &Fixture, exports: ObjectHandle, name: &str) -> ObjectHandle {
    fx.get(exports, name).as_object().unwrap()
}

// ============================================================================
// Installation
// ============================================================================

#[test]
fn test_install_exports_frozen_functions() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());

    for name in ENTRY_POINTS {
        let function = export(&fx, exports, name);
        assert!(fx.heap.is_callable(&HostValue::Object(function)), "{}", name);
        assert_eq!(fx.heap.creation_realm(function), fx.outer);
        assert_eq!(fx.get(function, "name"), HostValue::from(name));
        assert_eq!(
            fx.heap
                .property_attributes(exports, &PropertyKey::named(name))
                .unwrap(),
            Some(PropertyAttributes::FROZEN)
        );
        assert!(fx.heap.construct(function, &[], None).is_err());
    }
}

#[test]
fn test_install_without_freezing() {
    let fx = Fixture::new();
    let mut config = GateConfig::default();
    config.bindings.freeze_exports = false;
    let exports = installed(&fx, &config);

    assert_eq!(
        fx.heap
            .property_attributes(exports, &PropertyKey::named("nativeFunction"))
            .unwrap(),
        Some(PropertyAttributes::NONE)
    );
}

#[test]
fn test_missing_arguments_raise_type_error() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());

    let err = fx.call(export(&fx, exports, "setSecurityToken"), &[HostValue::Null]).unwrap_err();
    assert_eq!(fx.error_name(&err), "TypeError");
    assert_eq!(
        fx.message(&err),
        "setSecurityToken: expected at least 2 argument(s), got 1"
    );
}

// ============================================================================
// Entry points
// ============================================================================

#[test]
fn test_create_native_function_from_options_object() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let implementation = fx.constant(HostValue::from(5));
    let double = fx.function(fx.inner, "double", |_, info| {
        Ok(HostValue::Number(info.arg(0).as_number().unwrap_or(0.0) * 2.0))
    });
    let finally_calls = counter();

    let options = fx.object(fx.outer);
    fx.put(options, "platform", fx.platform_value());
    fx.put(options, "implementation", HostValue::Object(implementation));
    fx.put(options, "after", fx.array(fx.outer, &[HostValue::Object(double)]));
    fx.put(options, "finally", HostValue::Object(fx.counting_hook(&finally_calls)));
    fx.put(options, "name", HostValue::from("doubled"));
    fx.put(options, "length", HostValue::from(1));

    let created = fx
        .call(export(&fx, exports, "createNativeFunction"), &[HostValue::Object(options)])
        .unwrap()
        .as_object()
        .unwrap();
    assert_eq!(fx.get(created, "name"), HostValue::from("doubled"));
    assert_eq!(fx.heap.creation_realm(created), fx.inner);
    assert_eq!(fx.call(created, &[]).unwrap(), HostValue::from(10));
    assert_eq!(finally_calls.get(), 1);
    assert!(fx.heap.construct(created, &[], None).is_err());
}

#[test]
fn test_create_native_function_rejects_bad_hooks() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let options = fx.object(fx.outer);
    fx.put(options, "platform", fx.platform_value());
    fx.put(options, "implementation", HostValue::Object(fx.constant(HostValue::Null)));
    fx.put(options, "before", HostValue::from(5));

    let entry = export(&fx, exports, "createNativeFunction");
    let err = fx.call(entry, &[HostValue::Object(options)]).unwrap_err();
    assert_eq!(fx.message(&err), "`options.before` is not a function");

    // An object without a numeric `length` is not a hook list.
    fx.put(options, "before", HostValue::Object(fx.object(fx.outer)));
    let err = fx.call(entry, &[HostValue::Object(options)]).unwrap_err();
    assert_eq!(fx.message(&err), "`options.before` is not a function");

    fx.put(options, "before", fx.array(fx.outer, &[HostValue::from("nope")]));
    let err = fx.call(entry, &[HostValue::Object(options)]).unwrap_err();
    assert_eq!(fx.message(&err), "`options.before[0]` is not a function");

    fx.put(options, "before", HostValue::Undefined);
    fx.put(options, "context", HostValue::from(1));
    let err = fx.call(entry, &[HostValue::Object(options)]).unwrap_err();
    assert_eq!(fx.message(&err), "`options.context` must be an object, if present");
}

#[test]
fn test_create_lazy_data_property_from_options_object() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let receiver = fx.object(fx.outer);
    let options = fx.object(fx.outer);
    fx.put(options, "receiver", HostValue::Object(receiver));
    fx.put(options, "name", HostValue::from("lazy"));
    fx.put(options, "platform", fx.platform_value());
    fx.put(options, "getter", HostValue::Object(fx.constant(HostValue::from("ready"))));
    fx.put(options, "enumerable", HostValue::Bool(true));

    let returned = fx
        .call(export(&fx, exports, "createLazyDataProperty"), &[HostValue::Object(options)])
        .unwrap();
    assert_eq!(returned, HostValue::Object(receiver));
    assert_eq!(
        fx.heap
            .property_attributes(receiver, &PropertyKey::named("lazy"))
            .unwrap(),
        Some(PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_DELETE)
    );
    assert_eq!(fx.get(receiver, "lazy"), HostValue::from("ready"));
}

#[test]
fn test_security_token_entry_points() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let inner_global = HostValue::Object(fx.heap.realm_global(fx.inner));
    let get = export(&fx, exports, "getSecurityToken");
    let set = export(&fx, exports, "setSecurityToken");
    let reset = export(&fx, exports, "useDefaultSecurityToken");

    let previous = fx.call(set, &[inner_global.clone(), HostValue::from("t")]).unwrap();
    assert_eq!(previous, inner_global);
    assert_eq!(fx.call(get, &[inner_global.clone()]).unwrap(), HostValue::from("t"));
    assert_eq!(fx.call(reset, &[inner_global.clone()]).unwrap(), HostValue::from("t"));
    assert_eq!(fx.call(get, &[inner_global.clone()]).unwrap(), inner_global);

    let err = fx.call(get, &[HostValue::from(1)]).unwrap_err();
    assert_eq!(fx.error_name(&err), "TypeError");
}

#[test]
fn test_native_function_entry_points() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let implementation = fx.function(fx.inner, "impl", |_, info| Ok(info.arg(0)));
    let bare_platform = HostValue::Object(fx.object(fx.outer));
    let args = |platform: HostValue| {
        [
            platform,
            HostValue::Object(implementation),
            HostValue::from("tag"),
            HostValue::Bool(false),
            HostValue::from(2),
        ]
    };

    let created = fx
        .call(export(&fx, exports, "nativeFunction"), &args(fx.platform_value()))
        .unwrap()
        .as_object()
        .unwrap();
    assert_eq!(fx.get(created, "name"), HostValue::from("tag"));
    assert_eq!(fx.get(created, "length"), HostValue::from(2));
    assert_eq!(fx.call(created, &[]).unwrap(), fx.platform_value());

    assert!(fx
        .call(export(&fx, exports, "nativeFunctionStrict"), &args(bare_platform.clone()))
        .is_err());
    let permissive = fx
        .call(export(&fx, exports, "nativeFunctionPermissive"), &args(bare_platform))
        .unwrap()
        .as_object()
        .unwrap();
    assert_eq!(fx.heap.creation_realm(permissive), fx.outer);
}

#[test]
fn test_define_lazy_property_entry_point() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let receiver = fx.object(fx.outer);
    let getter = fx.function(fx.inner, "getter", |_, info| Ok(info.arg(2)));
    let args = [
        fx.platform_value(),
        HostValue::Object(receiver),
        HostValue::from("key"),
        HostValue::from(4),
        HostValue::Object(getter),
    ];

    let result = fx.call(export(&fx, exports, "defineLazyProperty"), &args).unwrap();
    assert_eq!(result, HostValue::Undefined);
    assert_eq!(
        fx.heap
            .property_attributes(receiver, &PropertyKey::named("key"))
            .unwrap(),
        Some(PropertyAttributes::READ_ONLY)
    );
    assert_eq!(fx.get(receiver, "key"), HostValue::from("key"));
}

#[test]
fn test_creation_context_global() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let inner_object = HostValue::Object(fx.object(fx.inner));
    let inner_global = HostValue::Object(fx.heap.realm_global(fx.inner));

    for name in ["getCreationContextGlobal", "getCreationRealmGlobal"] {
        let entry = export(&fx, exports, name);
        assert_eq!(fx.call(entry, &[inner_object.clone()]).unwrap(), inner_global);
        assert_eq!(fx.call(entry, &[HostValue::from("text")]).unwrap(), HostValue::Null);
    }
}

#[test]
fn test_creation_context_global_without_arguments() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    for name in ["getCreationContextGlobal", "getCreationRealmGlobal"] {
        let entry = export(&fx, exports, name);
        assert_eq!(fx.get(entry, "length"), HostValue::from(1));
        assert_eq!(fx.call(entry, &[]).unwrap(), HostValue::Null);
    }
}

#[test]
fn test_define_lazy_property_flags_wrap_modulo_2_32() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let entry = export(&fx, exports, "defineLazyProperty");
    let getter = HostValue::Object(fx.constant(HostValue::Null));
    let cases = [
        (HostValue::from(-1), PropertyAttributes::FROZEN),
        (HostValue::from(4294967297.0), PropertyAttributes::DONT_DELETE),
        (HostValue::from(2.9), PropertyAttributes::DONT_ENUM),
        (HostValue::from(f64::NAN), PropertyAttributes::NONE),
    ];

    for (flags, expected) in cases {
        let receiver = fx.object(fx.outer);
        let args = [
            fx.platform_value(),
            HostValue::Object(receiver),
            HostValue::from("k"),
            flags,
            getter.clone(),
        ];
        fx.call(entry, &args).unwrap();
        assert_eq!(
            fx.heap
                .property_attributes(receiver, &PropertyKey::named("k"))
                .unwrap(),
            Some(expected)
        );
    }
}

#[test]
fn test_lazy_entry_points_accept_symbol_names() {
    let fx = Fixture::new();
    let exports = installed(&fx, &GateConfig::default());
    let receiver = fx.object(fx.outer);
    let getter = fx.function(fx.inner, "getter", |_, info| Ok(info.arg(2)));
    let args = [
        fx.platform_value(),
        HostValue::Object(receiver),
        HostValue::Symbol(9),
        HostValue::from(0),
        HostValue::Object(getter),
    ];
    fx.call(export(&fx, exports, "defineLazyProperty"), &args).unwrap();
    assert_eq!(
        fx.heap.get(receiver, &PropertyKey::Symbol(9)).unwrap(),
        HostValue::Symbol(9)
    );

    let options = fx.object(fx.outer);
    fx.put(options, "receiver", HostValue::Object(receiver));
    fx.put(options, "name", HostValue::Symbol(10));
    fx.put(options, "platform", fx.platform_value());
    fx.put(options, "getter", HostValue::Object(fx.constant(HostValue::from("sym"))));
    fx.call(export(&fx, exports, "createLazyDataProperty"), &[HostValue::Object(options)])
        .unwrap();
    assert_eq!(
        fx.heap.get(receiver, &PropertyKey::Symbol(10)).unwrap(),
        HostValue::from("sym")
    );

    fx.put(options, "name", HostValue::from(3));
    let err = fx
        .call(export(&fx, exports, "createLazyDataProperty"), &[HostValue::Object(options)])
        .unwrap_err();
    assert_eq!(fx.error_name(&err), "TypeError");
}
