//! Reading entry-point options from script objects
//!
//! All shape checks happen here, before any realm-crossing work starts.

use realmgate_sdk::{HostRuntime, HostValue, ObjectHandle, PropertyKey};

use crate::error::{GateError, GateResult};
use crate::hooks::HookSet;
use crate::lazy::LazyDataPropertyOptions;
use crate::marshal;
use crate::trampoline::NativeFunctionOptions;

/// Require an object-like value
pub fn expect_object(argument: &str, value: &HostValue) -> GateResult<ObjectHandle> {
    value
        .as_object()
        .ok_or_else(|| GateError::argument_type(argument, "object", value))
}

/// Require a callable value
pub fn expect_callable(
    host: &dyn HostRuntime,
    argument: &str,
    value: &HostValue,
) -> GateResult<ObjectHandle> {
    match value.as_object() {
        Some(object) if host.is_callable(value) => Ok(object),
        _ => Err(GateError::argument_type(argument, "function", value)),
    }
}

/// Arity metadata: only integers in `0..=i32::MAX` count, anything else is 0
pub fn read_length(value: &HostValue) -> u32 {
    match value.as_number() {
        Some(n) if n.fract() == 0.0 && (0.0..=i32::MAX as f64).contains(&n) => n as u32,
        _ => 0,
    }
}

/// Modular conversion to `u32`, as the host's unsigned 32-bit conversion does it.
///
/// Non-finite numbers become 0; everything else wraps, so `-1` is `0xFFFF_FFFF`.
pub fn to_uint32(value: &HostValue) -> u32 {
    let number = match value {
        HostValue::Number(n) => *n,
        HostValue::Bool(b) => f64::from(u8::from(*b)),
        HostValue::String(s) if s.trim().is_empty() => 0.0,
        HostValue::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    };
    if !number.is_finite() {
        return 0;
    }
    number.trunc().rem_euclid(4_294_967_296.0) as u32
}

/// Display name: only strings count
pub fn read_name(value: &HostValue) -> Option<String> {
    value.as_str().map(str::to_string)
}

fn get(host: &dyn HostRuntime, object: ObjectHandle, key: &str) -> GateResult<HostValue> {
    Ok(host.get(object, &PropertyKey::named(key))?)
}

/// Read one hook stage: a callable, an array of callables, or nothing
pub fn read_hooks(
    host: &dyn HostRuntime,
    options: ObjectHandle,
    stage: &str,
) -> GateResult<Vec<ObjectHandle>> {
    let value = get(host, options, stage)?;
    if value.is_nullish() {
        return Ok(Vec::new());
    }
    if host.is_callable(&value) {
        return Ok(value.as_object().into_iter().collect());
    }
    // Lists are arrays or array-likes with a numeric `length`.
    let list = match value.as_object() {
        Some(list) if get(host, list, "length")?.as_number().is_some() => list,
        _ => return Err(GateError::option(stage, "is not a function")),
    };
    let items = marshal::read_arguments(host, &HostValue::Object(list))?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| match item.as_object() {
            Some(hook) if host.is_callable(item) => Ok(hook),
            _ => Err(GateError::option(
                &format!("{}[{}]", stage, index),
                "is not a function",
            )),
        })
        .collect()
}

/// Parse `createNativeFunction` options
pub fn read_native_function_options(
    host: &dyn HostRuntime,
    value: &HostValue,
) -> GateResult<NativeFunctionOptions> {
    let options = expect_object("options", value)?;
    let platform = expect_object("options.platform", &get(host, options, "platform")?)?;
    let implementation =
        expect_callable(host, "options.implementation", &get(host, options, "implementation")?)?;

    let hooks = HookSet {
        before: read_hooks(host, options, "before")?,
        after: read_hooks(host, options, "after")?,
        catch: read_hooks(host, options, "catch")?,
        finally: read_hooks(host, options, "finally")?,
    };
    let context_prototype = match get(host, options, "context")? {
        HostValue::Object(prototype) => Some(prototype),
        HostValue::Undefined | HostValue::Null => None,
        _ => return Err(GateError::option("context", "must be an object, if present")),
    };

    let mut parsed = NativeFunctionOptions::new(platform, implementation)
        .hooks(hooks)
        .length(read_length(&get(host, options, "length")?))
        .allow_new(get(host, options, "allowNew")?.is_truthy());
    parsed.context_prototype = context_prototype;
    parsed.name = read_name(&get(host, options, "name")?);
    Ok(parsed)
}

/// Parse `createLazyDataProperty` options
pub fn read_lazy_data_property_options(
    host: &dyn HostRuntime,
    value: &HostValue,
) -> GateResult<LazyDataPropertyOptions> {
    let options = expect_object("options", value)?;
    let receiver = expect_object("options.receiver", &get(host, options, "receiver")?)?;
    let name_value = get(host, options, "name")?;
    let name = PropertyKey::from_value(&name_value)
        .ok_or_else(|| GateError::argument_type("options.name", "string or symbol", &name_value))?;
    let platform = expect_object("options.platform", &get(host, options, "platform")?)?;
    let getter = expect_callable(host, "options.getter", &get(host, options, "getter")?)?;

    Ok(LazyDataPropertyOptions::new(receiver, name, platform, getter)
        .configurable(get(host, options, "configurable")?.is_truthy())
        .enumerable(get(host, options, "enumerable")?.is_truthy())
        .writable(get(host, options, "writable")?.is_truthy()))
}
