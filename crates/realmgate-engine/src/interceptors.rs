//! Standard interceptors
//!
//! Ready-made hook functions, created in the platform's realm, for the common
//! bridging chores: swapping interface objects for their implementations on the
//! way in, swapping results back on the way out, guarding class constructors,
//! bracketing a call with an unlock frame, and translating escaping errors.

use std::rc::Rc;

use realmgate_sdk::{
    CallInfo, ErrorKind, Exception, FunctionSpec, HostRuntime, HostValue, NativeCallback,
    ObjectHandle, PropertyKey,
};

use crate::error::{GateError, GateResult};
use crate::interceptor::InterceptorContext;
use crate::marshal;
use crate::platform::Platform;

fn interceptor<F>(
    host: &dyn HostRuntime,
    platform: &Rc<Platform>,
    name: &str,
    length: u32,
    body: F,
) -> GateResult<ObjectHandle>
where
    F: Fn(&dyn HostRuntime, &Platform, &CallInfo) -> GateResult<HostValue> + 'static,
{
    let bound = Rc::clone(platform);
    let callback: NativeCallback = Rc::new(move |host: &dyn HostRuntime, info: &CallInfo| {
        body(host, &bound, info).map_err(|err| err.into_exception(host, host.current_realm()))
    });
    let spec = FunctionSpec::new(callback).with_name(name).with_length(length);
    Ok(host.new_function(platform.realm(), spec)?)
}

fn context_arg(info: &CallInfo, index: usize) -> GateResult<InterceptorContext> {
    let value = info.arg(index);
    value
        .as_object()
        .map(InterceptorContext::from_handle)
        .ok_or_else(|| GateError::argument_type("context", "object", &value))
}

fn unwrap_slot(
    host: &dyn HostRuntime,
    platform: &Platform,
    arguments: ObjectHandle,
    index: usize,
) -> GateResult<()> {
    let key = PropertyKey::index(index);
    let value = host.get(arguments, &key)?;
    if let Some(implementation) = platform.implementation_of(host, &value)? {
        host.set(arguments, &key, HostValue::Object(implementation))?;
    }
    Ok(())
}

/// `before` hook: replace `context.this` by its implementation, if it has one
pub fn unwrap_this(host: &dyn HostRuntime, platform: &Rc<Platform>) -> GateResult<ObjectHandle> {
    interceptor(host, platform, "unwrapThisInterceptor", 2, |host, platform, info| {
        let context = context_arg(info, 0)?;
        let this = context.this(host)?;
        if let Some(implementation) = platform.implementation_of(host, &this)? {
            context.set_this(host, HostValue::Object(implementation))?;
        }
        Ok(HostValue::Undefined)
    })
}

/// `before` hook: unwrap the arguments at `indices`
pub fn unwrap_arguments(
    host: &dyn HostRuntime,
    platform: &Rc<Platform>,
    indices: Vec<usize>,
) -> GateResult<ObjectHandle> {
    interceptor(host, platform, "unwrapArgumentsInterceptor", 2, move |host, platform, info| {
        let context = context_arg(info, 0)?;
        if let HostValue::Object(arguments) = context.arguments_value(host)? {
            for &index in &indices {
                unwrap_slot(host, platform, arguments, index)?;
            }
        }
        Ok(HostValue::Undefined)
    })
}

/// `before` hook: unwrap every argument
pub fn unwrap_all_arguments(
    host: &dyn HostRuntime,
    platform: &Rc<Platform>,
) -> GateResult<ObjectHandle> {
    interceptor(host, platform, "unwrapAllArgumentsInterceptor", 2, |host, platform, info| {
        let context = context_arg(info, 0)?;
        if let HostValue::Object(arguments) = context.arguments_value(host)? {
            let length = host.get(arguments, &PropertyKey::named("length"))?;
            for index in 0..marshal::array_like_length(&length) {
                unwrap_slot(host, platform, arguments, index)?;
            }
        }
        Ok(HostValue::Undefined)
    })
}

/// `after` hook: replace an implementation result by its interface
pub fn wrap_return_value(
    host: &dyn HostRuntime,
    platform: &Rc<Platform>,
) -> GateResult<ObjectHandle> {
    interceptor(host, platform, "wrapReturnValueInterceptor", 3, |host, platform, info| {
        let value = info.arg(0);
        Ok(match platform.interface_of(host, &value)? {
            Some(interface) => HostValue::Object(interface),
            None => value,
        })
    })
}

/// `before` hook: reject plain calls of a class constructor
pub fn require_new_target(
    host: &dyn HostRuntime,
    platform: &Rc<Platform>,
    class_name: &str,
) -> GateResult<ObjectHandle> {
    let message = format!(
        "Failed to construct '{}': Please use the 'new' operator, this DOM object constructor cannot be called as a function.",
        class_name
    );
    interceptor(host, platform, "validateClassInterceptor", 2, move |host, platform, info| {
        let context = context_arg(info, 0)?;
        if context.new_target(host)?.is_nullish() {
            let error = host.new_error(platform.realm(), ErrorKind::TypeError, &message)?;
            return Err(Exception::Thrown(error).into());
        }
        Ok(HostValue::Undefined)
    })
}

/// `before` hook: push an unlock frame
pub fn enter_unlock(host: &dyn HostRuntime, platform: &Rc<Platform>) -> GateResult<ObjectHandle> {
    interceptor(host, platform, "enterUnlockInterceptor", 2, |host, platform, _info| {
        platform.enter_unlock(host)?;
        Ok(HostValue::Undefined)
    })
}

/// `finally` hook: pop the unlock frame pushed by [`enter_unlock`]
pub fn leave_unlock(host: &dyn HostRuntime, platform: &Rc<Platform>) -> GateResult<ObjectHandle> {
    interceptor(host, platform, "leaveUnlockInterceptor", 2, |host, platform, _info| {
        platform.leave_unlock(host)?;
        Ok(HostValue::Undefined)
    })
}

/// `catch` hook: rethrow the exception translated into the platform's realm
pub fn translate_exception(
    host: &dyn HostRuntime,
    platform: &Rc<Platform>,
) -> GateResult<ObjectHandle> {
    interceptor(host, platform, "translateExceptionInterceptor", 3, |host, platform, info| {
        let translated = platform.translate_exception(host, info.arg(0))?;
        Err(GateError::Exception(translated))
    })
}
