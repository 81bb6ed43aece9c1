//! Script-facing bindings
//!
//! `install` exposes the boundary's entry points as non-constructible native
//! functions on an exports object. Arguments are shape-checked before any
//! realm-crossing work, and boundary errors surface as host exceptions.

use std::rc::Rc;

use realmgate_sdk::{
    CallInfo, FunctionSpec, HostRuntime, HostValue, NativeCallback, ObjectHandle,
    PropertyAttributes, PropertyKey, RealmId,
};
use tracing::debug;

use crate::config::GateConfig;
use crate::error::{GateError, GateResult};
use crate::lazy::{create_lazy_data_property, define_lazy_property, LazyFlags};
use crate::native::{native_function, PlatformFunctionOptions};
use crate::options::{
    expect_callable, expect_object, read_lazy_data_property_options, read_length, read_name,
    read_native_function_options, to_uint32,
};
use crate::realm::{creation_realm_global, RealmResolution};
use crate::security;
use crate::trampoline::create_native_function;

fn require_args(entry: &'static str, info: &CallInfo, expected: usize) -> GateResult<()> {
    if info.len() < expected {
        return Err(GateError::InvalidArgumentCount {
            entry,
            expected,
            got: info.len(),
        });
    }
    Ok(())
}

struct Exporter<'h> {
    host: &'h dyn HostRuntime,
    realm: RealmId,
    exports: ObjectHandle,
    attributes: PropertyAttributes,
}

impl Exporter<'_> {
    /// Export a function that requires at least `length` arguments
    fn export<F>(&self, name: &'static str, length: u32, body: F) -> GateResult<()>
    where
        F: Fn(&dyn HostRuntime, &CallInfo) -> GateResult<HostValue> + 'static,
    {
        self.define(name, length, length as usize, body)
    }

    /// Export a function whose missing arguments read as `undefined`
    fn export_lenient<F>(&self, name: &'static str, length: u32, body: F) -> GateResult<()>
    where
        F: Fn(&dyn HostRuntime, &CallInfo) -> GateResult<HostValue> + 'static,
    {
        self.define(name, length, 0, body)
    }

    fn define<F>(&self, name: &'static str, length: u32, required: usize, body: F) -> GateResult<()>
    where
        F: Fn(&dyn HostRuntime, &CallInfo) -> GateResult<HostValue> + 'static,
    {
        let callback: NativeCallback = Rc::new(move |host: &dyn HostRuntime, info: &CallInfo| {
            require_args(name, info, required)
                .and_then(|()| body(host, info))
                .map_err(|err| err.into_exception(host, host.current_realm()))
        });
        let spec = FunctionSpec::new(callback).with_name(name).with_length(length);
        let function = self.host.new_function(self.realm, spec)?;
        self.host.define_property(
            self.exports,
            &PropertyKey::named(name),
            HostValue::Object(function),
            self.attributes,
        )?;
        Ok(())
    }
}

fn native_function_entry(
    host: &dyn HostRuntime,
    info: &CallInfo,
    resolution: RealmResolution,
) -> GateResult<HostValue> {
    let platform = expect_object("platform", &info.arg(0))?;
    let implementation = expect_callable(host, "implementation", &info.arg(1))?;
    let options = PlatformFunctionOptions {
        name: read_name(&info.arg(2)),
        allow_new: info.arg(3).is_truthy(),
        length: read_length(&info.arg(4)),
        resolution,
    };
    Ok(HostValue::Object(native_function(host, platform, implementation, options)?))
}

/// Install every entry point on `exports`, creating the functions in `realm`
pub fn install(
    host: &dyn HostRuntime,
    realm: RealmId,
    exports: ObjectHandle,
    config: &GateConfig,
) -> GateResult<()> {
    let exporter = Exporter {
        host,
        realm,
        exports,
        attributes: if config.bindings.freeze_exports {
            PropertyAttributes::FROZEN
        } else {
            PropertyAttributes::NONE
        },
    };

    exporter.export("createNativeFunction", 1, |host, info| {
        let options = read_native_function_options(host, &info.arg(0))?;
        Ok(HostValue::Object(create_native_function(host, options)?))
    })?;
    exporter.export("createLazyDataProperty", 1, |host, info| {
        let options = read_lazy_data_property_options(host, &info.arg(0))?;
        Ok(HostValue::Object(create_lazy_data_property(host, options)?))
    })?;

    exporter.export("getSecurityToken", 1, |host, info| {
        security::get_security_token(host, &info.arg(0))
    })?;
    exporter.export("setSecurityToken", 2, |host, info| {
        security::set_security_token(host, &info.arg(0), info.arg(1))
    })?;
    exporter.export("useDefaultSecurityToken", 1, |host, info| {
        security::use_default_security_token(host, &info.arg(0))
    })?;

    let resolution = config.bindings.native_function_resolution;
    exporter.export("nativeFunction", 4, move |host, info| {
        native_function_entry(host, info, resolution)
    })?;
    exporter.export("nativeFunctionStrict", 4, |host, info| {
        native_function_entry(host, info, RealmResolution::Strict)
    })?;
    exporter.export("nativeFunctionPermissive", 4, |host, info| {
        native_function_entry(host, info, RealmResolution::Permissive)
    })?;

    exporter.export("defineLazyProperty", 5, |host, info| {
        let platform = expect_object("platform", &info.arg(0))?;
        let receiver = expect_object("receiver", &info.arg(1))?;
        let name_value = info.arg(2);
        let name = PropertyKey::from_value(&name_value)
            .ok_or_else(|| GateError::argument_type("name", "string or symbol", &name_value))?;
        let flags = LazyFlags::from_bits(to_uint32(&info.arg(3)));
        let getter = expect_callable(host, "getter", &info.arg(4))?;
        define_lazy_property(host, platform, receiver, name, flags, getter)?;
        Ok(HostValue::Undefined)
    })?;

    exporter.export_lenient("getCreationContextGlobal", 1, |host, info| {
        Ok(creation_realm_global(host, &info.arg(0)))
    })?;
    exporter.export_lenient("getCreationRealmGlobal", 1, |host, info| {
        Ok(creation_realm_global(host, &info.arg(0)))
    })?;

    debug!(realm = %realm, exports = %exports, resolution = ?resolution, "bindings installed");
    Ok(())
}
