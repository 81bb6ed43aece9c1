//! Platform-native function factory
//!
//! A trampoline with a fixed contract: the implementation is called in its own
//! creation realm with an `undefined` receiver and exactly
//! `(platform, this, arguments, newTarget)`, where `arguments` is a fresh array.

use std::rc::Rc;

use realmgate_sdk::{
    CallInfo, ConstructorBehavior, FunctionSpec, HostResult, HostRuntime, HostValue,
    NativeCallback, ObjectHandle,
};
use tracing::debug;

use crate::error::{GateError, GateResult};
use crate::marshal;
use crate::realm::{resolve_platform_realm, RealmResolution};

/// Options for [`native_function`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformFunctionOptions {
    /// Display name
    pub name: Option<String>,
    /// Whether `new` is permitted
    pub allow_new: bool,
    /// Arity metadata
    pub length: u32,
    /// How the function's own realm is picked from the platform
    pub resolution: RealmResolution,
}

impl PlatformFunctionOptions {
    /// Create options with the given realm resolution mode
    pub fn new(resolution: RealmResolution) -> Self {
        Self {
            resolution,
            ..Default::default()
        }
    }

    /// Set the display name
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Allow or forbid `new`
    pub fn allow_new(mut self, allow_new: bool) -> Self {
        self.allow_new = allow_new;
        self
    }

    /// Set the arity metadata
    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }
}

struct PlatformBinding {
    platform: HostValue,
    implementation: ObjectHandle,
}

impl PlatformBinding {
    fn invoke(&self, host: &dyn HostRuntime, info: &CallInfo) -> HostResult<HostValue> {
        let realm = host.creation_realm(self.implementation);
        let arguments = marshal::materialize_arguments(host, realm, &info.args)?;
        let args = [
            self.platform.clone(),
            info.this.clone(),
            HostValue::Object(arguments),
            info.new_target_value(),
        ];
        host.call(realm, self.implementation, HostValue::Undefined, &args)
    }
}

/// Create a platform-native function
pub fn native_function(
    host: &dyn HostRuntime,
    platform: ObjectHandle,
    implementation: ObjectHandle,
    options: PlatformFunctionOptions,
) -> GateResult<ObjectHandle> {
    let callee = HostValue::Object(implementation);
    if !host.is_callable(&callee) {
        return Err(GateError::argument_type("implementation", "function", &callee));
    }
    let realm = resolve_platform_realm(host, platform, options.resolution)?;

    let binding = Rc::new(PlatformBinding {
        platform: HostValue::Object(platform),
        implementation,
    });
    let callback: NativeCallback = Rc::new(move |host: &dyn HostRuntime, info: &CallInfo| {
        binding.invoke(host, info)
    });
    let mut spec = FunctionSpec::new(callback)
        .with_length(options.length)
        .with_constructor(ConstructorBehavior::from_allow_new(options.allow_new));
    if let Some(name) = &options.name {
        spec = spec.with_name(name);
    }
    let function = host.new_function(realm, spec)?;
    debug!(
        name = options.name.as_deref().unwrap_or(""),
        length = options.length,
        resolution = ?options.resolution,
        realm = %realm,
        "platform-native function created"
    );
    Ok(function)
}
