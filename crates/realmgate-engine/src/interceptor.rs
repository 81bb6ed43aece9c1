//! Interceptor context
//!
//! The per-call record hooks receive. It has exactly three own properties,
//! `this`, `arguments` and `newTarget`, and a caller-chosen prototype (or none).
//! Hooks may overwrite `this` and `arguments`; the trampoline re-reads both
//! before invoking the implementation.

use realmgate_sdk::{
    CallInfo, HostResult, HostRuntime, HostValue, ObjectHandle, PropertyAttributes, PropertyKey,
    RealmId,
};

use crate::marshal;

/// Receiver field
pub const THIS_KEY: &str = "this";
/// Argument list field
pub const ARGUMENTS_KEY: &str = "arguments";
/// Constructor target field
pub const NEW_TARGET_KEY: &str = "newTarget";

/// Handle to a live interceptor context object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterceptorContext {
    handle: ObjectHandle,
}

impl InterceptorContext {
    /// Build a fresh context for one invocation
    pub fn build(
        host: &dyn HostRuntime,
        realm: RealmId,
        prototype: Option<ObjectHandle>,
        info: &CallInfo,
    ) -> HostResult<Self> {
        let handle = host.new_object(realm, prototype)?;
        let arguments = marshal::materialize_arguments(host, realm, &info.args)?;
        let fields = [
            (THIS_KEY, info.this.clone()),
            (ARGUMENTS_KEY, HostValue::Object(arguments)),
            (NEW_TARGET_KEY, info.new_target_value()),
        ];
        for (key, value) in fields {
            host.define_property(handle, &PropertyKey::named(key), value, PropertyAttributes::NONE)?;
        }
        Ok(Self { handle })
    }

    /// Wrap an existing context object (as received by a hook)
    pub fn from_handle(handle: ObjectHandle) -> Self {
        Self { handle }
    }

    /// Context object handle
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }

    /// Context object as a value
    pub fn value(&self) -> HostValue {
        HostValue::Object(self.handle)
    }

    /// Current receiver
    pub fn this(&self, host: &dyn HostRuntime) -> HostResult<HostValue> {
        host.get(self.handle, &PropertyKey::named(THIS_KEY))
    }

    /// Replace the receiver
    pub fn set_this(&self, host: &dyn HostRuntime, this: HostValue) -> HostResult<()> {
        host.set(self.handle, &PropertyKey::named(THIS_KEY), this)?;
        Ok(())
    }

    /// Current `arguments` value, unread
    pub fn arguments_value(&self, host: &dyn HostRuntime) -> HostResult<HostValue> {
        host.get(self.handle, &PropertyKey::named(ARGUMENTS_KEY))
    }

    /// Current argument list
    pub fn arguments(&self, host: &dyn HostRuntime) -> HostResult<Vec<HostValue>> {
        marshal::read_arguments(host, &self.arguments_value(host)?)
    }

    /// `newTarget`, or `undefined` for plain calls
    pub fn new_target(&self, host: &dyn HostRuntime) -> HostResult<HostValue> {
        host.get(self.handle, &PropertyKey::named(NEW_TARGET_KEY))
    }
}
