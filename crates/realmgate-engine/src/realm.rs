//! Realm registry lookups
//!
//! Every object carries its creation realm; the boundary never tracks realms
//! itself. These helpers turn values and platform descriptors into `RealmId`s.

use realmgate_sdk::{HostResult, HostRuntime, HostValue, ObjectHandle, PropertyKey, RealmId};
use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Property of a platform descriptor naming the inner realm's global
pub const GLOBAL_KEY: &str = "global";

/// How the platform-native function factory picks its target realm
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RealmResolution {
    /// Use the creation realm of `platform.global`; fail if it is not an object
    #[default]
    Strict,

    /// Fall back to the platform object's own creation realm when `global` is not an object
    Permissive,
}

/// Creation realm of an object-like value
pub fn creation_realm_of(
    host: &dyn HostRuntime,
    argument: &str,
    value: &HostValue,
) -> GateResult<RealmId> {
    match value.as_object() {
        Some(object) => Ok(host.creation_realm(object)),
        None => Err(GateError::argument_type(argument, "object", value)),
    }
}

/// Global object of `value`'s creation realm, or `null` for primitives
pub fn creation_realm_global(host: &dyn HostRuntime, value: &HostValue) -> HostValue {
    match value.as_object() {
        Some(object) => HostValue::Object(host.realm_global(host.creation_realm(object))),
        None => HostValue::Null,
    }
}

/// Read `platform.global`
pub fn platform_global(host: &dyn HostRuntime, platform: ObjectHandle) -> HostResult<HostValue> {
    host.get(platform, &PropertyKey::named(GLOBAL_KEY))
}

/// Resolve the realm a platform exposes
pub fn resolve_platform_realm(
    host: &dyn HostRuntime,
    platform: ObjectHandle,
    mode: RealmResolution,
) -> GateResult<RealmId> {
    let global = platform_global(host, platform)?;
    match (global.as_object(), mode) {
        (Some(global), _) => Ok(host.creation_realm(global)),
        (None, RealmResolution::Permissive) => Ok(host.creation_realm(platform)),
        (None, RealmResolution::Strict) => {
            Err(GateError::argument_type("platform.global", "object", &global))
        }
    }
}
