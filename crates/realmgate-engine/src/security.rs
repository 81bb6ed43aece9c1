//! Security token administration
//!
//! Reads and rotates the token of an object's creation realm. Tokens are opaque
//! here; the host enforces them on cross-realm access. Every rotation returns
//! the token that was active before it so callers can restore it.

use realmgate_sdk::{HostRuntime, HostValue};
use tracing::debug;

use crate::error::GateResult;
use crate::realm::creation_realm_of;

/// Token of `object`'s creation realm
pub fn get_security_token(host: &dyn HostRuntime, object: &HostValue) -> GateResult<HostValue> {
    let realm = creation_realm_of(host, "object", object)?;
    Ok(host.security_token(realm))
}

/// Install `token` on `object`'s creation realm, returning the previous token
pub fn set_security_token(
    host: &dyn HostRuntime,
    object: &HostValue,
    token: HostValue,
) -> GateResult<HostValue> {
    let realm = creation_realm_of(host, "object", object)?;
    let previous = host.security_token(realm);
    debug!(realm = %realm, "security token rotated");
    host.set_security_token(realm, token);
    Ok(previous)
}

/// Restore the default token of `object`'s creation realm, returning the previous token
pub fn use_default_security_token(
    host: &dyn HostRuntime,
    object: &HostValue,
) -> GateResult<HostValue> {
    let realm = creation_realm_of(host, "object", object)?;
    let previous = host.security_token(realm);
    debug!(realm = %realm, "security token reset to default");
    host.use_default_security_token(realm);
    Ok(previous)
}
