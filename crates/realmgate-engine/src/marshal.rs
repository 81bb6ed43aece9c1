//! Argument marshalling across the realm boundary
//!
//! Values are passed by handle. What gets copied is the argument list itself.
//! The implementation always receives a fresh vector, never a view of the
//! caller's frame, and hook rewrites flow through an array object owned by the
//! interceptor context.

use realmgate_sdk::{
    ErrorKind, Exception, HostResult, HostRuntime, HostValue, ObjectHandle, PropertyKey, RealmId,
};

/// Largest array-like length accepted when reading arguments back
pub const MAX_ARGUMENTS: usize = 65_535;

/// Copy a call's argument list
pub fn copy_arguments(args: &[HostValue]) -> Vec<HostValue> {
    args.to_vec()
}

/// Materialize arguments as a fresh array in `realm`
pub fn materialize_arguments(
    host: &dyn HostRuntime,
    realm: RealmId,
    args: &[HostValue],
) -> HostResult<ObjectHandle> {
    host.new_array(realm, args)
}

/// Read an argument list back from a (possibly hook-replaced) value.
///
/// Any array-like object is accepted through `length` and indexed reads.
/// `undefined`/`null` read as no arguments.
pub fn read_arguments(host: &dyn HostRuntime, value: &HostValue) -> HostResult<Vec<HostValue>> {
    let object = match value {
        HostValue::Undefined | HostValue::Null => return Ok(Vec::new()),
        HostValue::Object(object) => *object,
        other => {
            let error = host.new_error(
                host.current_realm(),
                ErrorKind::TypeError,
                &format!(
                    "context.arguments must be an array-like object, got {}",
                    other.type_name()
                ),
            )?;
            return Err(Exception::Thrown(error));
        }
    };
    let length = array_like_length(&host.get(object, &PropertyKey::named("length"))?);
    (0..length)
        .map(|index| host.get(object, &PropertyKey::index(index)))
        .collect()
}

/// Clamp a `length` value to a usable argument count
pub fn array_like_length(value: &HostValue) -> usize {
    match value.as_number() {
        Some(n) if n.is_finite() && n > 0.0 => (n.trunc() as usize).min(MAX_ARGUMENTS),
        _ => 0,
    }
}
