//! Lazy property installer
//!
//! Two entry points register a data property whose value comes from a getter
//! function on first read. The getter always runs in its own creation realm.
//!
//! - [`create_lazy_data_property`]: option-driven; each of `configurable`,
//!   `enumerable` and `writable` must be opted into explicitly. The getter is
//!   called with the object read through as `this` and with
//!   `(receiver, name, platform)`, where `receiver` is the object the property
//!   was installed on.
//! - [`define_lazy_property`]: fixed signature with a [`LazyFlags`] bitmask. The
//!   getter is called with an `undefined` receiver and
//!   `(platform, holder, name, shouldThrow)`.

use std::rc::Rc;

use realmgate_sdk::{
    HostRuntime, HostValue, LazyAccess, LazyGetter, ObjectHandle, PropertyAttributes, PropertyKey,
};

use crate::error::{GateError, GateResult};
use crate::realm::{resolve_platform_realm, RealmResolution};

/// Options for [`create_lazy_data_property`]
#[derive(Debug, Clone)]
pub struct LazyDataPropertyOptions {
    /// Object receiving the property
    pub receiver: ObjectHandle,
    /// Property name
    pub name: PropertyKey,
    /// Platform descriptor passed to the getter
    pub platform: ObjectHandle,
    /// Getter function
    pub getter: ObjectHandle,
    /// Property may be deleted or redefined
    pub configurable: bool,
    /// Property shows up in enumeration
    pub enumerable: bool,
    /// Property may be overwritten once materialized
    pub writable: bool,
}

impl LazyDataPropertyOptions {
    /// Create options with every flag restricted
    pub fn new(
        receiver: ObjectHandle,
        name: PropertyKey,
        platform: ObjectHandle,
        getter: ObjectHandle,
    ) -> Self {
        Self {
            receiver,
            name,
            platform,
            getter,
            configurable: false,
            enumerable: false,
            writable: false,
        }
    }

    /// Set `configurable`
    pub fn configurable(mut self, configurable: bool) -> Self {
        self.configurable = configurable;
        self
    }

    /// Set `enumerable`
    pub fn enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = enumerable;
        self
    }

    /// Set `writable`
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Host attributes: every flag left off adds a restriction
    pub fn attributes(&self) -> PropertyAttributes {
        let mut attributes = PropertyAttributes::NONE;
        if !self.configurable {
            attributes |= PropertyAttributes::DONT_DELETE;
        }
        if !self.enumerable {
            attributes |= PropertyAttributes::DONT_ENUM;
        }
        if !self.writable {
            attributes |= PropertyAttributes::READ_ONLY;
        }
        attributes
    }
}

/// Bitmask accepted by [`define_lazy_property`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LazyFlags(u32);

impl LazyFlags {
    /// No restrictions
    pub const NONE: Self = Self(0);
    /// Not deletable or redefinable
    pub const DONT_DELETE: Self = Self(1 << 0);
    /// Hidden from enumeration
    pub const DONT_ENUM: Self = Self(1 << 1);
    /// Not writable
    pub const READ_ONLY: Self = Self(1 << 2);

    const ALL: u32 = 0b111;

    /// Create from raw bits; unknown bits are dropped
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::ALL)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u32 {
        self.0
    }

    /// Check if all of `other`'s bits are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Convert to host property attributes
    pub fn to_attributes(self) -> PropertyAttributes {
        let mut attributes = PropertyAttributes::NONE;
        if self.contains(Self::DONT_DELETE) {
            attributes |= PropertyAttributes::DONT_DELETE;
        }
        if self.contains(Self::DONT_ENUM) {
            attributes |= PropertyAttributes::DONT_ENUM;
        }
        if self.contains(Self::READ_ONLY) {
            attributes |= PropertyAttributes::READ_ONLY;
        }
        attributes
    }
}

impl std::ops::BitOr for LazyFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

fn require_callable(host: &dyn HostRuntime, argument: &str, getter: ObjectHandle) -> GateResult<()> {
    let value = HostValue::Object(getter);
    if host.is_callable(&value) {
        Ok(())
    } else {
        Err(GateError::argument_type(argument, "function", &value))
    }
}

/// Install a lazy data property and return the receiver
pub fn create_lazy_data_property(
    host: &dyn HostRuntime,
    options: LazyDataPropertyOptions,
) -> GateResult<ObjectHandle> {
    require_callable(host, "getter", options.getter)?;
    let realm = resolve_platform_realm(host, options.platform, RealmResolution::Strict)?;
    let attributes = options.attributes();

    let getter = options.getter;
    let receiver = HostValue::Object(options.receiver);
    let platform = HostValue::Object(options.platform);
    let name = options.name.to_value();
    let lazy: LazyGetter = Rc::new(move |host: &dyn HostRuntime, access: &LazyAccess| {
        let args = [receiver.clone(), name.clone(), platform.clone()];
        host.call(host.creation_realm(getter), getter, access.holder.clone(), &args)
    });
    host.define_lazy_property(realm, options.receiver, &options.name, lazy, attributes)?;
    Ok(options.receiver)
}

/// Install a lazy property with the fixed `(platform, holder, name, shouldThrow)` getter contract
pub fn define_lazy_property(
    host: &dyn HostRuntime,
    platform: ObjectHandle,
    receiver: ObjectHandle,
    name: PropertyKey,
    flags: LazyFlags,
    getter: ObjectHandle,
) -> GateResult<()> {
    require_callable(host, "getter", getter)?;
    let realm = resolve_platform_realm(host, platform, RealmResolution::Strict)?;

    let platform = HostValue::Object(platform);
    let name_value = name.to_value();
    let lazy: LazyGetter = Rc::new(move |host: &dyn HostRuntime, access: &LazyAccess| {
        let args = [
            platform.clone(),
            access.holder.clone(),
            name_value.clone(),
            HostValue::Bool(access.should_throw),
        ];
        host.call(host.creation_realm(getter), getter, HostValue::Undefined, &args)
    });
    host.define_lazy_property(realm, receiver, &name, lazy, flags.to_attributes())?;
    Ok(())
}
