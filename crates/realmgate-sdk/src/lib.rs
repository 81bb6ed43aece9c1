//! realmgate SDK - host runtime interface
//!
//! This crate provides the minimal types and traits a host script engine must
//! expose for the realmgate boundary to run on top of it:
//!
//! - value and handle types ([`HostValue`], [`ObjectHandle`], [`RealmId`])
//! - the exception model ([`Exception`], [`Termination`])
//! - property attributes and constructor behavior
//! - the [`HostRuntime`] trait itself
//!
//! It contains no boundary logic; see `realmgate-engine` for that.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod attributes;
pub mod error;
pub mod runtime;
pub mod value;

pub use attributes::{ConstructorBehavior, PropertyAttributes};
pub use error::{ErrorKind, Exception, HostResult, Termination};
pub use runtime::{
    CallInfo, FunctionSpec, HostRuntime, LazyAccess, LazyGetter, NativeCallback,
};
pub use value::{HostValue, ObjectHandle, PropertyKey, RealmId};
