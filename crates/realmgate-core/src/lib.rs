//! realmgate reference host runtime
//!
//! This crate provides an in-memory [`HostRuntime`](realmgate_sdk::HostRuntime)
//! implementation including:
//! - A realm arena (global object, intrinsic prototypes, security token per realm)
//! - An object arena with creation-realm tracking
//! - Native functions and lazy data properties
//! - Global-object access checks gated by security tokens
//! - Resource limits and an uncatchable termination signal

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod heap;
mod object;
pub mod realm;

pub use heap::{Heap, HeapOptions, RealmScope, ResourceLimits, MAX_ARRAY_LENGTH};
pub use realm::{RealmInfo, RealmOptions};
