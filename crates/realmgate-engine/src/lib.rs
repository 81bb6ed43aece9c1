//! realmgate engine - the realm-isolation boundary
//!
//! This crate builds the controlled surface through which an outer realm uses
//! capabilities of an inner, trusted realm:
//! - Function trampolines with direct, before/after and catch/finally dispatch
//! - Interceptor contexts that let hooks rewrite a call
//! - Lazy data properties backed by cross-realm getters
//! - Platform-native functions with the fixed `(platform, this, arguments, newTarget)` contract
//! - Security-token administration and the platform lock stack
//! - Script-facing bindings and TOML configuration
//!
//! Everything runs against the [`HostRuntime`](realmgate_sdk::HostRuntime) trait.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod bindings;
pub mod config;
pub mod error;
pub mod hooks;
pub mod interceptor;
pub mod interceptors;
pub mod lazy;
pub mod marshal;
pub mod native;
pub mod options;
pub mod platform;
pub mod realm;
pub mod security;
pub mod trampoline;

pub use config::{BindingsConfig, ConfigError, FunctionsConfig, GateConfig};
pub use error::{GateError, GateResult, LockError};
pub use hooks::{HookSet, Strategy};
pub use interceptor::InterceptorContext;
pub use lazy::{create_lazy_data_property, define_lazy_property, LazyDataPropertyOptions, LazyFlags};
pub use native::{native_function, PlatformFunctionOptions};
pub use platform::{FunctionOptions, LockState, Platform};
pub use realm::{creation_realm_global, creation_realm_of, resolve_platform_realm, RealmResolution};
pub use security::{get_security_token, set_security_token, use_default_security_token};
pub use trampoline::{create_native_function, NativeFunctionOptions};
