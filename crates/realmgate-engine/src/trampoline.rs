//! Function trampoline engine
//!
//! `create_native_function` produces a function rooted in the platform's realm
//! that forwards calls to an implementation living in its own realm. The hook
//! set decides, once, which of three dispatch tiers the function uses:
//!
//! - **Direct**: arguments are copied and the implementation is called with
//!   the original receiver. Nothing else happens.
//! - **BeforeAfter**: an interceptor context is built, `before` hooks may rewrite
//!   it, the implementation runs with the rewritten receiver and arguments, and
//!   `after` hooks thread the result. Exceptions pass through untouched.
//! - **CatchFinally**: the before/after chain runs inside a recoverable boundary.
//!   Recoverable exceptions go to `catch`, and `finally` runs once on every exit
//!   except a host termination, which bypasses both.

use std::rc::Rc;

use realmgate_sdk::{
    CallInfo, ConstructorBehavior, Exception, FunctionSpec, HostResult, HostRuntime, HostValue,
    NativeCallback, ObjectHandle, RealmId,
};
use tracing::{debug, trace};

use crate::error::{GateError, GateResult};
use crate::hooks::{HookSet, Strategy};
use crate::interceptor::InterceptorContext;
use crate::marshal;
use crate::realm::{resolve_platform_realm, RealmResolution};

/// Configuration for [`create_native_function`]
#[derive(Debug, Clone)]
pub struct NativeFunctionOptions {
    /// Platform descriptor; its `global` selects the realm the function lives in
    pub platform: ObjectHandle,
    /// Function the trampoline forwards to
    pub implementation: ObjectHandle,
    /// Interception hooks
    pub hooks: HookSet,
    /// Prototype of every interceptor context (`None` = null prototype)
    pub context_prototype: Option<ObjectHandle>,
    /// Display name
    pub name: Option<String>,
    /// Arity metadata
    pub length: u32,
    /// Whether `new` is permitted
    pub allow_new: bool,
}

impl NativeFunctionOptions {
    /// Create options with no hooks, no name, zero arity and `new` disallowed
    pub fn new(platform: ObjectHandle, implementation: ObjectHandle) -> Self {
        Self {
            platform,
            implementation,
            hooks: HookSet::default(),
            context_prototype: None,
            name: None,
            length: 0,
            allow_new: false,
        }
    }

    /// Replace the hook set
    pub fn hooks(mut self, hooks: HookSet) -> Self {
        self.hooks = hooks;
        self
    }

    /// Append a `before` hook
    pub fn before(mut self, hook: ObjectHandle) -> Self {
        self.hooks.before.push(hook);
        self
    }

    /// Append an `after` hook
    pub fn after(mut self, hook: ObjectHandle) -> Self {
        self.hooks.after.push(hook);
        self
    }

    /// Append a `catch` hook
    pub fn catch(mut self, hook: ObjectHandle) -> Self {
        self.hooks.catch.push(hook);
        self
    }

    /// Append a `finally` hook
    pub fn finally(mut self, hook: ObjectHandle) -> Self {
        self.hooks.finally.push(hook);
        self
    }

    /// Set the interceptor context prototype
    pub fn context_prototype(mut self, prototype: ObjectHandle) -> Self {
        self.context_prototype = Some(prototype);
        self
    }

    /// Set the display name
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the arity metadata
    pub fn length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Allow or forbid `new`
    pub fn allow_new(mut self, allow_new: bool) -> Self {
        self.allow_new = allow_new;
        self
    }
}

/// Immutable data bound to a generated function
struct TrampolineBinding {
    platform: HostValue,
    implementation: ObjectHandle,
    hooks: HookSet,
    context_prototype: Option<ObjectHandle>,
}

impl TrampolineBinding {
    fn target_realm(&self, host: &dyn HostRuntime) -> RealmId {
        host.creation_realm(self.implementation)
    }

    fn call_direct(&self, host: &dyn HostRuntime, info: &CallInfo) -> HostResult<HostValue> {
        let args = marshal::copy_arguments(&info.args);
        host.call(self.target_realm(host), self.implementation, info.this.clone(), &args)
    }

    fn call_before_after(&self, host: &dyn HostRuntime, info: &CallInfo) -> HostResult<HostValue> {
        let realm = self.target_realm(host);
        trace!(strategy = Strategy::BeforeAfter.name(), realm = %realm, "dispatch");
        let context = InterceptorContext::build(host, realm, self.context_prototype, info)?;
        self.run_chain(host, realm, &context)
    }

    fn call_catch_finally(&self, host: &dyn HostRuntime, info: &CallInfo) -> HostResult<HostValue> {
        let realm = self.target_realm(host);
        trace!(strategy = Strategy::CatchFinally.name(), realm = %realm, "dispatch");
        let context = InterceptorContext::build(host, realm, self.context_prototype, info)?;
        let context_value = context.value();

        let outcome = match self.run_chain(host, realm, &context) {
            Err(Exception::Thrown(exception)) => {
                self.hooks
                    .run_catch(host, realm, exception, &context_value, &self.platform)
            }
            other => other,
        };
        if let Err(Exception::Terminated(signal)) = &outcome {
            debug!(signal = %signal, "unrecoverable signal bypasses catch and finally");
            return outcome;
        }

        // Single exit for success, caught-and-returned, and caught-and-rethrown.
        self.hooks
            .run_finally(host, realm, &context_value, &self.platform)?;
        outcome
    }

    fn run_chain(
        &self,
        host: &dyn HostRuntime,
        realm: RealmId,
        context: &InterceptorContext,
    ) -> HostResult<HostValue> {
        let context_value = context.value();
        self.hooks
            .run_before(host, realm, &context_value, &self.platform)?;
        let this = context.this(host)?;
        let args = context.arguments(host)?;
        let result = host.call(realm, self.implementation, this, &args)?;
        self.hooks
            .run_after(host, realm, result, &context_value, &self.platform)
    }
}

/// Create a realm-crossing function
pub fn create_native_function(
    host: &dyn HostRuntime,
    options: NativeFunctionOptions,
) -> GateResult<ObjectHandle> {
    let implementation = HostValue::Object(options.implementation);
    if !host.is_callable(&implementation) {
        return Err(GateError::argument_type("implementation", "function", &implementation));
    }
    if let Some(hook) = options
        .hooks
        .iter()
        .find(|hook| !host.is_callable(&HostValue::Object(*hook)))
    {
        return Err(GateError::option("hooks", format!("contains {}, which is not a function", hook)));
    }

    let realm = resolve_platform_realm(host, options.platform, RealmResolution::Strict)?;
    let strategy = options.hooks.strategy();
    let binding = Rc::new(TrampolineBinding {
        platform: HostValue::Object(options.platform),
        implementation: options.implementation,
        hooks: options.hooks,
        context_prototype: options.context_prototype,
    });
    let callback: NativeCallback = match strategy {
        Strategy::Direct => Rc::new(move |host: &dyn HostRuntime, info: &CallInfo| {
            binding.call_direct(host, info)
        }),
        Strategy::BeforeAfter => Rc::new(move |host: &dyn HostRuntime, info: &CallInfo| {
            binding.call_before_after(host, info)
        }),
        Strategy::CatchFinally => Rc::new(move |host: &dyn HostRuntime, info: &CallInfo| {
            binding.call_catch_finally(host, info)
        }),
    };

    let mut spec = FunctionSpec::new(callback)
        .with_length(options.length)
        .with_constructor(ConstructorBehavior::from_allow_new(options.allow_new));
    if let Some(name) = &options.name {
        spec = spec.with_name(name);
    }
    let function = host.new_function(realm, spec)?;
    debug!(
        strategy = strategy.name(),
        name = options.name.as_deref().unwrap_or(""),
        length = options.length,
        allow_new = options.allow_new,
        realm = %realm,
        "trampoline created"
    );
    Ok(function)
}
