//! Platform: the outer-realm handle on an inner realm
//!
//! A `Platform` wraps a platform descriptor object (whose `global` names the
//! inner realm) and layers on top of it:
//! - interface/implementation association between outer objects and inner ones
//! - a reference-counted lock stack that swaps the inner realm's security token
//! - a locked executor that translates outer-realm exceptions into the inner realm
//! - convenience constructors for trampolines and lazy properties

use std::cell::RefCell;
use std::rc::Rc;

use realmgate_sdk::{
    ErrorKind, Exception, HostResult, HostRuntime, HostValue, ObjectHandle, PropertyAttributes,
    PropertyKey, RealmId,
};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::config::GateConfig;
use crate::error::{GateError, GateResult, LockError};
use crate::hooks::HookSet;
use crate::lazy::{create_lazy_data_property, LazyDataPropertyOptions};
use crate::realm::{resolve_platform_realm, RealmResolution};
use crate::security;
use crate::trampoline::{create_native_function, NativeFunctionOptions};

/// Security state a lock-stack frame installs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// The platform's private lock token is installed
    Locked,
    /// The token captured at creation is installed
    Unlocked,
}

#[derive(Debug, Clone, Copy)]
struct SecurityFrame {
    state: LockState,
    refs: usize,
}

/// Options for [`Platform::function`]
#[derive(Debug, Clone, Default)]
pub struct FunctionOptions {
    /// Interception hooks
    pub hooks: HookSet,
    /// Prototype of every interceptor context
    pub context_prototype: Option<ObjectHandle>,
    /// Display name
    pub name: Option<String>,
    /// Arity metadata
    pub length: u32,
    /// Whether `new` is permitted (`None` = configured default)
    pub allow_new: Option<bool>,
}

/// Platform handle
pub struct Platform {
    descriptor: ObjectHandle,
    global: ObjectHandle,
    realm: RealmId,
    default_allow_new: bool,
    lock_token: HostValue,
    unlock_token: HostValue,
    implementations: RefCell<FxHashMap<ObjectHandle, ObjectHandle>>,
    interfaces: RefCell<FxHashMap<ObjectHandle, ObjectHandle>>,
    security_stack: RefCell<Vec<SecurityFrame>>,
    exception_map: RefCell<FxHashMap<ObjectHandle, ErrorKind>>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform")
            .field("descriptor", &self.descriptor)
            .field("global", &self.global)
            .field("realm", &self.realm)
            .field("security_stack", &self.security_stack.borrow())
            .finish()
    }
}

impl Platform {
    /// Wrap a platform descriptor.
    ///
    /// The descriptor's `global` must be an object. The inner realm's current
    /// token is captured as the unlock token, and a private lock token is
    /// allocated in the inner realm.
    pub fn new(
        host: &dyn HostRuntime,
        descriptor: ObjectHandle,
        config: &GateConfig,
    ) -> GateResult<Rc<Self>> {
        let realm = resolve_platform_realm(host, descriptor, RealmResolution::Strict)?;
        let global = host.realm_global(realm);
        let unlock_token = security::get_security_token(host, &HostValue::Object(global))?;
        let lock_token = HostValue::Object(host.new_object(realm, None)?);

        // Built-in error prototypes of the realm holding the descriptor.
        let outer = host.creation_realm(descriptor);
        let mut exception_map = FxHashMap::default();
        if outer != realm {
            for kind in ErrorKind::ALL {
                if let HostValue::Object(sample) = host.new_error(outer, kind, "")? {
                    if let Some(prototype) = host.prototype_of(sample)? {
                        exception_map.insert(prototype, kind);
                    }
                }
            }
        }
        Ok(Rc::new(Self {
            descriptor,
            global,
            realm,
            default_allow_new: config.functions.default_allow_new,
            lock_token,
            unlock_token,
            implementations: RefCell::new(FxHashMap::default()),
            interfaces: RefCell::new(FxHashMap::default()),
            security_stack: RefCell::new(Vec::new()),
            exception_map: RefCell::new(exception_map),
        }))
    }

    /// Descriptor object
    pub fn descriptor(&self) -> ObjectHandle {
        self.descriptor
    }

    /// Descriptor object as a value
    pub fn value(&self) -> HostValue {
        HostValue::Object(self.descriptor)
    }

    /// Inner realm's global object
    pub fn global(&self) -> ObjectHandle {
        self.global
    }

    /// Inner realm
    pub fn realm(&self) -> RealmId {
        self.realm
    }

    // ===== Interface/implementation association =====

    /// Associate `interface` with `implementation`.
    ///
    /// Re-associating the same pair is a no-op. Either side already bound to
    /// something else is an error.
    pub fn set_implementation(&self, interface: &HostValue, implementation: &HostValue) -> GateResult<()> {
        let interface_object = interface
            .as_object()
            .ok_or_else(|| GateError::argument_type("interface", "object", interface))?;
        let implementation_object = implementation
            .as_object()
            .ok_or_else(|| GateError::argument_type("implementation", "object", implementation))?;

        if let Some(existing) = self.own_implementation_of(interface) {
            if existing == implementation_object {
                return Ok(());
            }
            return Err(GateError::Association(
                "interfaceObject: already has an implementation".to_string(),
            ));
        }
        if let Some(existing) = self.own_interface_of(implementation) {
            if existing == interface_object {
                return Ok(());
            }
            return Err(GateError::Association(
                "implementationObject: already has an interface".to_string(),
            ));
        }
        self.implementations
            .borrow_mut()
            .insert(interface_object, implementation_object);
        self.interfaces
            .borrow_mut()
            .insert(implementation_object, interface_object);
        Ok(())
    }

    /// Implementation bound directly to `value`
    pub fn own_implementation_of(&self, value: &HostValue) -> Option<ObjectHandle> {
        let object = value.as_object()?;
        self.implementations.borrow().get(&object).copied()
    }

    /// Interface bound directly to `value`
    pub fn own_interface_of(&self, value: &HostValue) -> Option<ObjectHandle> {
        let object = value.as_object()?;
        self.interfaces.borrow().get(&object).copied()
    }

    /// Implementation of `value` or of the nearest prototype that has one
    pub fn implementation_of(
        &self,
        host: &dyn HostRuntime,
        value: &HostValue,
    ) -> GateResult<Option<ObjectHandle>> {
        self.walk(host, value, &self.implementations)
    }

    /// Interface of `value` or of the nearest prototype that has one
    pub fn interface_of(
        &self,
        host: &dyn HostRuntime,
        value: &HostValue,
    ) -> GateResult<Option<ObjectHandle>> {
        self.walk(host, value, &self.interfaces)
    }

    /// Check for a direct implementation
    pub fn has_own_implementation(&self, value: &HostValue) -> bool {
        self.own_implementation_of(value).is_some()
    }

    /// Check for a direct interface
    pub fn has_own_interface(&self, value: &HostValue) -> bool {
        self.own_interface_of(value).is_some()
    }

    /// Check for an implementation along the prototype chain
    pub fn has_implementation(&self, host: &dyn HostRuntime, value: &HostValue) -> GateResult<bool> {
        Ok(self.implementation_of(host, value)?.is_some())
    }

    /// Check for an interface along the prototype chain
    pub fn has_interface(&self, host: &dyn HostRuntime, value: &HostValue) -> GateResult<bool> {
        Ok(self.interface_of(host, value)?.is_some())
    }

    /// Drop the association of interface `value`
    pub fn remove_implementation_of(&self, value: &HostValue) {
        let Some(interface) = value.as_object() else {
            return;
        };
        if let Some(implementation) = self.implementations.borrow_mut().remove(&interface) {
            self.interfaces.borrow_mut().remove(&implementation);
        }
    }

    /// Drop the association of implementation `value`
    pub fn remove_interface_of(&self, value: &HostValue) {
        let Some(implementation) = value.as_object() else {
            return;
        };
        if let Some(interface) = self.interfaces.borrow_mut().remove(&implementation) {
            self.implementations.borrow_mut().remove(&interface);
        }
    }

    fn walk(
        &self,
        host: &dyn HostRuntime,
        value: &HostValue,
        map: &RefCell<FxHashMap<ObjectHandle, ObjectHandle>>,
    ) -> GateResult<Option<ObjectHandle>> {
        let mut current = value.as_object();
        while let Some(object) = current {
            if let Some(found) = map.borrow().get(&object).copied() {
                return Ok(Some(found));
            }
            current = host.prototype_of(object)?;
        }
        Ok(None)
    }

    // ===== Lock stack =====

    /// Push (or re-enter) a lock frame
    pub fn enter_lock(&self, host: &dyn HostRuntime) -> GateResult<()> {
        self.enter(host, LockState::Locked)
    }

    /// Leave the innermost lock frame
    pub fn leave_lock(&self, host: &dyn HostRuntime) -> GateResult<()> {
        self.leave(host, LockState::Locked)
    }

    /// Push (or re-enter) an unlock frame
    pub fn enter_unlock(&self, host: &dyn HostRuntime) -> GateResult<()> {
        self.enter(host, LockState::Unlocked)
    }

    /// Leave the innermost unlock frame
    pub fn leave_unlock(&self, host: &dyn HostRuntime) -> GateResult<()> {
        self.leave(host, LockState::Unlocked)
    }

    /// State installed by the innermost frame (`Unlocked` when the stack is empty)
    pub fn lock_state(&self) -> LockState {
        self.security_stack
            .borrow()
            .last()
            .map(|frame| frame.state)
            .unwrap_or(LockState::Unlocked)
    }

    /// Check if the lock token is installed
    pub fn is_locked(&self) -> bool {
        self.lock_state() == LockState::Locked
    }

    /// Number of frames on the lock stack
    pub fn security_depth(&self) -> usize {
        self.security_stack.borrow().len()
    }

    fn enter(&self, host: &dyn HostRuntime, state: LockState) -> GateResult<()> {
        let pushed = {
            let mut stack = self.security_stack.borrow_mut();
            match stack.last_mut() {
                Some(frame) if frame.state == state => {
                    frame.refs += 1;
                    false
                }
                _ => {
                    stack.push(SecurityFrame { state, refs: 1 });
                    true
                }
            }
        };
        trace!(?state, pushed, depth = self.security_depth(), "enter security frame");
        if pushed {
            self.install(host, state)?;
        }
        Ok(())
    }

    fn leave(&self, host: &dyn HostRuntime, state: LockState) -> GateResult<()> {
        let restore = {
            let mut stack = self.security_stack.borrow_mut();
            let frame = match stack.last_mut() {
                Some(frame) if frame.state == state => frame,
                _ => {
                    return Err(match state {
                        LockState::Locked => LockError::NotLocked,
                        LockState::Unlocked => LockError::NotUnlocked,
                    }
                    .into())
                }
            };
            frame.refs -= 1;
            if frame.refs == 0 {
                stack.pop();
                Some(stack.last().map(|frame| frame.state).unwrap_or(LockState::Unlocked))
            } else {
                None
            }
        };
        trace!(?state, depth = self.security_depth(), "leave security frame");
        match restore {
            Some(next) if next != state => self.install(host, next),
            _ => Ok(()),
        }
    }

    fn install(&self, host: &dyn HostRuntime, state: LockState) -> GateResult<()> {
        let token = match state {
            LockState::Locked => self.lock_token.clone(),
            LockState::Unlocked => self.unlock_token.clone(),
        };
        security::set_security_token(host, &HostValue::Object(self.global), token)?;
        Ok(())
    }

    // ===== Exception translation =====

    /// Translate errors whose prototype is `prototype` into inner-realm `kind` errors
    pub fn map_exception(&self, prototype: ObjectHandle, kind: ErrorKind) {
        self.exception_map.borrow_mut().insert(prototype, kind);
    }

    /// Make an exception raised outside the inner realm safe to rethrow into it.
    ///
    /// Primitives and inner-realm objects pass through. An implementation is
    /// replaced by its interface, repeatedly. A mapped error becomes a fresh
    /// inner-realm error with the same message, associated with the original
    /// as its implementation. Anything else passes through.
    pub fn translate_exception(
        &self,
        host: &dyn HostRuntime,
        exception: HostValue,
    ) -> GateResult<HostValue> {
        let Some(object) = exception.as_object() else {
            return Ok(exception);
        };
        if host.creation_realm(object) == self.realm {
            return Ok(exception);
        }
        if self.has_own_interface(&exception) {
            let mut current = object;
            while let Some(interface) = self.own_interface_of(&HostValue::Object(current)) {
                if interface == object {
                    break;
                }
                current = interface;
            }
            return Ok(HostValue::Object(current));
        }
        let kind = match host.prototype_of(object)? {
            Some(prototype) => self.exception_map.borrow().get(&prototype).copied(),
            None => None,
        };
        let Some(kind) = kind else {
            return Ok(exception);
        };
        let message = host.get(object, &PropertyKey::named("message"))?;
        let translated = host.new_error(self.realm, kind, message.as_str().unwrap_or(""))?;
        self.set_implementation(&translated, &exception)?;
        trace!(kind = kind.name(), "translated exception");
        Ok(translated)
    }

    /// Call `callee(platform, ...args)` inside an unlock frame.
    ///
    /// A thrown exception is passed through [`Platform::translate_exception`].
    /// The unlock frame is left on every exit except a host termination.
    pub fn execute_locked(
        &self,
        host: &dyn HostRuntime,
        callee: ObjectHandle,
        args: &[HostValue],
    ) -> GateResult<HostValue> {
        self.enter_unlock(host)?;
        let mut call_args = Vec::with_capacity(args.len() + 1);
        call_args.push(self.value());
        call_args.extend_from_slice(args);
        let outcome: HostResult<HostValue> =
            host.call(host.creation_realm(callee), callee, HostValue::Undefined, &call_args);
        let result = match outcome {
            Ok(value) => Ok(value),
            Err(Exception::Thrown(exception)) => match self.translate_exception(host, exception) {
                Ok(translated) => Err(GateError::Exception(translated)),
                Err(err) => Err(err),
            },
            Err(signal @ Exception::Terminated(_)) => return Err(signal.into()),
        };
        self.leave_unlock(host)?;
        result
    }

    // ===== Convenience constructors =====

    /// Create a trampoline bound to this platform
    pub fn function(
        &self,
        host: &dyn HostRuntime,
        implementation: ObjectHandle,
        options: FunctionOptions,
    ) -> GateResult<ObjectHandle> {
        let mut native = NativeFunctionOptions::new(self.descriptor, implementation)
            .hooks(options.hooks)
            .length(options.length)
            .allow_new(options.allow_new.unwrap_or(self.default_allow_new));
        native.context_prototype = options.context_prototype;
        native.name = options.name;
        create_native_function(host, native)
    }

    /// Install a lazy data property whose attributes are given directly
    pub fn lazy_property(
        &self,
        host: &dyn HostRuntime,
        receiver: ObjectHandle,
        name: PropertyKey,
        getter: ObjectHandle,
        attributes: PropertyAttributes,
    ) -> GateResult<ObjectHandle> {
        let options = LazyDataPropertyOptions::new(receiver, name, self.descriptor, getter)
            .configurable(!attributes.contains(PropertyAttributes::DONT_DELETE))
            .enumerable(!attributes.contains(PropertyAttributes::DONT_ENUM))
            .writable(!attributes.contains(PropertyAttributes::READ_ONLY));
        create_lazy_data_property(host, options)
    }
}
