//! HostRuntime trait: abstract engine operations
//!
//! Defines the interface a host script engine implements so the boundary code
//! can create realm-crossing functions and lazy properties without depending on
//! engine internals. The reference in-memory implementation lives in
//! `realmgate-core`.

use std::fmt;
use std::rc::Rc;

use crate::attributes::{ConstructorBehavior, PropertyAttributes};
use crate::error::{ErrorKind, HostResult};
use crate::value::{HostValue, ObjectHandle, PropertyKey, RealmId};

/// Per-invocation data handed to a native callback.
#[derive(Debug, Clone)]
pub struct CallInfo {
    /// The function object being invoked
    pub callee: ObjectHandle,
    /// Call receiver
    pub this: HostValue,
    /// Call arguments, in order
    pub args: Vec<HostValue>,
    /// Present only for constructor-style invocation
    pub new_target: Option<ObjectHandle>,
}

impl CallInfo {
    /// Argument at `index`, or `undefined` past the end
    pub fn arg(&self, index: usize) -> HostValue {
        self.args.get(index).cloned().unwrap_or_default()
    }

    /// Number of arguments actually passed
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Check if no arguments were passed
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// `newTarget` as a value (`undefined` for plain calls)
    pub fn new_target_value(&self) -> HostValue {
        self.new_target.map(HostValue::Object).unwrap_or_default()
    }
}

/// Native function body. Whatever the closure captures is the function's bound data.
pub type NativeCallback = Rc<dyn Fn(&dyn HostRuntime, &CallInfo) -> HostResult<HostValue>>;

/// Data handed to a lazy property getter on first access.
#[derive(Debug, Clone)]
pub struct LazyAccess {
    /// The object the property was read through
    pub holder: HostValue,
    /// Property being materialized
    pub key: PropertyKey,
    /// Whether a failed write in the accessing realm raises (strict mode)
    pub should_throw: bool,
}

/// Lazy data property getter
pub type LazyGetter = Rc<dyn Fn(&dyn HostRuntime, &LazyAccess) -> HostResult<HostValue>>;

/// Description of a native function to create
#[derive(Clone)]
pub struct FunctionSpec {
    /// Body
    pub callback: NativeCallback,
    /// Display name (`name` property)
    pub name: Option<Rc<str>>,
    /// Arity metadata (`length` property)
    pub length: u32,
    /// Behavior when invoked with `new`
    pub constructor: ConstructorBehavior,
}

impl FunctionSpec {
    /// Create a non-constructible, anonymous, zero-arity spec
    pub fn new(callback: NativeCallback) -> Self {
        Self {
            callback,
            name: None,
            length: 0,
            constructor: ConstructorBehavior::Throw,
        }
    }

    /// Set the display name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(Rc::from(name));
        self
    }

    /// Set the arity metadata
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = length;
        self
    }

    /// Set constructor behavior
    pub fn with_constructor(mut self, constructor: ConstructorBehavior) -> Self {
        self.constructor = constructor;
        self
    }
}

impl fmt::Debug for FunctionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSpec")
            .field("name", &self.name)
            .field("length", &self.length)
            .field("constructor", &self.constructor)
            .finish()
    }
}

/// Abstract host engine.
///
/// All methods take `&self`: implementations are single-threaded and must
/// tolerate re-entrant calls from inside native callbacks.
pub trait HostRuntime {
    // ========================================================================
    // Realms
    // ========================================================================

    /// The realm that created `object`. Fixed for the object's lifetime.
    fn creation_realm(&self, object: ObjectHandle) -> RealmId;

    /// The global object of `realm`
    fn realm_global(&self, realm: RealmId) -> ObjectHandle;

    /// The realm of the innermost running frame
    fn current_realm(&self) -> RealmId;

    /// Whether code in `realm` runs in strict mode
    fn is_strict(&self, realm: RealmId) -> bool;

    // ========================================================================
    // Objects
    // ========================================================================

    /// Allocate an ordinary object with the given prototype (`None` = null prototype)
    fn new_object(&self, realm: RealmId, prototype: Option<ObjectHandle>) -> HostResult<ObjectHandle>;

    /// Allocate an array holding `items`
    fn new_array(&self, realm: RealmId, items: &[HostValue]) -> HostResult<ObjectHandle>;

    /// Read an array's elements (`length` entries, holes read as `undefined`)
    fn array_elements(&self, array: ObjectHandle) -> HostResult<Vec<HostValue>>;

    /// Instantiate a built-in error of `realm`
    fn new_error(&self, realm: RealmId, kind: ErrorKind, message: &str) -> HostResult<HostValue>;

    /// Get an object's prototype
    fn prototype_of(&self, object: ObjectHandle) -> HostResult<Option<ObjectHandle>>;

    /// Property read (walks the prototype chain)
    fn get(&self, object: ObjectHandle, key: &PropertyKey) -> HostResult<HostValue>;

    /// Property write. Returns `false` when a sloppy-mode write was ignored.
    fn set(&self, object: ObjectHandle, key: &PropertyKey, value: HostValue) -> HostResult<bool>;

    /// Define an own data property
    fn define_property(
        &self,
        object: ObjectHandle,
        key: &PropertyKey,
        value: HostValue,
        attributes: PropertyAttributes,
    ) -> HostResult<()>;

    /// Delete an own property. Returns `false` if it is not configurable.
    fn delete(&self, object: ObjectHandle, key: &PropertyKey) -> HostResult<bool>;

    /// Check for an own property
    fn has_own_property(&self, object: ObjectHandle, key: &PropertyKey) -> HostResult<bool>;

    /// Own property attributes, if the property exists
    fn property_attributes(
        &self,
        object: ObjectHandle,
        key: &PropertyKey,
    ) -> HostResult<Option<PropertyAttributes>>;

    // ========================================================================
    // Callables
    // ========================================================================

    /// Check if a value can be called
    fn is_callable(&self, value: &HostValue) -> bool;

    /// Create a native function rooted in `realm`
    fn new_function(&self, realm: RealmId, spec: FunctionSpec) -> HostResult<ObjectHandle>;

    /// Call `callee` with `realm` entered
    fn call(
        &self,
        realm: RealmId,
        callee: ObjectHandle,
        this: HostValue,
        args: &[HostValue],
    ) -> HostResult<HostValue>;

    /// Invoke `callee` as a constructor
    fn construct(
        &self,
        callee: ObjectHandle,
        args: &[HostValue],
        new_target: Option<ObjectHandle>,
    ) -> HostResult<HostValue>;

    // ========================================================================
    // Security tokens
    // ========================================================================

    /// Current security token of `realm`
    fn security_token(&self, realm: RealmId) -> HostValue;

    /// Install a new security token on `realm`
    fn set_security_token(&self, realm: RealmId, token: HostValue);

    /// Restore the realm's implementation-default token
    fn use_default_security_token(&self, realm: RealmId);

    // ========================================================================
    // Lazy properties
    // ========================================================================

    /// Register a data property whose value is produced by `getter` on first read
    fn define_lazy_property(
        &self,
        realm: RealmId,
        object: ObjectHandle,
        key: &PropertyKey,
        getter: LazyGetter,
        attributes: PropertyAttributes,
    ) -> HostResult<()>;
}
