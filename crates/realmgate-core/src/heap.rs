//! In-memory host runtime
//!
//! `Heap` owns a realm arena and an object arena and implements
//! [`HostRuntime`] on top of them. It is single-threaded: state lives behind a
//! `RefCell` and no borrow is ever held while a native callback or lazy getter
//! runs, so callbacks may re-enter the heap freely.
//!
//! Handles are arena indices. Passing a handle produced by a different heap is a
//! programming error and panics on lookup.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use realmgate_sdk::{
    CallInfo, ConstructorBehavior, ErrorKind, Exception, FunctionSpec, HostResult, HostRuntime,
    HostValue, LazyAccess, LazyGetter, NativeCallback, ObjectHandle, PropertyAttributes,
    PropertyKey, RealmId, Termination,
};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::object::{FunctionRecord, ObjectKind, ObjectRecord, Slot};
use crate::realm::{Intrinsics, RealmInfo, RealmOptions, RealmRecord};

/// Largest length an array may have (`2^32 - 1`)
pub const MAX_ARRAY_LENGTH: u64 = u32::MAX as u64;

/// Resource limits for a heap
#[derive(Debug, Clone)]
pub struct ResourceLimits {
    /// Maximum number of nested realm frames before a `RangeError`
    pub max_call_depth: usize,

    /// Maximum number of live objects (None = unlimited). Exceeding it terminates execution.
    pub max_objects: Option<usize>,

    /// Maximum dense array length. Growing past it raises a `RangeError`.
    pub max_array_length: usize,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_call_depth: 1024,
            max_objects: None,
            max_array_length: 1 << 24,
        }
    }
}

impl ResourceLimits {
    /// Create unlimited resource limits
    pub fn unlimited() -> Self {
        Self {
            max_call_depth: usize::MAX,
            max_objects: None,
            max_array_length: MAX_ARRAY_LENGTH as usize,
        }
    }

    /// Create resource limits with an object budget
    pub fn with_object_limit(max_objects: usize) -> Self {
        Self {
            max_objects: Some(max_objects),
            ..Default::default()
        }
    }

    /// Create resource limits with a dense array length limit
    pub fn with_array_length(max_array_length: usize) -> Self {
        Self {
            max_array_length,
            ..Default::default()
        }
    }

    /// Create resource limits with a call depth limit
    pub fn with_call_depth(max_call_depth: usize) -> Self {
        Self {
            max_call_depth,
            ..Default::default()
        }
    }
}

/// Options for creating a heap
#[derive(Debug, Clone, Default)]
pub struct HeapOptions {
    /// Resource limits
    pub limits: ResourceLimits,
}

struct HeapState {
    realms: Vec<RealmRecord>,
    objects: Vec<ObjectRecord>,
    /// Entered realms, innermost last
    frames: Vec<RealmId>,
}

impl HeapState {
    fn object(&self, handle: ObjectHandle) -> &ObjectRecord {
        &self.objects[handle.as_u32() as usize]
    }

    fn object_mut(&mut self, handle: ObjectHandle) -> &mut ObjectRecord {
        &mut self.objects[handle.as_u32() as usize]
    }

    fn realm(&self, realm: RealmId) -> &RealmRecord {
        &self.realms[realm.as_u32() as usize]
    }

    fn realm_mut(&mut self, realm: RealmId) -> &mut RealmRecord {
        &mut self.realms[realm.as_u32() as usize]
    }

    fn current(&self) -> RealmId {
        self.frames.last().copied().unwrap_or(RealmId::from_raw(0))
    }

    fn push(&mut self, record: ObjectRecord) -> ObjectHandle {
        let handle = ObjectHandle::from_raw(self.objects.len() as u32);
        self.objects.push(record);
        handle
    }

    fn alloc(&mut self, record: ObjectRecord, limit: Option<usize>) -> HostResult<ObjectHandle> {
        if let Some(max) = limit {
            if self.objects.len() >= max {
                return Err(Exception::Terminated(Termination::OutOfMemory));
            }
        }
        Ok(self.push(record))
    }
}

enum Lookup {
    Next(ObjectHandle),
    Lazy(LazyGetter, RealmId),
}

enum WriteOutcome {
    Pending,
    Written,
    Rejected,
    InvalidLength,
    TooLarge,
}

/// Validate a new array length: an integer in `0..=2^32-1`, within the dense limit
fn array_length(value: &HostValue, limit: usize) -> Result<usize, WriteOutcome> {
    match value.as_number() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= MAX_ARRAY_LENGTH as f64 => {
            if n > limit as f64 {
                Err(WriteOutcome::TooLarge)
            } else {
                Ok(n as usize)
            }
        }
        _ => Err(WriteOutcome::InvalidLength),
    }
}

/// Store `value` at `index`, growing the dense storage up to `limit` elements
fn write_element(
    items: &mut Vec<HostValue>,
    index: usize,
    value: HostValue,
    limit: usize,
) -> WriteOutcome {
    if index >= limit {
        return WriteOutcome::TooLarge;
    }
    if index >= items.len() {
        items.resize(index + 1, HostValue::Undefined);
    }
    items[index] = value;
    WriteOutcome::Written
}

fn is_length(key: &PropertyKey) -> bool {
    matches!(key, PropertyKey::String(s) if &**s == "length")
}

fn hidden_data(value: HostValue) -> Slot {
    Slot::Data {
        value,
        attributes: PropertyAttributes::DONT_ENUM,
    }
}

/// Scope guard for entered realms; leaving the scope pops them.
pub struct RealmScope<'a> {
    heap: &'a Heap,
    depth: usize,
}

impl Drop for RealmScope<'_> {
    fn drop(&mut self) {
        self.heap.state.borrow_mut().frames.truncate(self.depth);
    }
}

/// Reference host runtime
pub struct Heap {
    state: RefCell<HeapState>,
    limits: ResourceLimits,
    terminating: Cell<bool>,
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl Heap {
    /// Create a heap with default options
    pub fn new() -> Self {
        Self::with_options(HeapOptions::default())
    }

    /// Create a heap with specific options
    pub fn with_options(options: HeapOptions) -> Self {
        Self {
            state: RefCell::new(HeapState {
                realms: Vec::new(),
                objects: Vec::new(),
                frames: Vec::new(),
            }),
            limits: options.limits,
            terminating: Cell::new(false),
        }
    }

    /// Get resource limits
    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    // ===== Realm lifecycle =====

    /// Create a realm with its global object and intrinsics.
    ///
    /// The first realm created is the one considered current when no frame is entered.
    pub fn create_realm(&self, options: RealmOptions) -> RealmId {
        let mut state = self.state.borrow_mut();
        let id = RealmId::from_raw(state.realms.len() as u32);

        let object_prototype = state.push(ObjectRecord::new(id, None, ObjectKind::Ordinary));
        let function_prototype = state.push(ObjectRecord::new(
            id,
            Some(object_prototype),
            ObjectKind::Ordinary,
        ));
        let array_prototype = state.push(ObjectRecord::new(
            id,
            Some(object_prototype),
            ObjectKind::Ordinary,
        ));

        let mut error_prototypes = FxHashMap::default();
        let mut base_error = object_prototype;
        for kind in ErrorKind::ALL {
            let parent = if kind == ErrorKind::Error {
                object_prototype
            } else {
                base_error
            };
            let mut record = ObjectRecord::new(id, Some(parent), ObjectKind::Ordinary);
            record.insert(PropertyKey::named("name"), hidden_data(HostValue::string(kind.name())));
            record.insert(PropertyKey::named("message"), hidden_data(HostValue::string("")));
            let prototype = state.push(record);
            if kind == ErrorKind::Error {
                base_error = prototype;
            }
            error_prototypes.insert(kind, prototype);
        }

        let global = state.push(ObjectRecord::new(id, Some(object_prototype), ObjectKind::Global));
        let intrinsics = Intrinsics {
            object_prototype,
            function_prototype,
            array_prototype,
            error_prototypes,
        };
        debug!(realm = %id, name = %options.name, strict = options.strict, "realm created");
        state.realms.push(RealmRecord::new(options, global, intrinsics));
        id
    }

    /// Describe a realm
    pub fn realm_info(&self, realm: RealmId) -> RealmInfo {
        let state = self.state.borrow();
        let record = state.realm(realm);
        RealmInfo {
            id: realm,
            name: record.name.clone(),
            strict: record.strict,
            global: record.global,
        }
    }

    /// Number of realms
    pub fn realm_count(&self) -> usize {
        self.state.borrow().realms.len()
    }

    /// `Object.prototype` of a realm
    pub fn object_prototype(&self, realm: RealmId) -> ObjectHandle {
        self.state.borrow().realm(realm).intrinsics.object_prototype
    }

    /// Enter `realm` until the returned scope is dropped
    pub fn enter_realm(&self, realm: RealmId) -> HostResult<RealmScope<'_>> {
        self.enter(&[realm])
    }

    fn enter(&self, realms: &[RealmId]) -> HostResult<RealmScope<'_>> {
        let mut state = self.state.borrow_mut();
        let depth = state.frames.len();
        if depth.saturating_add(realms.len()) > self.limits.max_call_depth {
            let current = state.current();
            drop(state);
            return Err(self.throw_error(
                current,
                ErrorKind::RangeError,
                "Maximum call stack size exceeded",
            ));
        }
        state.frames.extend_from_slice(realms);
        Ok(RealmScope { heap: self, depth })
    }

    // ===== Termination =====

    /// Request termination: every subsequent call fails with an uncatchable signal
    pub fn terminate_execution(&self) {
        debug!("execution termination requested");
        self.terminating.set(true);
    }

    /// Clear a pending termination request
    pub fn cancel_termination(&self) {
        self.terminating.set(false);
    }

    /// Check if termination is pending
    pub fn is_terminating(&self) -> bool {
        self.terminating.get()
    }

    fn check_termination(&self) -> HostResult<()> {
        if self.terminating.get() {
            Err(Exception::Terminated(Termination::Forced))
        } else {
            Ok(())
        }
    }

    // ===== Convenience =====

    /// Build a thrown error of `kind` in `realm`
    pub fn throw_error(&self, realm: RealmId, kind: ErrorKind, message: &str) -> Exception {
        match self.new_error(realm, kind, message) {
            Ok(error) => Exception::Thrown(error),
            Err(exception) => exception,
        }
    }

    /// Create a native function from a closure
    pub fn new_native_function<F>(
        &self,
        realm: RealmId,
        name: &str,
        length: u32,
        body: F,
    ) -> HostResult<ObjectHandle>
    where
        F: Fn(&dyn HostRuntime, &CallInfo) -> HostResult<HostValue> + 'static,
    {
        let callback: NativeCallback = Rc::new(body);
        self.new_function(
            realm,
            FunctionSpec::new(callback).with_name(name).with_length(length),
        )
    }

    /// Own property keys in insertion order (array elements first)
    pub fn own_keys(&self, object: ObjectHandle, enumerable_only: bool) -> Vec<PropertyKey> {
        let state = self.state.borrow();
        let record = state.object(object);
        let mut keys = Vec::new();
        if let ObjectKind::Array(items) = &record.kind {
            keys.extend((0..items.len()).map(PropertyKey::index));
        }
        keys.extend(
            record
                .properties
                .iter()
                .filter(|(_, slot)| !enumerable_only || slot.attributes().is_enumerable())
                .map(|(key, _)| key.clone()),
        );
        keys
    }

    /// Whether an own property is still waiting for its lazy getter
    pub fn is_lazy_pending(&self, object: ObjectHandle, key: &PropertyKey) -> bool {
        matches!(
            self.state.borrow().object(object).slot(key),
            Some(Slot::Lazy { .. })
        )
    }

    /// Number of live objects
    pub fn object_count(&self) -> usize {
        self.state.borrow().objects.len()
    }

    // ===== Internals =====

    fn check_access(&self, object: ObjectHandle) -> HostResult<()> {
        let (denied, current) = {
            let state = self.state.borrow();
            let record = state.object(object);
            let current = state.current();
            let denied = matches!(record.kind, ObjectKind::Global)
                && record.realm != current
                && !state
                    .realm(record.realm)
                    .token
                    .same_value(&state.realm(current).token);
            (denied, current)
        };
        if denied {
            trace!(object = %object, realm = %current, "cross-realm access denied");
            return Err(self.throw_error(current, ErrorKind::TypeError, "no access"));
        }
        Ok(())
    }

    fn function_name(&self, callee: ObjectHandle) -> String {
        let state = self.state.borrow();
        match state.object(callee).slot(&PropertyKey::named("name")) {
            Some(Slot::Data {
                value: HostValue::String(name),
                ..
            }) if !name.is_empty() => name.to_string(),
            _ => "anonymous".to_string(),
        }
    }

    fn array_length_error(&self, realm: RealmId, outcome: WriteOutcome) -> Exception {
        let message = match outcome {
            WriteOutcome::TooLarge => "Array length exceeds heap limit",
            _ => "Invalid array length",
        };
        self.throw_error(realm, ErrorKind::RangeError, message)
    }

    fn write_slot(&self, object: ObjectHandle, key: &PropertyKey, value: HostValue) -> WriteOutcome {
        let mut state = self.state.borrow_mut();
        let record = state.object_mut(object);
        let writable = record.slot(key).map(|slot| slot.attributes().is_writable());
        match writable {
            Some(false) => WriteOutcome::Rejected,
            Some(true) => {
                if let Some(slot) = record.slot_mut(key) {
                    let attributes = slot.attributes();
                    *slot = Slot::Data { value, attributes };
                }
                WriteOutcome::Written
            }
            None => {
                record.properties.push((
                    key.clone(),
                    Slot::Data {
                        value,
                        attributes: PropertyAttributes::NONE,
                    },
                ));
                WriteOutcome::Written
            }
        }
    }

    fn materialize(
        &self,
        holder: ObjectHandle,
        receiver: ObjectHandle,
        key: &PropertyKey,
        getter: LazyGetter,
        realm: RealmId,
    ) -> HostResult<HostValue> {
        let should_throw = self.is_strict(self.current_realm());
        let access = LazyAccess {
            holder: HostValue::Object(receiver),
            key: key.clone(),
            should_throw,
        };
        let value = {
            let _scope = self.enter(&[realm])?;
            getter(self, &access)?
        };
        let mut state = self.state.borrow_mut();
        if let Some(slot) = state.object_mut(holder).slot_mut(key) {
            // The getter may have redefined the property itself.
            if matches!(slot, Slot::Lazy { .. }) {
                let attributes = slot.attributes();
                *slot = Slot::Data {
                    value: value.clone(),
                    attributes,
                };
            }
        }
        Ok(value)
    }
}

impl HostRuntime for Heap {
    fn creation_realm(&self, object: ObjectHandle) -> RealmId {
        self.state.borrow().object(object).realm
    }

    fn realm_global(&self, realm: RealmId) -> ObjectHandle {
        self.state.borrow().realm(realm).global
    }

    fn current_realm(&self) -> RealmId {
        self.state.borrow().current()
    }

    fn is_strict(&self, realm: RealmId) -> bool {
        self.state.borrow().realm(realm).strict
    }

    fn new_object(&self, realm: RealmId, prototype: Option<ObjectHandle>) -> HostResult<ObjectHandle> {
        self.state.borrow_mut().alloc(
            ObjectRecord::new(realm, prototype, ObjectKind::Ordinary),
            self.limits.max_objects,
        )
    }

    fn new_array(&self, realm: RealmId, items: &[HostValue]) -> HostResult<ObjectHandle> {
        let mut state = self.state.borrow_mut();
        let prototype = state.realm(realm).intrinsics.array_prototype;
        state.alloc(
            ObjectRecord::new(realm, Some(prototype), ObjectKind::Array(items.to_vec())),
            self.limits.max_objects,
        )
    }

    fn array_elements(&self, array: ObjectHandle) -> HostResult<Vec<HostValue>> {
        let elements = {
            let state = self.state.borrow();
            match &state.object(array).kind {
                ObjectKind::Array(items) => Some(items.clone()),
                _ => None,
            }
        };
        match elements {
            Some(items) => Ok(items),
            None => Err(self.throw_error(
                self.current_realm(),
                ErrorKind::TypeError,
                &format!("{} is not an array", array),
            )),
        }
    }

    fn new_error(&self, realm: RealmId, kind: ErrorKind, message: &str) -> HostResult<HostValue> {
        let mut state = self.state.borrow_mut();
        let prototype = state.realm(realm).error_prototype(kind);
        let mut record = ObjectRecord::new(realm, Some(prototype), ObjectKind::Error);
        record.insert(PropertyKey::named("message"), hidden_data(HostValue::string(message)));
        let handle = state.alloc(record, self.limits.max_objects)?;
        Ok(HostValue::Object(handle))
    }

    fn prototype_of(&self, object: ObjectHandle) -> HostResult<Option<ObjectHandle>> {
        Ok(self.state.borrow().object(object).prototype)
    }

    fn get(&self, object: ObjectHandle, key: &PropertyKey) -> HostResult<HostValue> {
        self.check_access(object)?;
        let mut current = object;
        loop {
            let step = {
                let state = self.state.borrow();
                let record = state.object(current);
                if let ObjectKind::Array(items) = &record.kind {
                    if let Some(index) = key.as_index() {
                        return Ok(items.get(index).cloned().unwrap_or_default());
                    }
                    if is_length(key) {
                        return Ok(HostValue::Number(items.len() as f64));
                    }
                }
                match record.slot(key) {
                    Some(Slot::Data { value, .. }) => return Ok(value.clone()),
                    Some(Slot::Lazy { getter, realm, .. }) => Lookup::Lazy(getter.clone(), *realm),
                    None => match record.prototype {
                        Some(prototype) => Lookup::Next(prototype),
                        None => return Ok(HostValue::Undefined),
                    },
                }
            };
            match step {
                Lookup::Next(prototype) => current = prototype,
                Lookup::Lazy(getter, realm) => {
                    return self.materialize(current, object, key, getter, realm)
                }
            }
        }
    }

    fn set(&self, object: ObjectHandle, key: &PropertyKey, value: HostValue) -> HostResult<bool> {
        self.check_access(object)?;
        let outcome = {
            let mut state = self.state.borrow_mut();
            let record = state.object_mut(object);
            let limit = self.limits.max_array_length;
            match &mut record.kind {
                ObjectKind::Array(items) => match key.as_index() {
                    Some(index) => write_element(items, index, value.clone(), limit),
                    None if is_length(key) => match array_length(&value, limit) {
                        Ok(length) => {
                            items.resize(length, HostValue::Undefined);
                            WriteOutcome::Written
                        }
                        Err(outcome) => outcome,
                    },
                    None => WriteOutcome::Pending,
                },
                _ => WriteOutcome::Pending,
            }
        };
        let outcome = match outcome {
            WriteOutcome::Pending => self.write_slot(object, key, value),
            other => other,
        };
        let realm = self.current_realm();
        match outcome {
            WriteOutcome::Written | WriteOutcome::Pending => Ok(true),
            WriteOutcome::InvalidLength | WriteOutcome::TooLarge => {
                Err(self.array_length_error(realm, outcome))
            }
            WriteOutcome::Rejected => {
                if self.is_strict(realm) {
                    Err(self.throw_error(
                        realm,
                        ErrorKind::TypeError,
                        &format!("Cannot assign to read only property '{}' of object", key),
                    ))
                } else {
                    Ok(false)
                }
            }
        }
    }

    fn define_property(
        &self,
        object: ObjectHandle,
        key: &PropertyKey,
        value: HostValue,
        attributes: PropertyAttributes,
    ) -> HostResult<()> {
        self.check_access(object)?;
        let outcome = {
            let mut state = self.state.borrow_mut();
            let record = state.object_mut(object);
            let limit = self.limits.max_array_length;
            match (&mut record.kind, key.as_index()) {
                (ObjectKind::Array(items), Some(index)) => write_element(items, index, value, limit),
                _ => {
                    let configurable = record
                        .slot(key)
                        .map(|slot| slot.attributes().is_configurable())
                        .unwrap_or(true);
                    if configurable {
                        record.insert(key.clone(), Slot::Data { value, attributes });
                        WriteOutcome::Written
                    } else {
                        WriteOutcome::Rejected
                    }
                }
            }
        };
        let realm = self.current_realm();
        match outcome {
            WriteOutcome::Rejected => Err(self.throw_error(
                realm,
                ErrorKind::TypeError,
                &format!("Cannot redefine property: {}", key),
            )),
            WriteOutcome::InvalidLength | WriteOutcome::TooLarge => {
                Err(self.array_length_error(realm, outcome))
            }
            WriteOutcome::Written | WriteOutcome::Pending => Ok(()),
        }
    }

    fn delete(&self, object: ObjectHandle, key: &PropertyKey) -> HostResult<bool> {
        self.check_access(object)?;
        let mut state = self.state.borrow_mut();
        let record = state.object_mut(object);
        if let ObjectKind::Array(items) = &mut record.kind {
            if let Some(index) = key.as_index() {
                if index < items.len() {
                    items[index] = HostValue::Undefined;
                }
                return Ok(true);
            }
            if is_length(key) {
                return Ok(false);
            }
        }
        match record.slot(key).map(|slot| slot.attributes().is_configurable()) {
            Some(false) => Ok(false),
            Some(true) => {
                record.remove(key);
                Ok(true)
            }
            None => Ok(true),
        }
    }

    fn has_own_property(&self, object: ObjectHandle, key: &PropertyKey) -> HostResult<bool> {
        self.check_access(object)?;
        let state = self.state.borrow();
        let record = state.object(object);
        if let ObjectKind::Array(items) = &record.kind {
            if let Some(index) = key.as_index() {
                return Ok(index < items.len());
            }
            if is_length(key) {
                return Ok(true);
            }
        }
        Ok(record.slot(key).is_some())
    }

    fn property_attributes(
        &self,
        object: ObjectHandle,
        key: &PropertyKey,
    ) -> HostResult<Option<PropertyAttributes>> {
        self.check_access(object)?;
        let state = self.state.borrow();
        let record = state.object(object);
        if let ObjectKind::Array(items) = &record.kind {
            if let Some(index) = key.as_index() {
                return Ok((index < items.len()).then_some(PropertyAttributes::NONE));
            }
            if is_length(key) {
                return Ok(Some(PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE));
            }
        }
        Ok(record.slot(key).map(Slot::attributes))
    }

    fn is_callable(&self, value: &HostValue) -> bool {
        match value.as_object() {
            Some(handle) => self.state.borrow().object(handle).is_function(),
            None => false,
        }
    }

    fn new_function(&self, realm: RealmId, spec: FunctionSpec) -> HostResult<ObjectHandle> {
        let (handle, object_prototype) = {
            let mut state = self.state.borrow_mut();
            let intrinsics = &state.realm(realm).intrinsics;
            let (function_prototype, object_prototype) =
                (intrinsics.function_prototype, intrinsics.object_prototype);
            let mut record = ObjectRecord::new(
                realm,
                Some(function_prototype),
                ObjectKind::Function(FunctionRecord {
                    callback: spec.callback,
                    constructor: spec.constructor,
                }),
            );
            let name = spec.name.as_deref().unwrap_or("");
            let metadata = PropertyAttributes::READ_ONLY | PropertyAttributes::DONT_ENUM;
            record.insert(
                PropertyKey::named("name"),
                Slot::Data {
                    value: HostValue::string(name),
                    attributes: metadata,
                },
            );
            record.insert(
                PropertyKey::named("length"),
                Slot::Data {
                    value: HostValue::Number(spec.length as f64),
                    attributes: metadata,
                },
            );
            (state.alloc(record, self.limits.max_objects)?, object_prototype)
        };
        if spec.constructor == ConstructorBehavior::Allow {
            let prototype = self.new_object(realm, Some(object_prototype))?;
            self.define_property(
                prototype,
                &PropertyKey::named("constructor"),
                HostValue::Object(handle),
                PropertyAttributes::DONT_ENUM,
            )?;
            self.define_property(
                handle,
                &PropertyKey::named("prototype"),
                HostValue::Object(prototype),
                PropertyAttributes::DONT_ENUM | PropertyAttributes::DONT_DELETE,
            )?;
        }
        Ok(handle)
    }

    fn call(
        &self,
        realm: RealmId,
        callee: ObjectHandle,
        this: HostValue,
        args: &[HostValue],
    ) -> HostResult<HostValue> {
        self.check_termination()?;
        let target = {
            let state = self.state.borrow();
            let record = state.object(callee);
            match &record.kind {
                ObjectKind::Function(function) => Some((function.callback.clone(), record.realm)),
                _ => None,
            }
        };
        let (callback, home) = match target {
            Some(target) => target,
            None => {
                return Err(self.throw_error(
                    self.current_realm(),
                    ErrorKind::TypeError,
                    &format!("{} is not a function", callee),
                ))
            }
        };
        let result = {
            let _scope = self.enter(&[realm, home])?;
            let info = CallInfo {
                callee,
                this,
                args: args.to_vec(),
                new_target: None,
            };
            callback(self, &info)
        };
        self.check_termination()?;
        result
    }

    fn construct(
        &self,
        callee: ObjectHandle,
        args: &[HostValue],
        new_target: Option<ObjectHandle>,
    ) -> HostResult<HostValue> {
        self.check_termination()?;
        let target = {
            let state = self.state.borrow();
            let record = state.object(callee);
            match &record.kind {
                ObjectKind::Function(function) => Some((
                    function.callback.clone(),
                    function.constructor,
                    record.realm,
                    state.realm(record.realm).intrinsics.object_prototype,
                )),
                _ => None,
            }
        };
        let current = self.current_realm();
        let (callback, constructor, home, object_prototype) = match target {
            Some(target) => target,
            None => {
                return Err(self.throw_error(
                    current,
                    ErrorKind::TypeError,
                    &format!("{} is not a constructor", callee),
                ))
            }
        };
        if constructor == ConstructorBehavior::Throw {
            let name = self.function_name(callee);
            return Err(self.throw_error(
                current,
                ErrorKind::TypeError,
                &format!("{} is not a constructor", name),
            ));
        }

        let new_target = new_target.unwrap_or(callee);
        let prototype = match self.get(new_target, &PropertyKey::named("prototype"))? {
            HostValue::Object(prototype) => prototype,
            _ => object_prototype,
        };
        let receiver = self.new_object(home, Some(prototype))?;
        let result = {
            let _scope = self.enter(&[home])?;
            let info = CallInfo {
                callee,
                this: HostValue::Object(receiver),
                args: args.to_vec(),
                new_target: Some(new_target),
            };
            callback(self, &info)
        };
        self.check_termination()?;
        match result? {
            HostValue::Object(object) => Ok(HostValue::Object(object)),
            _ => Ok(HostValue::Object(receiver)),
        }
    }

    fn security_token(&self, realm: RealmId) -> HostValue {
        self.state.borrow().realm(realm).token.clone()
    }

    fn set_security_token(&self, realm: RealmId, token: HostValue) {
        trace!(realm = %realm, token = %token, "security token installed");
        self.state.borrow_mut().realm_mut(realm).token = token;
    }

    fn use_default_security_token(&self, realm: RealmId) {
        trace!(realm = %realm, "security token reset to default");
        let mut state = self.state.borrow_mut();
        let record = state.realm_mut(realm);
        record.token = record.default_token.clone();
    }

    fn define_lazy_property(
        &self,
        realm: RealmId,
        object: ObjectHandle,
        key: &PropertyKey,
        getter: LazyGetter,
        attributes: PropertyAttributes,
    ) -> HostResult<()> {
        self.check_access(object)?;
        let rejected = {
            let mut state = self.state.borrow_mut();
            let record = state.object_mut(object);
            let configurable = record
                .slot(key)
                .map(|slot| slot.attributes().is_configurable())
                .unwrap_or(true);
            if configurable {
                record.insert(
                    key.clone(),
                    Slot::Lazy {
                        getter,
                        realm,
                        attributes,
                    },
                );
            }
            !configurable
        };
        if rejected {
            return Err(self.throw_error(
                self.current_realm(),
                ErrorKind::TypeError,
                &format!("Cannot redefine property: {}", key),
            ));
        }
        Ok(())
    }
}
