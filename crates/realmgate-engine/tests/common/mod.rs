//! Shared fixture: an outer realm, an inner realm, and a platform descriptor
//! in the outer realm whose `global` is the inner realm's global.

#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use realmgate_core::{Heap, RealmOptions};
use realmgate_sdk::{
    CallInfo, Exception, HostResult, HostRuntime, HostValue, ObjectHandle, PropertyAttributes,
    PropertyKey, RealmId,
};

pub struct Fixture {
    pub heap: Heap,
    pub outer: RealmId,
    pub inner: RealmId,
    pub platform: ObjectHandle,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_realms(RealmOptions::named("outer"), RealmOptions::named("inner"))
    }

    pub fn with_realms(outer: RealmOptions, inner: RealmOptions) -> Self {
        let heap = Heap::new();
        let outer = heap.create_realm(outer);
        let inner = heap.create_realm(inner);
        let platform = heap.new_object(outer, None).unwrap();
        heap.define_property(
            platform,
            &PropertyKey::named("global"),
            HostValue::Object(heap.realm_global(inner)),
            PropertyAttributes::NONE,
        )
        .unwrap();
        Self {
            heap,
            outer,
            inner,
            platform,
        }
    }

    pub fn platform_value(&self) -> HostValue {
        HostValue::Object(self.platform)
    }

    /// Native function in `realm`
    pub fn function<F>(&self, realm: RealmId, name: &str, body: F) -> ObjectHandle
    where
        F: Fn(&dyn HostRuntime, &CallInfo) -> HostResult<HostValue> + 'static,
    {
        self.heap.new_native_function(realm, name, 0, body).unwrap()
    }

    /// Native function in the inner realm that returns a constant
    pub fn constant(&self, value: HostValue) -> ObjectHandle {
        self.function(self.inner, "constant", move |_, _| Ok(value.clone()))
    }

    /// Native function in the inner realm that throws `value`
    pub fn thrower(&self, value: HostValue) -> ObjectHandle {
        self.function(self.inner, "thrower", move |_, _| {
            Err(Exception::Thrown(value.clone()))
        })
    }

    /// Hook in the inner realm that counts its invocations
    pub fn counting_hook(&self, counter: &Rc<Cell<usize>>) -> ObjectHandle {
        let counter = Rc::clone(counter);
        self.function(self.inner, "counter", move |_, _| {
            counter.set(counter.get() + 1);
            Ok(HostValue::Undefined)
        })
    }

    /// Call `callee` from the outer realm
    pub fn call(&self, callee: ObjectHandle, args: &[HostValue]) -> HostResult<HostValue> {
        self.heap.call(self.outer, callee, HostValue::Undefined, args)
    }

    pub fn call_with_this(
        &self,
        callee: ObjectHandle,
        this: HostValue,
        args: &[HostValue],
    ) -> HostResult<HostValue> {
        self.heap.call(self.outer, callee, this, args)
    }

    pub fn object(&self, realm: RealmId) -> ObjectHandle {
        self.heap.new_object(realm, None).unwrap()
    }

    pub fn array(&self, realm: RealmId, items: &[HostValue]) -> HostValue {
        HostValue::Object(self.heap.new_array(realm, items).unwrap())
    }

    pub fn get(&self, object: ObjectHandle, key: &str) -> HostValue {
        self.heap.get(object, &PropertyKey::named(key)).unwrap()
    }

    pub fn put(&self, object: ObjectHandle, key: &str, value: HostValue) {
        self.heap
            .define_property(object, &PropertyKey::named(key), value, PropertyAttributes::NONE)
            .unwrap();
    }

    /// `message` of a thrown host error
    pub fn message(&self, exception: &Exception) -> String {
        let error = exception
            .thrown_value()
            .and_then(HostValue::as_object)
            .expect("thrown host error");
        self.get(error, "message").as_str().unwrap_or_default().to_string()
    }

    /// `name` of a thrown host error
    pub fn error_name(&self, exception: &Exception) -> String {
        let error = exception
            .thrown_value()
            .and_then(HostValue::as_object)
            .expect("thrown host error");
        self.get(error, "name").as_str().unwrap_or_default().to_string()
    }
}

pub fn counter() -> Rc<Cell<usize>> {
    Rc::new(Cell::new(0))
}
