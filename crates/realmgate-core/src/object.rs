//! Heap object records

use std::fmt;

use realmgate_sdk::{
    ConstructorBehavior, HostValue, LazyGetter, NativeCallback, ObjectHandle, PropertyAttributes,
    PropertyKey, RealmId,
};

/// What kind of object a heap slot holds
pub(crate) enum ObjectKind {
    /// Plain object
    Ordinary,
    /// A realm's global object (subject to security-token access checks)
    Global,
    /// Dense array
    Array(Vec<HostValue>),
    /// Built-in error instance
    Error,
    /// Native function
    Function(FunctionRecord),
}

pub(crate) struct FunctionRecord {
    pub(crate) callback: NativeCallback,
    pub(crate) constructor: ConstructorBehavior,
}

/// A property slot
#[derive(Clone)]
pub(crate) enum Slot {
    /// Materialized data property
    Data {
        value: HostValue,
        attributes: PropertyAttributes,
    },
    /// Data property whose value is produced on first read
    Lazy {
        getter: LazyGetter,
        realm: RealmId,
        attributes: PropertyAttributes,
    },
}

impl Slot {
    pub(crate) fn attributes(&self) -> PropertyAttributes {
        match self {
            Slot::Data { attributes, .. } | Slot::Lazy { attributes, .. } => *attributes,
        }
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Data { value, attributes } => f
                .debug_struct("Data")
                .field("value", value)
                .field("attributes", attributes)
                .finish(),
            Slot::Lazy { realm, attributes, .. } => f
                .debug_struct("Lazy")
                .field("realm", realm)
                .field("attributes", attributes)
                .finish(),
        }
    }
}

/// Object record stored in the heap's object arena
pub(crate) struct ObjectRecord {
    /// Creation realm; never reassigned
    pub(crate) realm: RealmId,
    pub(crate) prototype: Option<ObjectHandle>,
    pub(crate) kind: ObjectKind,
    /// Own properties in insertion order
    pub(crate) properties: Vec<(PropertyKey, Slot)>,
}

impl ObjectRecord {
    pub(crate) fn new(realm: RealmId, prototype: Option<ObjectHandle>, kind: ObjectKind) -> Self {
        Self {
            realm,
            prototype,
            kind,
            properties: Vec::new(),
        }
    }

    pub(crate) fn slot(&self, key: &PropertyKey) -> Option<&Slot> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, slot)| slot)
    }

    pub(crate) fn slot_mut(&mut self, key: &PropertyKey) -> Option<&mut Slot> {
        self.properties
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, slot)| slot)
    }

    pub(crate) fn insert(&mut self, key: PropertyKey, slot: Slot) {
        match self.slot_mut(&key) {
            Some(existing) => *existing = slot,
            None => self.properties.push((key, slot)),
        }
    }

    pub(crate) fn remove(&mut self, key: &PropertyKey) {
        self.properties.retain(|(k, _)| k != key);
    }

    pub(crate) fn is_function(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }
}
