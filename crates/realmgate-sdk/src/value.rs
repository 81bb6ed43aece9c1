//! Host value handles
//!
//! Values crossing the realm boundary are plain handles: primitives are stored
//! inline, objects are referenced through an arena index owned by the host
//! runtime. Every object handle belongs to exactly one realm, which the host
//! reports through [`HostRuntime::creation_realm`](crate::HostRuntime::creation_realm).

use std::fmt;
use std::rc::Rc;

/// Opaque identifier of a realm inside the host runtime's realm registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RealmId(u32);

impl RealmId {
    /// Create from a raw registry index
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw registry index
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for RealmId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "realm#{}", self.0)
    }
}

/// Opaque handle to a host object (ordinary object, array, error or function).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectHandle(u32);

impl ObjectHandle {
    /// Create from a raw heap index
    pub const fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Get the raw heap index
    pub const fn as_u32(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

/// A value as seen by the boundary code.
#[derive(Debug, Clone, Default)]
pub enum HostValue {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// Boolean primitive
    Bool(bool),
    /// Number primitive
    Number(f64),
    /// String primitive
    String(Rc<str>),
    /// Symbol primitive, identified by its host-assigned id
    Symbol(u32),
    /// Any object, including arrays and functions
    Object(ObjectHandle),
}

impl HostValue {
    /// Create a string value
    pub fn string(s: &str) -> Self {
        HostValue::String(Rc::from(s))
    }

    /// Check if the value is object-like (objects, arrays, functions)
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self, HostValue::Object(_))
    }

    /// Check for `undefined` or `null`
    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, HostValue::Undefined | HostValue::Null)
    }

    /// Extract the object handle
    #[inline]
    pub fn as_object(&self) -> Option<ObjectHandle> {
        match self {
            HostValue::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Extract a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Extract a string slice
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Extract a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HostValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Truthiness, as the host's boolean conversion defines it.
    pub fn is_truthy(&self) -> bool {
        match self {
            HostValue::Undefined | HostValue::Null => false,
            HostValue::Bool(b) => *b,
            HostValue::Number(n) => *n != 0.0 && !n.is_nan(),
            HostValue::String(s) => !s.is_empty(),
            HostValue::Symbol(_) | HostValue::Object(_) => true,
        }
    }

    /// Identity comparison used for security tokens and association lookups.
    ///
    /// Objects compare by handle, primitives by value. `NaN` is equal to itself.
    pub fn same_value(&self, other: &HostValue) -> bool {
        match (self, other) {
            (HostValue::Undefined, HostValue::Undefined) => true,
            (HostValue::Null, HostValue::Null) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Number(a), HostValue::Number(b)) => {
                (a.is_nan() && b.is_nan()) || a.to_bits() == b.to_bits()
            }
            (HostValue::String(a), HostValue::String(b)) => a == b,
            (HostValue::Symbol(a), HostValue::Symbol(b)) => a == b,
            (HostValue::Object(a), HostValue::Object(b)) => a == b,
            _ => false,
        }
    }

    /// Get type name for diagnostics
    pub const fn type_name(&self) -> &'static str {
        match self {
            HostValue::Undefined => "undefined",
            HostValue::Null => "null",
            HostValue::Bool(_) => "boolean",
            HostValue::Number(_) => "number",
            HostValue::String(_) => "string",
            HostValue::Symbol(_) => "symbol",
            HostValue::Object(_) => "object",
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl From<ObjectHandle> for HostValue {
    fn from(handle: ObjectHandle) -> Self {
        HostValue::Object(handle)
    }
}

impl From<bool> for HostValue {
    fn from(b: bool) -> Self {
        HostValue::Bool(b)
    }
}

impl From<f64> for HostValue {
    fn from(n: f64) -> Self {
        HostValue::Number(n)
    }
}

impl From<i32> for HostValue {
    fn from(n: i32) -> Self {
        HostValue::Number(n as f64)
    }
}

impl From<&str> for HostValue {
    fn from(s: &str) -> Self {
        HostValue::string(s)
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undefined => write!(f, "undefined"),
            HostValue::Null => write!(f, "null"),
            HostValue::Bool(b) => write!(f, "{}", b),
            HostValue::Number(n) => write!(f, "{}", n),
            HostValue::String(s) => write!(f, "\"{}\"", s),
            HostValue::Symbol(id) => write!(f, "Symbol({})", id),
            HostValue::Object(handle) => write!(f, "{}", handle),
        }
    }
}

/// Property name: a string or a host symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// String-named property (array indices are strings too)
    String(Rc<str>),
    /// Symbol-named property
    Symbol(u32),
}

impl PropertyKey {
    /// Create a string key
    pub fn named(name: &str) -> Self {
        PropertyKey::String(Rc::from(name))
    }

    /// Create an array index key
    pub fn index(index: usize) -> Self {
        PropertyKey::String(Rc::from(index.to_string().as_str()))
    }

    /// Interpret as an array index: a canonical integer in `0..=2^32-2`
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PropertyKey::String(s) => {
                if s.is_empty()
                    || (s.len() > 1 && s.starts_with('0'))
                    || !s.bytes().all(|b| b.is_ascii_digit())
                {
                    return None;
                }
                s.parse::<u32>()
                    .ok()
                    .filter(|&index| index != u32::MAX)
                    .map(|index| index as usize)
            }
            PropertyKey::Symbol(_) => None,
        }
    }

    /// Convert to a value
    pub fn to_value(&self) -> HostValue {
        match self {
            PropertyKey::String(s) => HostValue::String(s.clone()),
            PropertyKey::Symbol(id) => HostValue::Symbol(*id),
        }
    }

    /// Convert a value into a key; only strings and symbols qualify
    pub fn from_value(value: &HostValue) -> Option<Self> {
        match value {
            HostValue::String(s) => Some(PropertyKey::String(s.clone())),
            HostValue::Symbol(id) => Some(PropertyKey::Symbol(*id)),
            _ => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        PropertyKey::named(name)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Symbol(id) => write!(f, "Symbol({})", id),
        }
    }
}
