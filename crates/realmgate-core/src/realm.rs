//! Realm records
//!
//! Each realm is an isolated execution environment with:
//! - Its own global object and intrinsic prototypes
//! - A security token (initially the realm default)
//! - A strict-mode flag deciding whether failed writes raise
//!
//! Realms live in the heap's realm arena and are addressed by [`RealmId`].

use realmgate_sdk::{ErrorKind, HostValue, ObjectHandle, RealmId};
use rustc_hash::FxHashMap;

/// Options for creating a realm
#[derive(Debug, Clone)]
pub struct RealmOptions {
    /// Diagnostic name
    pub name: String,

    /// Whether code in the realm runs in strict mode
    pub strict: bool,
}

impl Default for RealmOptions {
    fn default() -> Self {
        Self {
            name: "realm".to_string(),
            strict: false,
        }
    }
}

impl RealmOptions {
    /// Create options with a name
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Enable strict mode
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }
}

/// Intrinsic objects every realm owns
#[derive(Debug, Clone)]
pub(crate) struct Intrinsics {
    pub(crate) object_prototype: ObjectHandle,
    pub(crate) function_prototype: ObjectHandle,
    pub(crate) array_prototype: ObjectHandle,
    pub(crate) error_prototypes: FxHashMap<ErrorKind, ObjectHandle>,
}

/// Realm record stored in the heap's realm arena
#[derive(Debug, Clone)]
pub(crate) struct RealmRecord {
    pub(crate) name: String,
    pub(crate) strict: bool,
    pub(crate) global: ObjectHandle,
    pub(crate) intrinsics: Intrinsics,
    pub(crate) default_token: HostValue,
    pub(crate) token: HostValue,
}

impl RealmRecord {
    pub(crate) fn new(options: RealmOptions, global: ObjectHandle, intrinsics: Intrinsics) -> Self {
        // The default token is the realm's own global, so fresh realms never match.
        let default_token = HostValue::Object(global);
        Self {
            name: options.name,
            strict: options.strict,
            global,
            intrinsics,
            token: default_token.clone(),
            default_token,
        }
    }

    pub(crate) fn error_prototype(&self, kind: ErrorKind) -> ObjectHandle {
        self.intrinsics
            .error_prototypes
            .get(&kind)
            .copied()
            .unwrap_or(self.intrinsics.object_prototype)
    }
}

/// Summary of a realm for diagnostics
#[derive(Debug, Clone)]
pub struct RealmInfo {
    /// Realm ID
    pub id: RealmId,
    /// Diagnostic name
    pub name: String,
    /// Strict mode flag
    pub strict: bool,
    /// Global object
    pub global: ObjectHandle,
}
