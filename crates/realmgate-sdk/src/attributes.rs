//! Property attributes and constructor behavior

/// Property attribute flags (bitflags).
///
/// An empty set means the property is writable, enumerable and configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PropertyAttributes(u8);

impl PropertyAttributes {
    /// Writable, enumerable, configurable
    pub const NONE: Self = Self(0x00);
    /// Value cannot be replaced
    pub const READ_ONLY: Self = Self(0x01);
    /// Hidden from enumeration
    pub const DONT_ENUM: Self = Self(0x02);
    /// Cannot be deleted or redefined
    pub const DONT_DELETE: Self = Self(0x04);
    /// READ_ONLY | DONT_ENUM | DONT_DELETE
    pub const FROZEN: Self = Self(0x07);

    /// Create from raw bits
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::FROZEN.0)
    }

    /// Get raw bits
    pub const fn bits(&self) -> u8 {
        self.0
    }

    /// Check if all flags of `other` are set
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Union of flags
    pub const fn union(&self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Remove flags
    pub const fn difference(&self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Whether the value may be replaced
    pub const fn is_writable(&self) -> bool {
        !self.contains(Self::READ_ONLY)
    }

    /// Whether the property shows up in enumeration
    pub const fn is_enumerable(&self) -> bool {
        !self.contains(Self::DONT_ENUM)
    }

    /// Whether the property may be deleted or redefined
    pub const fn is_configurable(&self) -> bool {
        !self.contains(Self::DONT_DELETE)
    }
}

impl std::ops::BitOr for PropertyAttributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl std::ops::BitOrAssign for PropertyAttributes {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// Whether a native function may be invoked with `new`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConstructorBehavior {
    /// `new f()` is permitted
    Allow,
    /// `new f()` fails with a type error before the callback runs
    #[default]
    Throw,
}

impl ConstructorBehavior {
    /// Map an `allowNew` flag
    pub const fn from_allow_new(allow_new: bool) -> Self {
        if allow_new {
            ConstructorBehavior::Allow
        } else {
            ConstructorBehavior::Throw
        }
    }
}
