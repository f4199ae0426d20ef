use std::sync::{Arc, Weak};

use crate::metadata::{
    token::Token,
    typesystem::{CilType, CilTypeRc},
};

/// A smart reference to a `CilType` that automatically handles weak references
/// to prevent circular reference memory leaks while providing a clean API
///
/// Used for back-edges of the metadata graph (member to declaring type, nested
/// type to enclosing type); the [`crate::metadata::typesystem::TypeRegistry`]
/// holds the owning references.
#[derive(Clone, Debug)]
pub struct CilTypeRef {
    weak_ref: Weak<CilType>,
}

impl CilTypeRef {
    /// Create a new `CilTypeRef` from a strong reference
    pub fn new(strong_ref: &CilTypeRc) -> Self {
        Self {
            weak_ref: Arc::downgrade(strong_ref),
        }
    }

    /// Get a strong reference to the type, returning None if the type has been dropped
    #[must_use]
    pub fn upgrade(&self) -> Option<CilTypeRc> {
        self.weak_ref.upgrade()
    }

    /// Check if the referenced type is still alive
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.weak_ref.strong_count() > 0
    }

    /// Get the token of the referenced type (if still alive)
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.upgrade().map(|t| t.token)
    }

    /// Get the full name of the referenced type (if still alive)
    #[must_use]
    pub fn fullname(&self) -> Option<String> {
        self.upgrade().map(|t| t.fullname())
    }
}

impl From<CilTypeRc> for CilTypeRef {
    fn from(strong_ref: CilTypeRc) -> Self {
        Self::new(&strong_ref)
    }
}

#[allow(missing_docs)]
/// The kind of a declared type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CilFlavor {
    // Base primitive types
    Void,
    Boolean,
    Char,
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    R4,
    R8,
    I,
    U,
    Object,
    String,

    // Type categories
    Class,
    ValueType,
    Interface,
    Delegate,
    Enum,

    // Fallback
    Unknown,
}
