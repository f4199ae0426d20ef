//! Method attribute flags for CIL methods.
//!
//! The `MethodDef.Flags` column (§II.23.1.10) packs an access level into its low three
//! bits and independent modifier bits above them. The two halves are split into
//! [`MethodAccessFlags`] and [`MethodModifiers`].

use bitflags::bitflags;

/// Bitmask for `ACCESS` state extraction
pub const METHOD_ACCESS_MASK: u32 = 0x0007;
/// Bitmask for `VTABLE_LAYOUT` information extraction
pub const METHOD_VTABLE_LAYOUT_MASK: u32 = 0x0100;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method access flags
    pub struct MethodAccessFlags: u32 {
        /// Member not referenceable
        const COMPILER_CONTROLLED = 0x0000;
        /// Accessible only by the parent type
        const PRIVATE = 0x0001;
        /// Accessible by sub-types only in this Assembly
        const FAM_AND_ASSEM = 0x0002;
        /// Accessible by anyone in the Assembly
        const ASSEM = 0x0003;
        /// Accessible only by type and sub-types
        const FAMILY = 0x0004;
        /// Accessible by sub-types anywhere, plus anyone in assembly
        const FAM_OR_ASSEM = 0x0005;
        /// Accessible by anyone who has visibility to this scope
        const PUBLIC = 0x0006;
    }
}

impl MethodAccessFlags {
    /// Extract access flags from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        let access = flags & METHOD_ACCESS_MASK;
        Self::from_bits_truncate(access)
    }

    /// True for the access levels a caller outside the declaring assembly can reach
    #[must_use]
    pub fn is_externally_accessible(&self) -> bool {
        *self == Self::PUBLIC || *self == Self::FAMILY || *self == Self::FAM_OR_ASSEM
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers and properties
    pub struct MethodModifiers: u32 {
        /// Defined on type, else per instance
        const STATIC = 0x0010;
        /// Method cannot be overridden
        const FINAL = 0x0020;
        /// Method is virtual
        const VIRTUAL = 0x0040;
        /// Method hides by name+sig, else just by name
        const HIDE_BY_SIG = 0x0080;
        /// Method can only be overridden if also accessible
        const STRICT = 0x0200;
        /// Method does not provide an implementation
        const ABSTRACT = 0x0400;
        /// Method is special
        const SPECIAL_NAME = 0x0800;
        /// CLI provides 'special' behavior, depending upon the name of the method
        const RTSPECIAL_NAME = 0x1000;
        /// Implementation is forwarded through PInvoke
        const PINVOKE_IMPL = 0x2000;
        /// Method has security associate with it
        const HAS_SECURITY = 0x4000;
        /// Method calls another method containing security code
        const REQUIRE_SEC_OBJECT = 0x8000;
        /// Reserved: shall be zero for conforming implementations
        const UNMANAGED_EXPORT = 0x0008;
    }
}

impl MethodModifiers {
    /// Extract method modifiers from raw method attributes
    #[must_use]
    pub fn from_method_flags(flags: u32) -> Self {
        let modifiers = flags & !METHOD_ACCESS_MASK & !METHOD_VTABLE_LAYOUT_MASK;
        Self::from_bits_truncate(modifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_from_raw_flags() {
        // public hidebysig virtual
        let raw = 0x0006 | 0x0080 | 0x0040;
        assert_eq!(MethodAccessFlags::from_method_flags(raw), MethodAccessFlags::PUBLIC);

        let modifiers = MethodModifiers::from_method_flags(raw);
        assert!(modifiers.contains(MethodModifiers::VIRTUAL));
        assert!(modifiers.contains(MethodModifiers::HIDE_BY_SIG));
        assert!(!modifiers.contains(MethodModifiers::STATIC));
    }

    #[test]
    fn test_external_accessibility() {
        assert!(MethodAccessFlags::PUBLIC.is_externally_accessible());
        assert!(MethodAccessFlags::FAMILY.is_externally_accessible());
        assert!(MethodAccessFlags::FAM_OR_ASSEM.is_externally_accessible());

        assert!(!MethodAccessFlags::PRIVATE.is_externally_accessible());
        assert!(!MethodAccessFlags::ASSEM.is_externally_accessible());
        assert!(!MethodAccessFlags::FAM_AND_ASSEM.is_externally_accessible());
        assert!(!MethodAccessFlags::COMPILER_CONTROLLED.is_externally_accessible());
    }
}
