//! .NET type system of the analyzed program.
//!
//! This module provides the declared-type half of the metadata graph: every type the
//! analyzed program defines, every type it references, and the relationships rules
//! ask about (inheritance, interface implementation, nesting, generic arity).
//!
//! # Key Components
//!
//! - [`CilType`]: Declared type snapshot combining `TypeDef` and `TypeRef` information
//! - [`CilTypeRef`]: Weak back-reference used for member-to-owner edges
//! - [`TypeRegistry`]: Central, concurrent registry of all types by token and name
//! - [`CilFlavor`]: Kind of a declared type (class, interface, delegate, primitive, ...)
//! - [`TypeAttributes`]: `TypeDef` flag constants (§II.23.1.15)
//!
//! # Type References
//!
//! Entries with a `TypeRef` token carry only a name: they stand for a type that may or
//! may not be defined somewhere in the loaded set. Resolution maps them to a definition
//! by full name and is allowed to fail; see [`crate::metadata::query::MetadataQuery`].

mod base;
mod registry;

use std::sync::{Arc, OnceLock};

pub use base::{CilFlavor, CilTypeRef};
pub use registry::TypeRegistry;

use crate::metadata::{
    event::{EventList, EventRc},
    method::{MethodList, MethodRc},
    signatures::TypeSignature,
    token::Token,
};

/// A vector that holds a list of `CilType`
pub type CilTypeList = Arc<boxcar::Vec<CilTypeRc>>;
/// Reference to a `CilType`
pub type CilTypeRc = Arc<CilType>;

/// Flags of a `TypeDef` row (§II.23.1.15)
#[allow(non_snake_case)]
pub mod TypeAttributes {
    /// Mask for extracting type visibility information.
    pub const VISIBILITY_MASK: u32 = 0x0000_0007;
    /// Type has no public scope (internal to assembly).
    pub const NOT_PUBLIC: u32 = 0x0000_0000;
    /// Type has public scope (visible outside assembly).
    pub const PUBLIC: u32 = 0x0000_0001;
    /// Nested type with public visibility.
    pub const NESTED_PUBLIC: u32 = 0x0000_0002;
    /// Nested type with private visibility.
    pub const NESTED_PRIVATE: u32 = 0x0000_0003;
    /// Nested type with family (protected) visibility.
    pub const NESTED_FAMILY: u32 = 0x0000_0004;
    /// Nested type with assembly (internal) visibility.
    pub const NESTED_ASSEMBLY: u32 = 0x0000_0005;
    /// Nested type visible to family and assembly.
    pub const NESTED_FAM_AND_ASSEM: u32 = 0x0000_0006;
    /// Nested type visible to family or assembly.
    pub const NESTED_FAM_OR_ASSEM: u32 = 0x0000_0007;
    /// Type is an interface.
    pub const INTERFACE: u32 = 0x0000_0020;
    /// Type is abstract.
    pub const ABSTRACT: u32 = 0x0000_0080;
    /// Type cannot be derived from.
    pub const SEALED: u32 = 0x0000_0100;
}

/// Represents a 'Type', close to `TypeDef` and `TypeRef` but as a combined item.
///
/// The `Token` is either a `TypeDef` token (a definition, possibly from a referenced
/// assembly loaded for resolution) or a `TypeRef` token (a bare name). A `CilType` is
/// immutable once the model is built; members are appended while building only.
pub struct CilType {
    /// Token
    pub token: Token,
    /// The `TypeFlavor`
    pub flavor: CilFlavor,
    /// `TypeNamespace` (can be empty, e.g. for nested types)
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// Flags (a 4-byte bitmask of type `TypeAttributes`, §II.23.1.15)
    pub flags: u32,
    /// Name of the assembly defining this type when it lies outside the analyzed set
    pub external: Option<String>,
    /// This types base aka 'extends'
    pub base: Option<TypeSignature>,
    /// All interfaces this class implements
    pub interfaces: Vec<TypeSignature>,
    /// Number of generic parameters this type declares (0 for non generic types)
    pub generic_param_count: u32,
    /// All methods this type has
    pub methods: MethodList,
    /// All events this type has
    pub events: EventList,
    /// The type this one is nested in
    enclosing_type: OnceLock<CilTypeRef>,
}

impl CilType {
    /// Create a new instance of a `CilType`
    #[must_use]
    pub fn new(
        token: Token,
        flavor: CilFlavor,
        namespace: String,
        name: String,
        flags: u32,
    ) -> Self {
        CilType {
            token,
            flavor,
            namespace,
            name,
            flags,
            external: None,
            base: None,
            interfaces: Vec::new(),
            generic_param_count: 0,
            methods: Arc::new(boxcar::Vec::new()),
            events: Arc::new(boxcar::Vec::new()),
            enclosing_type: OnceLock::new(),
        }
    }

    /// Sets the base type
    #[must_use]
    pub fn with_base(mut self, base: TypeSignature) -> Self {
        self.base = Some(base);
        self
    }

    /// Sets the implemented interfaces
    #[must_use]
    pub fn with_interfaces(mut self, interfaces: Vec<TypeSignature>) -> Self {
        self.interfaces = interfaces;
        self
    }

    /// Sets the generic arity
    #[must_use]
    pub fn with_generic_params(mut self, count: u32) -> Self {
        self.generic_param_count = count;
        self
    }

    /// Marks the type as defined by `assembly`, outside the analyzed set
    #[must_use]
    pub fn with_external(mut self, assembly: impl Into<String>) -> Self {
        self.external = Some(assembly.into());
        self
    }

    /// Returns the full name of the entity, `Namespace.Name` or `Enclosing/Name` for nested types
    #[must_use]
    pub fn fullname(&self) -> String {
        if let Some(enclosing) = self.enclosing_type() {
            format!("{}/{}", enclosing.fullname(), self.name)
        } else if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{0}.{1}", self.namespace, self.name)
        }
    }

    /// The type this one is nested in, if any
    #[must_use]
    pub fn enclosing_type(&self) -> Option<CilTypeRc> {
        self.enclosing_type.get().and_then(CilTypeRef::upgrade)
    }

    /// Records the enclosing type; only the first call has an effect
    pub fn set_enclosing_type(&self, enclosing: &CilTypeRc) {
        let _ = self.enclosing_type.set(CilTypeRef::new(enclosing));
    }

    /// True for bare `TypeRef` entries, which carry a name but no members
    #[must_use]
    pub fn is_typeref(&self) -> bool {
        self.token.is_type_ref()
    }

    /// True if the type comes from an assembly outside the analyzed set
    #[must_use]
    pub fn is_external(&self) -> bool {
        self.external.is_some() || self.is_typeref()
    }

    /// True if the type is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.flavor == CilFlavor::Interface || self.flags & TypeAttributes::INTERFACE != 0
    }

    /// True if the type is nested in another type
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.enclosing_type.get().is_some()
    }

    /// True if the type declares generic parameters
    #[must_use]
    pub fn is_generic_definition(&self) -> bool {
        self.generic_param_count != 0
    }

    /// Visibility bits of the type flags
    #[must_use]
    pub fn visibility(&self) -> u32 {
        self.flags & TypeAttributes::VISIBILITY_MASK
    }

    /// A signature referencing this type
    #[must_use]
    pub fn signature(&self) -> TypeSignature {
        match self.flavor {
            CilFlavor::ValueType | CilFlavor::Enum => TypeSignature::ValueType(self.token),
            _ => TypeSignature::Class(self.token),
        }
    }

    /// Adds a method to this type and points its declaring type back here
    pub fn add_method(self: &Arc<Self>, method: MethodRc) {
        method.set_declaring_type(self);
        self.methods.push(method);
    }

    /// Adds an event to this type and points its declaring type back here
    pub fn add_event(self: &Arc<Self>, event: EventRc) {
        event.set_declaring_type(self);
        self.events.push(event);
    }

    /// First method with the given name
    #[must_use]
    pub fn method_by_name(&self, name: &str) -> Option<MethodRc> {
        self.methods
            .iter()
            .map(|(_, method)| method)
            .find(|method| method.name == name)
            .cloned()
    }
}
