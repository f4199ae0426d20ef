//! Methods of the analyzed program.
//!
//! A [`Method`] is a `MethodDef` with its decoded signature, its attribute flags and, when
//! the method is implemented in CIL, its [`MethodBody`]. Methods are owned by their
//! declaring [`crate::metadata::typesystem::CilType`] and point back to it weakly.
//!
//! # Key Types
//! - [`Method`]: A method definition
//! - [`MethodBody`]: Decoded instruction stream of a method
//! - [`MethodAccessFlags`], [`MethodModifiers`]: Attribute flags

mod body;
mod types;

use std::sync::{Arc, OnceLock};

pub use body::MethodBody;
pub use types::*;

use crate::metadata::{
    signatures::SignatureMethod,
    token::Token,
    typesystem::{CilTypeRc, CilTypeRef},
};

/// A vector that holds a list of `Method`
pub type MethodList = Arc<boxcar::Vec<MethodRc>>;
/// Reference to a `Method`
pub type MethodRc = Arc<Method>;

/// Represents a method definition of the analyzed program
pub struct Method {
    /// The token of this method
    pub token: Token,
    /// The name of this method
    pub name: String,
    /// Access level
    pub flags_access: MethodAccessFlags,
    /// Modifiers (static, virtual, ...)
    pub flags_modifiers: MethodModifiers,
    /// Return type and parameters
    pub signature: SignatureMethod,
    /// The CIL body, `None` for abstract, extern and runtime-provided methods
    pub body: Option<MethodBody>,
    /// The type declaring this method
    declaring_type: OnceLock<CilTypeRef>,
}

impl Method {
    /// Create a new method without body
    #[must_use]
    pub fn new(
        token: Token,
        name: impl Into<String>,
        flags_access: MethodAccessFlags,
        signature: SignatureMethod,
    ) -> Self {
        Method {
            token,
            name: name.into(),
            flags_access,
            flags_modifiers: MethodModifiers::empty(),
            signature,
            body: None,
            declaring_type: OnceLock::new(),
        }
    }

    /// Attaches a CIL body
    #[must_use]
    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the modifier flags
    #[must_use]
    pub fn with_modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.flags_modifiers = modifiers;
        self
    }

    /// The type declaring this method, if it is still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<CilTypeRc> {
        self.declaring_type.get().and_then(CilTypeRef::upgrade)
    }

    /// Records the declaring type; only the first call has an effect
    pub fn set_declaring_type(&self, owner: &CilTypeRc) {
        let _ = self.declaring_type.set(CilTypeRef::new(owner));
    }

    /// True if the method has a CIL body
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// True if the method declares at least one parameter
    #[must_use]
    pub fn has_parameters(&self) -> bool {
        !self.signature.params.is_empty()
    }

    /// True if the method is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags_modifiers.contains(MethodModifiers::STATIC)
    }

    /// Returns the full name, `Namespace.Type::Name`
    #[must_use]
    pub fn fullname(&self) -> String {
        match self.declaring_type() {
            Some(owner) => format!("{}::{}", owner.fullname(), self.name),
            None => self.name.clone(),
        }
    }
}
