//! Central type registry for the analyzed program.
//!
//! This module provides the `TypeRegistry`, a thread-safe registry for all types the
//! metadata model knows about: definitions of the analyzed set, definitions loaded from
//! referenced assemblies for resolution, and bare `TypeRef` entries.
//!
//! # Registry Architecture
//!
//! - **Token-based lookup**: Primary index using metadata tokens (`SkipMap`, ordered)
//! - **Name-based lookup**: Secondary index of full names (`DashMap`)
//!
//! Token order is also iteration order, so analysis runs visit types deterministically.
//!
//! # Examples
//!
//! ```rust
//! use dotlint::metadata::token::Token;
//! use dotlint::metadata::typesystem::{CilFlavor, CilType, TypeAttributes, TypeRegistry};
//! use std::sync::Arc;
//!
//! let registry = TypeRegistry::new();
//! registry.insert(&Arc::new(CilType::new(
//!     Token::new(0x02000001),
//!     CilFlavor::Class,
//!     "MyNamespace".to_string(),
//!     "MyClass".to_string(),
//!     TypeAttributes::PUBLIC,
//! )))?;
//!
//! let found = registry.get_by_fullname("MyNamespace.MyClass");
//! assert_eq!(found.map(|t| t.token), Some(Token::new(0x02000001)));
//! # Ok::<(), dotlint::Error>(())
//! ```

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::{
    metadata::{token::Token, typesystem::CilTypeRc},
    Error::TypeInsert,
    Result,
};

/// Central registry managing all types known to the metadata model.
///
/// # Thread Safety
///
/// Lock-free `SkipMap` for primary storage and `DashMap` for the name index; lookups
/// never block and may run concurrently from every analysis worker.
pub struct TypeRegistry {
    /// Primary storage: token -> type
    types: SkipMap<Token, CilTypeRc>,
    /// Secondary index: types indexed by full name (namespace.name)
    types_by_fullname: DashMap<String, Vec<Token>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    /// Create a new, empty type registry
    #[must_use]
    pub fn new() -> Self {
        TypeRegistry {
            types: SkipMap::new(),
            types_by_fullname: DashMap::new(),
        }
    }

    /// Insert a `CilType` into the registry
    ///
    /// Nested types must have their enclosing type recorded before insertion, as the
    /// name index uses the full (`Outer/Inner`) name.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeInsert`] if the token is already taken.
    pub fn insert(&self, new_type: &CilTypeRc) -> Result<()> {
        if self.types.contains_key(&new_type.token) {
            return Err(TypeInsert(new_type.token));
        }

        self.types.insert(new_type.token, new_type.clone());
        self.types_by_fullname
            .entry(new_type.fullname())
            .or_default()
            .push(new_type.token);
        Ok(())
    }

    /// Get a type by token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<CilTypeRc> {
        self.types.get(token).map(|entry| entry.value().clone())
    }

    /// Get the first *definition* with the given full name.
    ///
    /// `TypeRef` entries are skipped: this is the lookup a reference resolves through.
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<CilTypeRc> {
        let tokens = self.types_by_fullname.get(fullname)?;
        tokens
            .iter()
            .filter(|token| token.is_type_def())
            .find_map(|token| self.get(token))
    }

    /// Get every entry (definitions and references) with the given full name
    #[must_use]
    pub fn get_by_fullname_list(&self, fullname: &str) -> Vec<CilTypeRc> {
        match self.types_by_fullname.get(fullname) {
            Some(tokens) => tokens.iter().filter_map(|token| self.get(token)).collect(),
            None => Vec::new(),
        }
    }

    /// Count of types in the registry
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns an iterator over all types in the registry
    pub fn iter(&self) -> crossbeam_skiplist::map::Iter<'_, Token, CilTypeRc> {
        self.types.iter()
    }

    /// Get all types in the registry, in token order
    #[must_use]
    pub fn all_types(&self) -> Vec<CilTypeRc> {
        self.types
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        metadata::typesystem::{CilFlavor, CilType},
        Error,
    };

    fn make(token: u32, namespace: &str, name: &str) -> CilTypeRc {
        Arc::new(CilType::new(
            Token::new(token),
            CilFlavor::Class,
            namespace.to_string(),
            name.to_string(),
            0,
        ))
    }

    #[test]
    fn test_insert_and_get() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());

        registry.insert(&make(0x02000001, "Demo", "A")).unwrap();
        registry.insert(&make(0x02000002, "Demo", "B")).unwrap();

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.get(&Token::new(0x02000002)).map(|t| t.name.clone()),
            Some("B".to_string())
        );
        assert!(registry.get(&Token::new(0x02000003)).is_none());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let registry = TypeRegistry::new();
        registry.insert(&make(0x02000001, "Demo", "A")).unwrap();

        let result = registry.insert(&make(0x02000001, "Demo", "Other"));
        assert!(matches!(result, Err(Error::TypeInsert(token)) if token == Token::new(0x02000001)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_fullname_lookup_skips_typerefs() {
        let registry = TypeRegistry::new();
        registry.insert(&make(0x01000001, "System", "Object")).unwrap();
        assert!(registry.get_by_fullname("System.Object").is_none());

        registry.insert(&make(0x02000009, "System", "Object")).unwrap();
        assert_eq!(
            registry.get_by_fullname("System.Object").map(|t| t.token),
            Some(Token::new(0x02000009))
        );
        assert_eq!(registry.get_by_fullname_list("System.Object").len(), 2);
    }

    #[test]
    fn test_iteration_in_token_order() {
        let registry = TypeRegistry::new();
        registry.insert(&make(0x02000003, "Demo", "C")).unwrap();
        registry.insert(&make(0x02000001, "Demo", "A")).unwrap();
        registry.insert(&make(0x01000001, "Demo", "Ref")).unwrap();

        let names: Vec<String> = registry.all_types().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["Ref", "A", "C"]);
    }
}
