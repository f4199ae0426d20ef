//! Resolution and query service over the metadata graph.
//!
//! Rules never walk the metadata graph on their own: everything that involves following a
//! reference (resolving a type, walking an inheritance chain, testing interface
//! implementation or visibility) goes through the [`MetadataQuery`] trait. This keeps
//! rules independent of how the graph was built and lets alternate back ends (a loaded
//! assembly set, a hand-built model in tests) serve the same rule catalog.
//!
//! # Failure Semantics
//!
//! Resolution failing is routine: the analyzed program references types that live in
//! assemblies outside the analyzed set. Queries therefore return `Option` or `bool` and
//! never an error. Callers turn a failed resolution into "does not apply" for the
//! dependent check.
//!
//! # Examples
//!
//! ```rust
//! use dotlint::metadata::model::MetadataModelBuilder;
//! use dotlint::metadata::query::{Capability, MetadataQuery, WellKnownType};
//! use dotlint::metadata::signatures::TypeSignature;
//!
//! let mut builder = MetadataModelBuilder::new().with_corlib()?;
//! let strings = builder.type_ref("System.Collections.Generic", "IEnumerable`1");
//! let model = builder.build();
//!
//! let sequence = TypeSignature::generic_inst(strings, vec![TypeSignature::String]);
//! assert!(model.implements(&sequence, Capability::Enumerable));
//! assert!(model.is_well_known(&TypeSignature::String, WellKnownType::String));
//! # Ok::<(), dotlint::Error>(())
//! ```

use strum::{Display, EnumIter};

use crate::metadata::{
    method::{Method, MethodRc},
    signatures::TypeSignature,
    typesystem::{CilType, CilTypeRc},
};

/// Types of the base class library rules refer to by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum WellKnownType {
    /// `System.Void`
    #[strum(serialize = "System.Void")]
    Void,
    /// `System.Object`
    #[strum(serialize = "System.Object")]
    Object,
    /// `System.String`
    #[strum(serialize = "System.String")]
    String,
    /// `System.EventArgs`
    #[strum(serialize = "System.EventArgs")]
    EventArgs,
    /// `System.MulticastDelegate`
    #[strum(serialize = "System.MulticastDelegate")]
    MulticastDelegate,
    /// `System.Collections.IEnumerable`
    #[strum(serialize = "System.Collections.IEnumerable")]
    IEnumerable,
    /// `System.Collections.Generic.IEnumerable<T>`
    #[strum(serialize = "System.Collections.Generic.IEnumerable`1")]
    GenericIEnumerable,
}

impl WellKnownType {
    /// The namespace-qualified metadata name
    #[must_use]
    pub fn fullname(self) -> String {
        self.to_string()
    }

    /// Namespace and name as two parts
    #[must_use]
    pub fn split(self) -> (&'static str, &'static str) {
        match self {
            WellKnownType::Void => ("System", "Void"),
            WellKnownType::Object => ("System", "Object"),
            WellKnownType::String => ("System", "String"),
            WellKnownType::EventArgs => ("System", "EventArgs"),
            WellKnownType::MulticastDelegate => ("System", "MulticastDelegate"),
            WellKnownType::IEnumerable => ("System.Collections", "IEnumerable"),
            WellKnownType::GenericIEnumerable => ("System.Collections.Generic", "IEnumerable`1"),
        }
    }
}

/// Structural contracts a type can conform to independent of its nominal base chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Capability {
    /// Implements `System.Collections.IEnumerable`, directly or through a base or
    /// derived interface; arrays always do
    Enumerable,
    /// Implements `System.Collections.Generic.IEnumerable<T>`
    GenericEnumerable,
}

impl Capability {
    /// The interface whose implementation grants this capability
    #[must_use]
    pub fn interface(self) -> WellKnownType {
        match self {
            Capability::Enumerable => WellKnownType::IEnumerable,
            Capability::GenericEnumerable => WellKnownType::GenericIEnumerable,
        }
    }
}

/// Read-only query interface over the metadata graph of one analyzed program.
///
/// # Thread Safety
///
/// Implementations are shared by every worker of an analysis run and must be
/// [`Send`] + [`Sync`]. The graph does not change while a run is in progress.
pub trait MetadataQuery: Send + Sync {
    /// Resolve a type reference to its definition.
    ///
    /// Generic instantiations resolve to their generic definition. Returns `None` for
    /// primitives, arrays, generic parameters and references to types outside the
    /// loaded set.
    fn resolve(&self, signature: &TypeSignature) -> Option<CilTypeRc>;

    /// Namespace-qualified name of a signature, e.g. `System.Int32`, `Demo.Item[]` or
    /// ``System.Collections.Generic.IEnumerable`1<System.String>``
    fn fullname(&self, signature: &TypeSignature) -> String;

    /// Short name of a signature, without namespace, e.g. `Int32[]`
    fn name(&self, signature: &TypeSignature) -> String;

    /// True if `signature` denotes the well-known type `expected`
    fn is_well_known(&self, signature: &TypeSignature, expected: WellKnownType) -> bool {
        self.fullname(signature) == expected.fullname()
    }

    /// True if the type denoted by `signature` has `capability`.
    ///
    /// A type that cannot be resolved has no capabilities.
    fn implements(&self, signature: &TypeSignature, capability: Capability) -> bool;

    /// Tests whether `signature` is, or derives from, `ancestor`.
    ///
    /// Returns `None` when the answer depends on a base type that cannot be resolved.
    fn inherits_from(&self, signature: &TypeSignature, ancestor: WellKnownType) -> Option<bool>;

    /// True if `method` can be called from outside its declaring assembly: the method
    /// itself and every enclosing type must be externally accessible
    fn is_visible(&self, method: &Method) -> bool;

    /// True if `ty` belongs to the analyzed set, as opposed to a referenced assembly
    fn is_analyzed(&self, ty: &CilType) -> bool;

    /// Every type definition of the analyzed set, in token order
    fn analyzed_types(&self) -> Vec<CilTypeRc>;

    /// Every method defined by a type of the analyzed set
    fn analyzed_methods(&self) -> Vec<MethodRc> {
        self.analyzed_types()
            .iter()
            .flat_map(|ty| {
                ty.methods
                    .iter()
                    .map(|(_, method)| method.clone())
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_well_known_names() {
        for known in WellKnownType::iter() {
            let (namespace, name) = known.split();
            assert_eq!(known.fullname(), format!("{namespace}.{name}"));
        }
        assert_eq!(WellKnownType::EventArgs.fullname(), "System.EventArgs");
    }

    #[test]
    fn test_capability_interface() {
        assert_eq!(Capability::Enumerable.interface(), WellKnownType::IEnumerable);
        assert_eq!(
            Capability::GenericEnumerable.interface(),
            WellKnownType::GenericIEnumerable
        );
    }
}
