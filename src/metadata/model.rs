//! In-memory metadata model of one analyzed program.
//!
//! [`MetadataModel`] is the concrete, read-only metadata graph the rule engine runs over,
//! and the reference implementation of [`MetadataQuery`]. It is assembled once with a
//! [`MetadataModelBuilder`] and never changes afterwards, so it can be shared by every
//! analysis worker without locking.
//!
//! # Analyzed Set and Referenced Assemblies
//!
//! The model holds three kinds of types:
//! - definitions of the analyzed program (these are what rules check)
//! - definitions loaded from referenced assemblies, marked external, which only serve
//!   resolution (e.g. the base class library from [`MetadataModelBuilder::with_corlib`])
//! - bare `TypeRef` entries, which name a type and resolve by full name
//!
//! # Examples
//!
//! ```rust
//! use dotlint::metadata::model::{MetadataModelBuilder, MethodDef, TypeDef};
//! use dotlint::metadata::query::MetadataQuery;
//! use dotlint::metadata::signatures::TypeSignature;
//!
//! let mut builder = MetadataModelBuilder::new().with_corlib()?;
//! builder.define(
//!     TypeDef::class("Demo", "Catalog")
//!         .public()
//!         .method(
//!             MethodDef::new("Titles")
//!                 .public()
//!                 .returns(TypeSignature::sz_array(TypeSignature::String)),
//!         ),
//! )?;
//! let model = builder.build();
//!
//! assert_eq!(model.analyzed_types().len(), 1);
//! assert_eq!(model.analyzed_methods()[0].name, "Titles");
//! # Ok::<(), dotlint::Error>(())
//! ```

use std::{collections::HashSet, sync::Arc};

use crate::{
    metadata::{
        event::Event,
        method::{Method, MethodAccessFlags, MethodBody, MethodModifiers},
        query::{Capability, MetadataQuery, WellKnownType},
        signatures::{SignatureMethod, TypeSignature},
        token::Token,
        typesystem::{CilFlavor, CilType, CilTypeRc, TypeAttributes, TypeRegistry},
    },
    Error::TypeNotFound,
    Result,
};

/// Upper bound on inheritance and interface chains, guarding against cyclic metadata
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Name of the assembly [`MetadataModelBuilder::with_corlib`] defines its types in
pub const CORLIB: &str = "mscorlib";

/// Read-only metadata graph of one analyzed program.
pub struct MetadataModel {
    types: TypeRegistry,
}

impl MetadataModel {
    /// The registry of all known types
    #[must_use]
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Full names along the base chain of `ty`, nearest first.
    ///
    /// The chain stops at the first base that cannot be resolved, after listing it.
    #[must_use]
    pub fn ancestors(&self, ty: &CilType) -> Vec<String> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = ty.base.clone();

        while let Some(base) = current {
            let name = self.definition_name(&base);
            if !seen.insert(name.clone()) || chain.len() > MAX_HIERARCHY_DEPTH {
                break;
            }
            chain.push(name);
            current = self.resolve(&base).and_then(|resolved| resolved.base.clone());
        }
        chain
    }

    /// Namespace-qualified name of the type a signature refers to, without generic arguments
    fn definition_name(&self, signature: &TypeSignature) -> String {
        match signature {
            TypeSignature::GenericInst(definition, _) => self.fullname(definition),
            _ => self.fullname(signature),
        }
    }

    fn format_signature(&self, signature: &TypeSignature, qualified: bool) -> String {
        let primitive = |name: &str| {
            if qualified {
                format!("System.{name}")
            } else {
                name.to_string()
            }
        };

        match signature {
            TypeSignature::Unknown => "?".to_string(),
            TypeSignature::Void => primitive("Void"),
            TypeSignature::Boolean => primitive("Boolean"),
            TypeSignature::Char => primitive("Char"),
            TypeSignature::I1 => primitive("SByte"),
            TypeSignature::U1 => primitive("Byte"),
            TypeSignature::I2 => primitive("Int16"),
            TypeSignature::U2 => primitive("UInt16"),
            TypeSignature::I4 => primitive("Int32"),
            TypeSignature::U4 => primitive("UInt32"),
            TypeSignature::I8 => primitive("Int64"),
            TypeSignature::U8 => primitive("UInt64"),
            TypeSignature::R4 => primitive("Single"),
            TypeSignature::R8 => primitive("Double"),
            TypeSignature::I => primitive("IntPtr"),
            TypeSignature::U => primitive("UIntPtr"),
            TypeSignature::String => primitive("String"),
            TypeSignature::Object => primitive("Object"),
            TypeSignature::ByRef(inner) => format!("{}&", self.format_signature(inner, qualified)),
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                match self.types.get(token) {
                    Some(ty) if qualified => ty.fullname(),
                    Some(ty) => ty.name.clone(),
                    None => token.to_string(),
                }
            }
            TypeSignature::GenericParamType(index) => format!("!{index}"),
            TypeSignature::GenericParamMethod(index) => format!("!!{index}"),
            TypeSignature::SzArray(array) => {
                format!("{}[]", self.format_signature(&array.base, qualified))
            }
            TypeSignature::Array(array) => {
                let commas = ",".repeat(usize::try_from(array.rank.saturating_sub(1)).unwrap_or(0));
                format!("{}[{commas}]", self.format_signature(&array.base, qualified))
            }
            TypeSignature::GenericInst(definition, args) => {
                let args = args
                    .iter()
                    .map(|arg| self.format_signature(arg, qualified))
                    .collect::<Vec<_>>()
                    .join(",");
                format!("{}<{args}>", self.format_signature(definition, qualified))
            }
        }
    }

    fn implements_interface(&self, ty: &CilType, interface: &str, depth: usize) -> bool {
        if depth > MAX_HIERARCHY_DEPTH {
            return false;
        }

        for implemented in &ty.interfaces {
            if self.definition_name(implemented) == interface {
                return true;
            }
            // interfaces inherit their own interfaces
            if let Some(resolved) = self.resolve(implemented) {
                if self.implements_interface(&resolved, interface, depth + 1) {
                    return true;
                }
            }
        }

        match ty.base.as_ref().and_then(|base| self.resolve(base)) {
            Some(base) => self.implements_interface(&base, interface, depth + 1),
            None => false,
        }
    }

    fn is_type_visible(ty: &CilType) -> bool {
        let mut visibility = ty.visibility();
        let mut enclosing = ty.enclosing_type();
        let mut depth = 0;
        loop {
            match enclosing {
                None => return visibility == TypeAttributes::PUBLIC,
                Some(outer) => {
                    if !matches!(
                        visibility,
                        TypeAttributes::NESTED_PUBLIC
                            | TypeAttributes::NESTED_FAMILY
                            | TypeAttributes::NESTED_FAM_OR_ASSEM
                    ) || depth > MAX_HIERARCHY_DEPTH
                    {
                        return false;
                    }
                    visibility = outer.visibility();
                    enclosing = outer.enclosing_type();
                    depth += 1;
                }
            }
        }
    }
}

impl MetadataQuery for MetadataModel {
    fn resolve(&self, signature: &TypeSignature) -> Option<CilTypeRc> {
        match signature {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => {
                let ty = self.types.get(token)?;
                if ty.is_typeref() {
                    self.types.get_by_fullname(&ty.fullname())
                } else {
                    Some(ty)
                }
            }
            TypeSignature::GenericInst(definition, _) => self.resolve(definition),
            TypeSignature::Void | TypeSignature::Object | TypeSignature::String => {
                self.types.get_by_fullname(&self.fullname(signature))
            }
            _ => None,
        }
    }

    fn fullname(&self, signature: &TypeSignature) -> String {
        self.format_signature(signature, true)
    }

    fn name(&self, signature: &TypeSignature) -> String {
        self.format_signature(signature, false)
    }

    fn implements(&self, signature: &TypeSignature, capability: Capability) -> bool {
        match (signature, capability) {
            (TypeSignature::SzArray(_) | TypeSignature::Array(_), Capability::Enumerable)
            | (TypeSignature::SzArray(_), Capability::GenericEnumerable) => return true,
            _ => {}
        }

        let Some(ty) = self.resolve(signature) else {
            return false;
        };

        let interface = capability.interface().fullname();
        if ty.is_interface() && ty.fullname() == interface {
            return true;
        }
        self.implements_interface(&ty, &interface, 0)
    }

    fn inherits_from(&self, signature: &TypeSignature, ancestor: WellKnownType) -> Option<bool> {
        let target = ancestor.fullname();
        let mut current = signature.clone();

        for _ in 0..MAX_HIERARCHY_DEPTH {
            if let TypeSignature::ByRef(inner) = &current {
                let inner = (**inner).clone();
                current = inner;
                continue;
            }

            let name = self.definition_name(&current);
            if name == target {
                return Some(true);
            }

            match &current {
                // hierarchy root
                TypeSignature::Object => return Some(false),
                _ if name == WellKnownType::Object.fullname() => return Some(false),
                // generic parameters carry no base until instantiated
                TypeSignature::GenericParamType(_)
                | TypeSignature::GenericParamMethod(_)
                | TypeSignature::Unknown => return None,
                TypeSignature::Class(_)
                | TypeSignature::ValueType(_)
                | TypeSignature::GenericInst(_, _) => {}
                // primitives, strings and arrays derive from framework types only
                _ => return Some(false),
            }

            let resolved = self.resolve(&current)?;
            match &resolved.base {
                Some(base) => current = base.clone(),
                None => return Some(false),
            }
        }

        Some(false)
    }

    fn is_visible(&self, method: &Method) -> bool {
        if !method.flags_access.is_externally_accessible() {
            return false;
        }

        method
            .declaring_type()
            .is_some_and(|owner| Self::is_type_visible(&owner))
    }

    fn is_analyzed(&self, ty: &CilType) -> bool {
        !ty.is_external()
    }

    fn analyzed_types(&self) -> Vec<CilTypeRc> {
        self.types
            .iter()
            .map(|entry| entry.value().clone())
            .filter(|ty| self.is_analyzed(ty))
            .collect()
    }
}

/// Definition of a type to add to a [`MetadataModelBuilder`].
pub struct TypeDef {
    namespace: String,
    name: String,
    flavor: CilFlavor,
    flags: u32,
    base: Option<TypeSignature>,
    interfaces: Vec<TypeSignature>,
    generic_params: u32,
    nested_in: Option<CilTypeRc>,
    external: Option<String>,
    methods: Vec<MethodDef>,
    events: Vec<EventDef>,
}

impl TypeDef {
    fn new(namespace: &str, name: &str, flavor: CilFlavor, flags: u32) -> Self {
        TypeDef {
            namespace: namespace.to_string(),
            name: name.to_string(),
            flavor,
            flags,
            base: None,
            interfaces: Vec::new(),
            generic_params: 0,
            nested_in: None,
            external: None,
            methods: Vec::new(),
            events: Vec::new(),
        }
    }

    /// A class deriving from `System.Object` unless [`TypeDef::extends`] says otherwise
    #[must_use]
    pub fn class(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, CilFlavor::Class, TypeAttributes::NOT_PUBLIC)
    }

    /// An interface
    #[must_use]
    pub fn interface(namespace: &str, name: &str) -> Self {
        Self::new(
            namespace,
            name,
            CilFlavor::Interface,
            TypeAttributes::INTERFACE | TypeAttributes::ABSTRACT,
        )
    }

    /// A sealed delegate type deriving from `System.MulticastDelegate`; its handler
    /// signature is given by an `Invoke` method
    #[must_use]
    pub fn delegate(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, CilFlavor::Delegate, TypeAttributes::SEALED)
    }

    /// A value type
    #[must_use]
    pub fn value_type(namespace: &str, name: &str) -> Self {
        Self::new(namespace, name, CilFlavor::ValueType, TypeAttributes::SEALED)
    }

    /// Makes the type public, or nested public when it is nested
    #[must_use]
    pub fn public(self) -> Self {
        let visibility = if self.nested_in.is_some() {
            TypeAttributes::NESTED_PUBLIC
        } else {
            TypeAttributes::PUBLIC
        };
        self.visibility(visibility)
    }

    /// Sets the visibility bits of the type flags
    #[must_use]
    pub fn visibility(mut self, visibility: u32) -> Self {
        self.flags = (self.flags & !TypeAttributes::VISIBILITY_MASK)
            | (visibility & TypeAttributes::VISIBILITY_MASK);
        self
    }

    /// Sets the base type
    #[must_use]
    pub fn extends(mut self, base: TypeSignature) -> Self {
        self.base = Some(base);
        self
    }

    /// Adds an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: TypeSignature) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Sets the number of generic parameters
    #[must_use]
    pub fn generic_params(mut self, count: u32) -> Self {
        self.generic_params = count;
        self
    }

    /// Nests the type in `enclosing`; nested types default to nested private
    #[must_use]
    pub fn nested_in(mut self, enclosing: &CilTypeRc) -> Self {
        self.nested_in = Some(enclosing.clone());
        if self.flags & TypeAttributes::VISIBILITY_MASK < TypeAttributes::NESTED_PUBLIC {
            self = self.visibility(TypeAttributes::NESTED_PRIVATE);
        }
        self
    }

    /// Marks the type as defined by a referenced assembly outside the analyzed set
    #[must_use]
    pub fn external(mut self, assembly: &str) -> Self {
        self.external = Some(assembly.to_string());
        self
    }

    /// Adds a method
    #[must_use]
    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    /// Adds an event
    #[must_use]
    pub fn event(mut self, event: EventDef) -> Self {
        self.events.push(event);
        self
    }
}

/// Definition of a method, part of a [`TypeDef`].
pub struct MethodDef {
    name: String,
    access: MethodAccessFlags,
    modifiers: MethodModifiers,
    return_type: TypeSignature,
    params: Vec<(String, TypeSignature)>,
    body: Option<MethodBody>,
}

impl MethodDef {
    /// A private instance method returning `void`, without parameters or body
    #[must_use]
    pub fn new(name: &str) -> Self {
        MethodDef {
            name: name.to_string(),
            access: MethodAccessFlags::PRIVATE,
            modifiers: MethodModifiers::HIDE_BY_SIG,
            return_type: TypeSignature::Void,
            params: Vec::new(),
            body: None,
        }
    }

    /// A public virtual `Invoke` method, as delegates declare it
    #[must_use]
    pub fn invoke(return_type: TypeSignature) -> Self {
        Self::new("Invoke")
            .public()
            .modifiers(MethodModifiers::HIDE_BY_SIG | MethodModifiers::VIRTUAL)
            .returns(return_type)
    }

    /// Makes the method public
    #[must_use]
    pub fn public(self) -> Self {
        self.access(MethodAccessFlags::PUBLIC)
    }

    /// Sets the access level
    #[must_use]
    pub fn access(mut self, access: MethodAccessFlags) -> Self {
        self.access = access;
        self
    }

    /// Sets the modifier flags
    #[must_use]
    pub fn modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Sets the return type
    #[must_use]
    pub fn returns(mut self, return_type: TypeSignature) -> Self {
        self.return_type = return_type;
        self
    }

    /// Appends a parameter
    #[must_use]
    pub fn param(mut self, name: &str, param_type: TypeSignature) -> Self {
        self.params.push((name.to_string(), param_type));
        self
    }

    /// Sets the CIL body
    #[must_use]
    pub fn body(mut self, body: MethodBody) -> Self {
        self.body = Some(body);
        self
    }
}

/// Definition of an event, part of a [`TypeDef`].
pub struct EventDef {
    name: String,
    event_type: TypeSignature,
}

impl EventDef {
    /// An event whose handlers have the delegate type `event_type`
    #[must_use]
    pub fn new(name: &str, event_type: TypeSignature) -> Self {
        EventDef {
            name: name.to_string(),
            event_type,
        }
    }
}

/// Assembles a [`MetadataModel`], allocating tokens for every entity in table order.
pub struct MetadataModelBuilder {
    types: TypeRegistry,
    next_type_ref: u32,
    next_type_def: u32,
    next_method: u32,
    next_event: u32,
}

impl Default for MetadataModelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataModelBuilder {
    /// An empty builder
    #[must_use]
    pub fn new() -> Self {
        MetadataModelBuilder {
            types: TypeRegistry::new(),
            next_type_ref: 1,
            // row 1 of TypeDef is the <Module> pseudo type
            next_type_def: 2,
            next_method: 1,
            next_event: 1,
        }
    }

    /// Adds the base class library types rules depend on, as definitions of the
    /// external assembly [`CORLIB`]
    ///
    /// # Errors
    /// Returns an error if a token collides with an already registered type.
    pub fn with_corlib(mut self) -> Result<Self> {
        let object = self.type_ref("System", "Object");
        let delegate = self.type_ref("System", "Delegate");
        let multicast = self.type_ref("System", "MulticastDelegate");
        let value_type = self.type_ref("System", "ValueType");
        let event_args = self.type_ref("System", "EventArgs");
        let enumerable = self.type_ref("System.Collections", "IEnumerable");
        let generic_enumerable = self.type_ref("System.Collections.Generic", "IEnumerable`1");
        let collection = self.type_ref("System.Collections", "ICollection");
        let generic_collection = self.type_ref("System.Collections.Generic", "ICollection`1");
        let t0 = || TypeSignature::GenericParamType(0);

        let corlib = [
            TypeDef::new("System", "Object", CilFlavor::Object, TypeAttributes::PUBLIC),
            TypeDef::class("System", "ValueType").extends(object.clone()),
            TypeDef::new("System", "Void", CilFlavor::Void, TypeAttributes::PUBLIC)
                .extends(value_type.clone()),
            TypeDef::new("System", "Int32", CilFlavor::I4, TypeAttributes::PUBLIC)
                .extends(value_type),
            TypeDef::new("System", "String", CilFlavor::String, TypeAttributes::SEALED)
                .extends(object.clone())
                .implements(enumerable.clone())
                .implements(TypeSignature::generic_inst(
                    generic_enumerable.clone(),
                    vec![TypeSignature::Char],
                )),
            TypeDef::class("System", "EventArgs").extends(object.clone()),
            TypeDef::class("System", "Delegate").extends(object.clone()),
            TypeDef::class("System", "MulticastDelegate").extends(delegate),
            TypeDef::delegate("System", "EventHandler")
                .extends(multicast.clone())
                .method(
                    MethodDef::invoke(TypeSignature::Void)
                        .param("sender", TypeSignature::Object)
                        .param("e", event_args),
                ),
            TypeDef::delegate("System", "EventHandler`1")
                .extends(multicast)
                .generic_params(1)
                .method(
                    MethodDef::invoke(TypeSignature::Void)
                        .param("sender", TypeSignature::Object)
                        .param("e", t0()),
                ),
            TypeDef::interface("System.Collections", "IEnumerable"),
            TypeDef::interface("System.Collections.Generic", "IEnumerable`1")
                .generic_params(1)
                .implements(enumerable.clone()),
            TypeDef::interface("System.Collections", "ICollection").implements(enumerable),
            TypeDef::interface("System.Collections.Generic", "ICollection`1")
                .generic_params(1)
                .implements(TypeSignature::generic_inst(generic_enumerable.clone(), vec![t0()])),
            TypeDef::class("System.Collections.Generic", "List`1")
                .generic_params(1)
                .extends(object)
                .implements(collection)
                .implements(TypeSignature::generic_inst(generic_collection, vec![t0()]))
                .implements(TypeSignature::generic_inst(generic_enumerable, vec![t0()])),
        ];

        for definition in corlib {
            self.define(definition.public().external(CORLIB))?;
        }
        Ok(self)
    }

    /// Returns a signature naming `namespace.name` through a `TypeRef` entry, creating the
    /// entry on first use
    pub fn type_ref(&mut self, namespace: &str, name: &str) -> TypeSignature {
        let fullname = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };

        if let Some(existing) = self
            .types
            .get_by_fullname_list(&fullname)
            .into_iter()
            .find(|ty| ty.is_typeref())
        {
            return TypeSignature::Class(existing.token);
        }

        let token = Token::from_parts(Token::TYPE_REF, self.next_type_ref);
        self.next_type_ref += 1;

        let reference = Arc::new(CilType::new(
            token,
            CilFlavor::Unknown,
            namespace.to_string(),
            name.to_string(),
            0,
        ));
        // TypeRef rows are allocated here only, a collision is impossible
        let _ = self.types.insert(&reference);
        TypeSignature::Class(token)
    }

    /// Shorthand for [`MetadataModelBuilder::type_ref`] on a well-known type
    pub fn well_known(&mut self, known: WellKnownType) -> TypeSignature {
        let (namespace, name) = known.split();
        self.type_ref(namespace, name)
    }

    /// Adds a type definition with all its members and returns it
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeNotFound`] if the enclosing type was not defined by
    /// this builder, or [`crate::Error::TypeInsert`] on a token collision.
    pub fn define(&mut self, definition: TypeDef) -> Result<CilTypeRc> {
        let token = Token::from_parts(Token::TYPE_DEF, self.next_type_def);

        let base = match (definition.base, definition.flavor) {
            (Some(base), _) => Some(base),
            (None, CilFlavor::Class) => Some(self.well_known(WellKnownType::Object)),
            (None, CilFlavor::Delegate) => Some(self.well_known(WellKnownType::MulticastDelegate)),
            (None, CilFlavor::ValueType) => Some(self.type_ref("System", "ValueType")),
            (None, _) => None,
        };

        let mut ty = CilType::new(
            token,
            definition.flavor,
            definition.namespace,
            definition.name,
            definition.flags,
        )
        .with_interfaces(definition.interfaces)
        .with_generic_params(definition.generic_params);
        if let Some(base) = base {
            ty = ty.with_base(base);
        }
        if let Some(assembly) = definition.external {
            ty = ty.with_external(assembly);
        }
        let ty = Arc::new(ty);

        if let Some(enclosing) = &definition.nested_in {
            match self.types.get(&enclosing.token) {
                Some(registered) if Arc::ptr_eq(&registered, enclosing) => {
                    ty.set_enclosing_type(enclosing);
                }
                _ => return Err(TypeNotFound(enclosing.token)),
            }
        }

        self.types.insert(&ty)?;
        self.next_type_def += 1;

        for method in definition.methods {
            let token = Token::from_parts(Token::METHOD_DEF, self.next_method);
            self.next_method += 1;

            let mut built = Method::new(
                token,
                method.name,
                method.access,
                SignatureMethod::new(method.return_type, method.params),
            )
            .with_modifiers(method.modifiers);
            built.signature.has_this = !method.modifiers.contains(MethodModifiers::STATIC);
            if let Some(body) = method.body {
                built = built.with_body(body);
            }
            ty.add_method(Arc::new(built));
        }

        for event in definition.events {
            let token = Token::from_parts(Token::EVENT, self.next_event);
            self.next_event += 1;
            ty.add_event(Arc::new(Event::new(token, event.name, event.event_type)));
        }

        Ok(ty)
    }

    /// Finishes the model
    #[must_use]
    pub fn build(self) -> MetadataModel {
        MetadataModel { types: self.types }
    }
}
