use crate::metadata::token::Token;

/// Represents a type as it appears in a signature.
///
/// A signature never owns the type it names: class and value types are
/// referenced by [`Token`] and must go through the resolution service
/// ([`crate::metadata::query::MetadataQuery::resolve`]) to reach the definition,
/// which may legitimately fail for types outside the analyzed set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum TypeSignature {
    #[default]
    /// Not defined
    Unknown,
    /// void
    Void,
    /// bool
    Boolean,
    /// char
    Char,
    /// signed 8bit integer
    I1,
    /// unsigned 8bit integer
    U1,
    /// signed 16bit integer
    I2,
    /// unsigned 16bit integer
    U2,
    /// signed 32bit integer
    I4,
    /// unsigned 32bit integer
    U4,
    /// signed 64bit integer
    I8,
    /// unsigned 64bit integer
    U8,
    /// 32bit floating-point
    R4,
    /// 64bit floating-point
    R8,
    /// signed integer, sized to executing platform
    I,
    /// unsigned integer, sized to executing platform
    U,
    /// System.String
    String,
    /// System.Object
    Object,
    /// Type by reference
    ByRef(Box<TypeSignature>),
    /// CIL value-type
    // TypeDefOrRef
    ValueType(Token),
    /// CIL Class
    // TypeDefOrRef
    Class(Token),
    /// Generic type parameter
    GenericParamType(u32),
    /// Generic method parameter
    GenericParamMethod(u32),
    /// Multi-dimensional array
    Array(SignatureArray),
    /// Single dimension array
    SzArray(SignatureSzArray),
    /// Generic type and its arguments
    GenericInst(Box<TypeSignature>, Vec<TypeSignature>),
}

impl TypeSignature {
    /// Creates a single dimension array of `element`
    #[must_use]
    pub fn sz_array(element: TypeSignature) -> Self {
        TypeSignature::SzArray(SignatureSzArray {
            base: Box::new(element),
        })
    }

    /// Creates a generic instantiation of `definition` with `args`
    #[must_use]
    pub fn generic_inst(definition: TypeSignature, args: Vec<TypeSignature>) -> Self {
        TypeSignature::GenericInst(Box::new(definition), args)
    }

    /// Returns true for `void`
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeSignature::Void)
    }

    /// Returns true for single and multi-dimensional arrays
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, TypeSignature::Array(_) | TypeSignature::SzArray(_))
    }

    /// Returns the element type of an array signature
    #[must_use]
    pub fn element_type(&self) -> Option<&TypeSignature> {
        match self {
            TypeSignature::Array(array) => Some(&array.base),
            TypeSignature::SzArray(array) => Some(&array.base),
            _ => None,
        }
    }

    /// The token of the named type, following generic instantiations to their definition.
    ///
    /// Returns `None` for primitives, arrays and generic parameters, which do not
    /// name a `TypeDef` or `TypeRef` row.
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self {
            TypeSignature::Class(token) | TypeSignature::ValueType(token) => Some(*token),
            TypeSignature::GenericInst(definition, _) => definition.token(),
            _ => None,
        }
    }
}

/// A multi-dimensional array
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SignatureArray {
    /// The type in the array
    pub base: Box<TypeSignature>,
    /// The number of dimensions
    pub rank: u32,
}

/// A single dimension, zero based array
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SignatureSzArray {
    /// The type in the array
    pub base: Box<TypeSignature>,
}

/// A method parameter (or return value) with its declared name and position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SignatureParameter {
    /// Declared name of the parameter, empty for the return value
    pub name: String,
    /// Position of the parameter, 0 for the return value and 1.. for the parameters
    pub sequence: u16,
    /// Parameter is passed by reference
    pub by_ref: bool,
    /// The type of the parameter
    pub base: TypeSignature,
}

/// Represents a method signature (II.23.2.1)
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SignatureMethod {
    /// Used to encode the keyword instance in the calling convention, see §II.15.3
    pub has_this: bool,
    /// Used to indicate that the method has one or more generic parameters.
    pub param_count_generic: u32,
    /// The return type of this `Method`
    pub return_type: SignatureParameter,
    /// The parameters of this `Method`
    pub params: Vec<SignatureParameter>,
}

impl SignatureMethod {
    /// Creates a signature returning `return_type` with the given `(name, type)` parameters
    #[must_use]
    pub fn new(return_type: TypeSignature, params: Vec<(String, TypeSignature)>) -> Self {
        SignatureMethod {
            has_this: true,
            param_count_generic: 0,
            return_type: SignatureParameter {
                base: return_type,
                ..SignatureParameter::default()
            },
            params: params
                .into_iter()
                .enumerate()
                .map(|(index, (name, base))| SignatureParameter {
                    name,
                    sequence: u16::try_from(index + 1).unwrap_or(u16::MAX),
                    by_ref: false,
                    base,
                })
                .collect(),
        }
    }

    /// Parameter at `position` (0 based), if declared
    #[must_use]
    pub fn param(&self, position: usize) -> Option<&SignatureParameter> {
        self.params.get(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_array_helpers() {
        let array = TypeSignature::sz_array(TypeSignature::I4);
        assert!(array.is_array());
        assert_eq!(array.element_type(), Some(&TypeSignature::I4));
        assert!(!TypeSignature::String.is_array());
        assert_eq!(TypeSignature::String.element_type(), None);
    }

    #[test]
    fn test_token_follows_generic_definition() {
        let definition = TypeSignature::Class(Token::new(0x01000004));
        let inst = TypeSignature::generic_inst(definition, vec![TypeSignature::I4]);
        assert_eq!(inst.token(), Some(Token::new(0x01000004)));
        assert_eq!(TypeSignature::Object.token(), None);
    }

    #[test]
    fn test_signature_positions() {
        let sig = SignatureMethod::new(
            TypeSignature::Void,
            vec![
                ("sender".to_string(), TypeSignature::Object),
                ("e".to_string(), TypeSignature::Class(Token::new(0x01000001))),
            ],
        );
        assert!(sig.return_type.base.is_void());
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.param(0).map(|p| p.sequence), Some(1));
        assert_eq!(sig.param(1).map(|p| p.name.as_str()), Some("e"));
        assert!(sig.param(2).is_none());
    }
}
