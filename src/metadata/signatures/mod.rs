//! Method and type signatures of the analyzed program.
//!
//! Signatures are the decoded form of ECMA-335 signature blobs: a method signature is
//! an ordered list of parameters (type, declared name, position) plus a return type.
//! Rules read them to check shapes, such as the `Invoke` signature a delegate
//! declares for its handlers, or the return type of a method.
//!
//! # Examples
//!
//! ```rust
//! use dotlint::metadata::signatures::{SignatureMethod, TypeSignature};
//!
//! let invoke = SignatureMethod::new(
//!     TypeSignature::Void,
//!     vec![("sender".to_string(), TypeSignature::Object)],
//! );
//! assert!(invoke.return_type.base.is_void());
//! assert_eq!(invoke.params[0].name, "sender");
//! ```
//!
//! # References
//!
//! - ECMA-335 6th Edition, Partition II, Section 23.2 - Blobs and Signatures

mod types;

pub use types::{
    SignatureArray, SignatureMethod, SignatureParameter, SignatureSzArray, TypeSignature,
};
