//! Events of the analyzed program.
//!
//! An [`Event`] names the delegate type its handlers must match. The delegate type is kept
//! as a [`TypeSignature`], i.e. a reference that may point outside the analyzed set and
//! has to be resolved through [`crate::metadata::query::MetadataQuery::resolve`].

use std::sync::{Arc, OnceLock};

use crate::metadata::{
    signatures::TypeSignature,
    token::Token,
    typesystem::{CilTypeRc, CilTypeRef},
};

/// A vector that holds a list of `Event`
pub type EventList = Arc<boxcar::Vec<EventRc>>;
/// Reference to an `Event`
pub type EventRc = Arc<Event>;

/// Flags of an `Event` row (§II.23.1.4)
#[allow(non_snake_case)]
pub mod EventAttributes {
    /// Event is special.
    pub const SPECIAL_NAME: u32 = 0x0200;
    /// CLI provides 'special' behavior, depending upon the name of the event
    pub const RTSPECIAL_NAME: u32 = 0x0400;
}

/// Represents an Event that a Type can have.
pub struct Event {
    /// Token
    pub token: Token,
    /// a 2-byte bitmask of type `EventAttributes`, §II.23.1.4
    pub flags: u32,
    /// The name of the event
    pub name: String,
    /// The delegate type of the event, a `TypeDefOrRef` (§II.24.2.6) reference
    pub event_type: TypeSignature,
    /// The type declaring this event
    declaring_type: OnceLock<CilTypeRef>,
}

impl Event {
    /// Create a new event of delegate type `event_type`
    #[must_use]
    pub fn new(token: Token, name: impl Into<String>, event_type: TypeSignature) -> Self {
        Event {
            token,
            flags: 0,
            name: name.into(),
            event_type,
            declaring_type: OnceLock::new(),
        }
    }

    /// The type declaring this event, if it is still alive
    #[must_use]
    pub fn declaring_type(&self) -> Option<CilTypeRc> {
        self.declaring_type.get().and_then(CilTypeRef::upgrade)
    }

    /// Records the declaring type; only the first call has an effect
    pub fn set_declaring_type(&self, owner: &CilTypeRc) {
        let _ = self.declaring_type.set(CilTypeRef::new(owner));
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{CilFlavor, CilType, TypeAttributes};

    #[test]
    fn test_event_owner() {
        let owner = Arc::new(CilType::new(
            Token::new(0x02000003),
            CilFlavor::Class,
            "Demo".to_string(),
            "Button".to_string(),
            TypeAttributes::PUBLIC,
        ));
        let clicked = Arc::new(Event::new(
            Token::new(0x14000001),
            "Clicked",
            TypeSignature::Class(Token::new(0x01000005)),
        ));

        assert_eq!(clicked.fullname(), "Clicked");
        owner.add_event(clicked.clone());

        assert_eq!(owner.events.count(), 1);
        assert_eq!(clicked.fullname(), "Demo.Button::Clicked");
        assert_eq!(
            clicked.event_type.token(),
            Some(Token::new(0x01000005))
        );
    }
}
