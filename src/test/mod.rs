//! Model factories shared by the unit tests.

use crate::{
    assembly::InstructionBuilder,
    metadata::{
        method::MethodBody,
        model::{MetadataModel, MetadataModelBuilder, MethodDef},
        query::WellKnownType,
        signatures::TypeSignature,
    },
};

/// A builder with the base class library types registered
pub fn corlib() -> MetadataModelBuilder {
    MetadataModelBuilder::new()
        .with_corlib()
        .expect("corlib types register without collisions")
}

/// A model holding nothing but the base class library
pub fn corlib_model() -> MetadataModel {
    corlib().build()
}

/// `void Invoke(object sender, EventArgs e)`
pub fn event_handler_invoke(builder: &mut MetadataModelBuilder) -> MethodDef {
    let args = builder.well_known(WellKnownType::EventArgs);
    MethodDef::invoke(TypeSignature::Void)
        .param("sender", TypeSignature::Object)
        .param("e", args)
}

/// `ldnull; ret`
pub fn null_return_body() -> MethodBody {
    InstructionBuilder::new()
        .ldnull()
        .ret()
        .build()
        .expect("body without labels")
}
