//! CIL instruction model and body construction.
//!
//! This module holds the instruction-level view of method bodies: decoded
//! [`Instruction`]s with typed operands and control flow classification, the raw
//! [`opcodes`] they are identified by, and the [`InstructionBuilder`] that assembles
//! [`crate::metadata::method::MethodBody`] values from a fluent instruction list.
//!
//! # Key Components
//!
//! - [`Instruction`] - Decoded instruction
//! - [`Operand`], [`Immediate`] - Typed operands
//! - [`FlowType`] - Control flow classification used to build predecessor graphs
//! - [`InstructionBuilder`] - Label-resolving body builder

mod builder;
mod instruction;
pub mod opcodes;

pub use builder::InstructionBuilder;
pub use instruction::{
    FlowType, Immediate, Instruction, InstructionCategory, Operand, StackBehavior,
};
