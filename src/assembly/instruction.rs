//! CIL instruction representation.
//!
//! This module defines the decoded form of CIL instructions analyses work on: the
//! [`Instruction`] itself plus typed operands, control flow classification and stack
//! effects. Instructions are immutable once decoded.
//!
//! # Key Components
//!
//! - [`Instruction`] - Decoded instruction with location, identity and operand
//! - [`Operand`] - Type-safe operand representation
//! - [`Immediate`] - Immediate constant values
//! - [`FlowType`] - Control flow behavior classification
//! - [`InstructionCategory`] - Functional instruction grouping
//! - [`StackBehavior`] - Stack effect metadata

use std::fmt;

use crate::{assembly::opcodes, metadata::token::Token};

/// Immediate constant embedded in an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    /// Signed 8-bit immediate value
    Int8(i8),
    /// Signed 32-bit immediate value
    Int32(i32),
}

/// Represents an operand in a structured way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// No operand present
    None,
    /// Immediate value (constant embedded in instruction)
    Immediate(Immediate),
    /// Branch target offset
    Target(u64),
    /// Metadata token reference
    Token(Token),
    /// Local variable index
    Local(u16),
    /// Method argument index
    Argument(u16),
}

/// How an instruction affects control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowType {
    /// Normal execution continues to next instruction
    Sequential,
    /// Conditional branch to another location
    ConditionalBranch,
    /// Always branches to another location (unconditional jump)
    UnconditionalBranch,
    /// Call to another method
    Call,
    /// Returns from current method
    Return,
    /// Exception throwing
    Throw,
    /// Leave protected region (try/catch/finally)
    Leave,
}

/// Stack effect of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackBehavior {
    /// Number of items popped from stack
    pub pops: u8,
    /// Number of items pushed to stack
    pub pushes: u8,
    /// Net effect on stack depth (pushes - pops)
    pub net_effect: i8,
}

impl StackBehavior {
    /// Stack effect popping `pops` and pushing `pushes` items
    #[must_use]
    pub const fn new(pops: u8, pushes: u8) -> Self {
        #[allow(clippy::cast_possible_wrap)]
        StackBehavior {
            pops,
            pushes,
            net_effect: pushes as i8 - pops as i8,
        }
    }
}

/// Categorization of instructions by their primary function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionCategory {
    /// Control flow operations (br, ret, call)
    ControlFlow,
    /// Load and store operations (ldloc, ldnull, ldarg)
    LoadStore,
    /// Object model operations (newobj, ldfld, ldstr)
    ObjectModel,
    /// Miscellaneous operations (nop, dup, pop)
    Misc,
}

/// A decoded CIL instruction.
#[derive(Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Offset of this instruction from the start of the method body
    pub offset: u64,
    /// Size of this instruction in bytes
    pub size: u64,
    /// Primary opcode byte (second byte for `0xFE` prefixed opcodes)
    pub opcode: u8,
    /// Prefix byte (0 if no prefix)
    pub prefix: u8,
    /// Human-readable instruction mnemonic (e.g., "ldnull", "stloc.s", "ret")
    pub mnemonic: &'static str,
    /// Functional categorization of this instruction
    pub category: InstructionCategory,
    /// How this instruction affects control flow
    pub flow_type: FlowType,
    /// The operand data for this instruction
    pub operand: Operand,
    /// How this instruction affects the evaluation stack
    pub stack_behavior: StackBehavior,
    /// Computed branch targets (if any, as absolute offsets)
    pub branch_targets: Vec<u64>,
}

impl Instruction {
    /// Check if this instruction is a branch instruction.
    #[must_use]
    pub fn is_branch(&self) -> bool {
        matches!(
            self.flow_type,
            FlowType::ConditionalBranch | FlowType::UnconditionalBranch | FlowType::Leave
        )
    }

    /// True if execution can continue with the next instruction in sequence
    #[must_use]
    pub fn falls_through(&self) -> bool {
        !matches!(
            self.flow_type,
            FlowType::UnconditionalBranch | FlowType::Return | FlowType::Throw | FlowType::Leave
        )
    }

    /// Get the target offsets of this instruction (for branches).
    #[must_use]
    pub fn get_targets(&self) -> &[u64] {
        if self.is_branch() {
            &self.branch_targets
        } else {
            &[]
        }
    }

    /// Index of the local variable this instruction loads (`ldloc` family)
    #[must_use]
    pub fn local_load_index(&self) -> Option<u16> {
        match (self.prefix, self.opcode) {
            (0, opcodes::LDLOC_0..=opcodes::LDLOC_3) => {
                Some(u16::from(self.opcode - opcodes::LDLOC_0))
            }
            (0, opcodes::LDLOC_S) | (opcodes::FE_PREFIX, opcodes::FE_LDLOC) => self.local_operand(),
            _ => None,
        }
    }

    /// Index of the local variable this instruction stores (`stloc` family)
    #[must_use]
    pub fn local_store_index(&self) -> Option<u16> {
        match (self.prefix, self.opcode) {
            (0, opcodes::STLOC_0..=opcodes::STLOC_3) => {
                Some(u16::from(self.opcode - opcodes::STLOC_0))
            }
            (0, opcodes::STLOC_S) | (opcodes::FE_PREFIX, opcodes::FE_STLOC) => self.local_operand(),
            _ => None,
        }
    }

    /// True for `ldnull`
    #[must_use]
    pub fn is_ldnull(&self) -> bool {
        self.prefix == 0 && self.opcode == opcodes::LDNULL
    }

    fn local_operand(&self) -> Option<u16> {
        match self.operand {
            Operand::Local(index) => Some(index),
            _ => None,
        }
    }
}

impl fmt::Debug for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IL_{:04x}: ", self.offset)?;

        if self.prefix != 0 {
            write!(f, "{:02X}:", self.prefix)?;
        }

        write!(f, "{:02X} - {:<12}", self.opcode, self.mnemonic)?;

        match &self.operand {
            Operand::None => {}
            Operand::Immediate(Immediate::Int8(value)) => write!(f, " {value}")?,
            Operand::Immediate(Immediate::Int32(value)) => write!(f, " {value}")?,
            Operand::Target(target) => write!(f, " -> IL_{target:04x}")?,
            Operand::Token(token) => write!(f, " token:0x{:08X}", token.value())?,
            Operand::Local(local) => write!(f, " local:{local}")?,
            Operand::Argument(arg) => write!(f, " arg:{arg}")?,
        }

        write!(f, " | {:?}", self.category)?;
        if self.flow_type != FlowType::Sequential {
            write!(f, " | {:?}", self.flow_type)?;
        }
        if self.stack_behavior.net_effect != 0 {
            write!(f, " | stack:{:+}", self.stack_behavior.net_effect)?;
        }
        Ok(())
    }
}
