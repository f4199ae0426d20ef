//! Decoded CIL method bodies.
//!
//! A [`MethodBody`] is the instruction-level view of one method: the decoded instruction
//! stream in offset order plus the header values analyses care about. Bodies are built by
//! the metadata front end, or by hand through [`crate::assembly::InstructionBuilder`].
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4 - Method Header Format

use crate::assembly::Instruction;

/// Describes one method that has been compiled to CIL bytecode.
pub struct MethodBody {
    /// Size of the method (length of all instructions, not counting the header) in bytes
    pub size_code: usize,
    /// Maximum number of items on the operand stack
    pub max_stack: usize,
    /// Number of local variables the method declares
    pub local_count: usize,
    /// Decoded instructions, ordered by offset
    pub instructions: Vec<Instruction>,
}

impl MethodBody {
    /// Creates a body from decoded instructions, which must be sorted by offset
    #[must_use]
    pub fn new(instructions: Vec<Instruction>, max_stack: usize, local_count: usize) -> Self {
        let size_code = instructions
            .last()
            .map_or(0, |last| usize::try_from(last.offset + last.size).unwrap_or(usize::MAX));

        MethodBody {
            size_code,
            max_stack,
            local_count,
            instructions,
        }
    }

    /// Index of the instruction starting at `offset`
    #[must_use]
    pub fn index_of(&self, offset: u64) -> Option<usize> {
        self.instructions
            .binary_search_by_key(&offset, |instruction| instruction.offset)
            .ok()
    }

    /// The instruction starting at `offset`
    #[must_use]
    pub fn instruction_at(&self, offset: u64) -> Option<&Instruction> {
        self.index_of(offset).map(|index| &self.instructions[index])
    }

    /// Number of decoded instructions
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if the body holds no instructions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
