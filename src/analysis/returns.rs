//! Detection of `null` literals flowing into `ret`.
//!
//! [`NullReturnScanner`] finds every `ret` instruction of a method body that can return
//! the constant `null`. Compilers rarely emit `ldnull; ret` back to back: debug builds
//! store the return value in a local and jump to a shared exit block, and conditional
//! expressions merge several values at one `ret`. The scanner therefore traces the
//! returned value backwards along every control-flow predecessor:
//!
//! ```text
//! IL_0000: ldnull
//! IL_0001: stloc.0
//! IL_0002: br IL_0007
//! IL_0007: ldloc.0      <- traced through the store that reaches this load
//! IL_0008: ret          <- reported
//! ```
//!
//! Tracing passes through `nop`, unconditional `br` and `dup`, and through local
//! variables (a load is followed back to every store of the same local reaching it).
//! Any other producer ends the trace for that path. Each `ret` is reported at most once,
//! however many `null` paths reach it.

use std::collections::HashSet;

use tracing::trace;

use crate::{
    assembly::{FlowType, Instruction},
    metadata::method::MethodBody,
};

/// Default bound on how many producers a returned value is traced through
pub const DEFAULT_MAX_TRACE_DEPTH: usize = 16;

/// Flags every `ret` of a method body that can return a `null` literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NullReturnScanner {
    /// Upper bound on the number of producers followed back from one `ret`
    pub max_trace_depth: usize,
}

impl Default for NullReturnScanner {
    fn default() -> Self {
        NullReturnScanner {
            max_trace_depth: DEFAULT_MAX_TRACE_DEPTH,
        }
    }
}

/// Control-flow predecessors of each instruction, by index
struct Predecessors(Vec<Vec<usize>>);

impl Predecessors {
    fn build(body: &MethodBody) -> Self {
        let count = body.instructions.len();
        let mut predecessors = vec![Vec::new(); count];

        for (index, instruction) in body.instructions.iter().enumerate() {
            if instruction.falls_through() && index + 1 < count {
                predecessors[index + 1].push(index);
            }
            for target in instruction.get_targets() {
                if let Some(target) = body.index_of(*target) {
                    predecessors[target].push(index);
                }
            }
        }

        Predecessors(predecessors)
    }

    fn of(&self, index: usize) -> &[usize] {
        &self.0[index]
    }
}

struct Trace<'a> {
    instructions: &'a [Instruction],
    predecessors: Predecessors,
    max_depth: usize,
}

impl Trace<'_> {
    /// Can the value on top of the stack right before `at` be a `null` literal?
    fn top_may_be_null(&self, at: usize, depth: usize) -> bool {
        if depth > self.max_depth {
            trace!(offset = self.instructions[at].offset, "null trace depth exhausted");
            return false;
        }

        self.predecessors
            .of(at)
            .iter()
            .any(|&producer| self.produces_null(producer, depth + 1))
    }

    /// Does `index` leave a `null` literal on top of the stack?
    fn produces_null(&self, index: usize, depth: usize) -> bool {
        let instruction = &self.instructions[index];

        if instruction.is_ldnull() {
            return true;
        }

        if let Some(local) = instruction.local_load_index() {
            return self.stored_may_be_null(index, local, depth);
        }

        match (instruction.mnemonic, instruction.flow_type) {
            // the value underneath passes through unchanged
            ("nop" | "dup", _) | (_, FlowType::UnconditionalBranch) => {
                self.top_may_be_null(index, depth)
            }
            _ => false,
        }
    }

    /// Can a store of `null` into `local` reach the load at `load`?
    fn stored_may_be_null(&self, load: usize, local: u16, depth: usize) -> bool {
        let mut visited = HashSet::new();
        let mut pending: Vec<usize> = self.predecessors.of(load).to_vec();

        while let Some(index) = pending.pop() {
            if !visited.insert(index) {
                continue;
            }

            if self.instructions[index].local_store_index() == Some(local) {
                // the store kills older definitions on this path
                if self.top_may_be_null(index, depth) {
                    return true;
                }
                continue;
            }

            pending.extend_from_slice(self.predecessors.of(index));
        }

        false
    }
}

impl NullReturnScanner {
    /// Creates a scanner with the default trace depth
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the trace depth
    #[must_use]
    pub fn with_max_trace_depth(mut self, max_trace_depth: usize) -> Self {
        self.max_trace_depth = max_trace_depth;
        self
    }

    /// Returns the `ret` instructions of `body` that can return a `null` literal, in
    /// offset order
    #[must_use]
    pub fn scan<'a>(&self, body: &'a MethodBody) -> Vec<&'a Instruction> {
        let trace = Trace {
            instructions: &body.instructions,
            predecessors: Predecessors::build(body),
            max_depth: self.max_trace_depth,
        };

        body.instructions
            .iter()
            .enumerate()
            .filter(|(_, instruction)| instruction.flow_type == FlowType::Return)
            .filter(|(index, _)| trace.top_may_be_null(*index, 0))
            .map(|(_, instruction)| instruction)
            .collect()
    }
}
