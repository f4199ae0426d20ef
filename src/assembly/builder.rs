//! Fluent construction of decoded method bodies.
//!
//! [`InstructionBuilder`] lays out instructions at their encoded offsets, picks the
//! shortest encoding for local, argument and constant operands, and resolves branch labels
//! when the body is finished. It produces the same [`MethodBody`] a metadata front end
//! decodes from a binary, which makes it the way to hand-assemble bodies for analysis.
//!
//! # Examples
//!
//! The body a debug build of `return null;` compiles to:
//!
//! ```rust
//! use dotlint::assembly::InstructionBuilder;
//!
//! let body = InstructionBuilder::new()
//!     .nop()
//!     .ldnull()
//!     .stloc(0)
//!     .br("exit")
//!     .label("exit")
//!     .ldloc(0)
//!     .ret()
//!     .build()?;
//!
//! assert_eq!(body.instructions.len(), 6);
//! assert_eq!(body.local_count, 1);
//! # Ok::<(), dotlint::Error>(())
//! ```

use std::collections::HashMap;

use crate::{
    assembly::{
        opcodes, FlowType, Immediate, Instruction, InstructionCategory, Operand, StackBehavior,
    },
    metadata::{method::MethodBody, token::Token},
    Result,
};

const LDARG_SHORT: [&str; 4] = ["ldarg.0", "ldarg.1", "ldarg.2", "ldarg.3"];
const LDLOC_SHORT: [&str; 4] = ["ldloc.0", "ldloc.1", "ldloc.2", "ldloc.3"];
const STLOC_SHORT: [&str; 4] = ["stloc.0", "stloc.1", "stloc.2", "stloc.3"];
const LDC_I4_SHORT: [&str; 10] = [
    "ldc.i4.m1", "ldc.i4.0", "ldc.i4.1", "ldc.i4.2", "ldc.i4.3", "ldc.i4.4", "ldc.i4.5",
    "ldc.i4.6", "ldc.i4.7", "ldc.i4.8",
];

/// Builds a [`MethodBody`] instruction by instruction.
///
/// Errors (undefined or duplicate labels) are collected and reported by
/// [`InstructionBuilder::build`], so the chain itself never fails.
#[derive(Default)]
pub struct InstructionBuilder {
    instructions: Vec<Instruction>,
    offset: u64,
    /// Defined label positions (label_name -> offset)
    labels: HashMap<String, u64>,
    /// Branches awaiting label resolution (instruction index, label)
    fixups: Vec<(usize, String)>,
    local_count: usize,
    error: Option<String>,
}

impl InstructionBuilder {
    /// Creates an empty builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    fn emit(
        mut self,
        prefix: u8,
        opcode: u8,
        mnemonic: &'static str,
        size: u64,
        category: InstructionCategory,
        flow_type: FlowType,
        operand: Operand,
        stack_behavior: StackBehavior,
    ) -> Self {
        self.instructions.push(Instruction {
            offset: self.offset,
            size,
            opcode,
            prefix,
            mnemonic,
            category,
            flow_type,
            operand,
            stack_behavior,
            branch_targets: Vec::new(),
        });
        self.offset += size;
        self
    }

    fn simple(
        self,
        opcode: u8,
        mnemonic: &'static str,
        category: InstructionCategory,
        flow_type: FlowType,
        stack: StackBehavior,
    ) -> Self {
        self.emit(0, opcode, mnemonic, 1, category, flow_type, Operand::None, stack)
    }

    fn with_token(
        self,
        opcode: u8,
        mnemonic: &'static str,
        token: u32,
        category: InstructionCategory,
        flow_type: FlowType,
        stack: StackBehavior,
    ) -> Self {
        self.emit(
            0,
            opcode,
            mnemonic,
            5,
            category,
            flow_type,
            Operand::Token(Token::new(token)),
            stack,
        )
    }

    fn branch(
        mut self,
        opcode: u8,
        mnemonic: &'static str,
        label: &str,
        flow_type: FlowType,
        pops: u8,
    ) -> Self {
        self.fixups.push((self.instructions.len(), label.to_string()));
        self.emit(
            0,
            opcode,
            mnemonic,
            5,
            InstructionCategory::ControlFlow,
            flow_type,
            Operand::Target(0),
            StackBehavior::new(pops, 0),
        )
    }

    fn local(
        mut self,
        index: u16,
        short: &[&'static str; 4],
        base: u8,
        short_form: (u8, &'static str),
        long_form: (u8, &'static str),
        stack: StackBehavior,
    ) -> Self {
        self.local_count = self.local_count.max(usize::from(index) + 1);
        let category = InstructionCategory::LoadStore;
        let flow = FlowType::Sequential;

        match index {
            0..=3 => {
                let slot = index as u8;
                self.emit(
                    0,
                    base + slot,
                    short[usize::from(slot)],
                    1,
                    category,
                    flow,
                    Operand::Local(index),
                    stack,
                )
            }
            4..=255 => self.emit(
                0,
                short_form.0,
                short_form.1,
                2,
                category,
                flow,
                Operand::Local(index),
                stack,
            ),
            _ => self.emit(
                opcodes::FE_PREFIX,
                long_form.0,
                long_form.1,
                4,
                category,
                flow,
                Operand::Local(index),
                stack,
            ),
        }
    }

    /// Marks the position of the next instruction with `name`
    #[must_use]
    pub fn label(mut self, name: &str) -> Self {
        if self.labels.insert(name.to_string(), self.offset).is_some() && self.error.is_none() {
            self.error = Some(format!("Label '{name}' is defined twice"));
        }
        self
    }

    /// Declares at least `count` local variables
    #[must_use]
    pub fn locals(mut self, count: usize) -> Self {
        self.local_count = self.local_count.max(count);
        self
    }

    /// `nop`
    #[must_use]
    pub fn nop(self) -> Self {
        self.simple(
            opcodes::NOP,
            "nop",
            InstructionCategory::Misc,
            FlowType::Sequential,
            StackBehavior::new(0, 0),
        )
    }

    /// `ldnull`
    #[must_use]
    pub fn ldnull(self) -> Self {
        self.simple(
            opcodes::LDNULL,
            "ldnull",
            InstructionCategory::LoadStore,
            FlowType::Sequential,
            StackBehavior::new(0, 1),
        )
    }

    /// `dup`
    #[must_use]
    pub fn dup(self) -> Self {
        self.simple(
            opcodes::DUP,
            "dup",
            InstructionCategory::Misc,
            FlowType::Sequential,
            StackBehavior::new(1, 2),
        )
    }

    /// `pop`
    #[must_use]
    pub fn pop(self) -> Self {
        self.simple(
            opcodes::POP,
            "pop",
            InstructionCategory::Misc,
            FlowType::Sequential,
            StackBehavior::new(1, 0),
        )
    }

    /// `ret`, returning the value on top of the stack
    #[must_use]
    pub fn ret(self) -> Self {
        self.simple(
            opcodes::RET,
            "ret",
            InstructionCategory::ControlFlow,
            FlowType::Return,
            StackBehavior::new(1, 0),
        )
    }

    /// `throw`
    #[must_use]
    pub fn throw(self) -> Self {
        self.simple(
            opcodes::THROW,
            "throw",
            InstructionCategory::ControlFlow,
            FlowType::Throw,
            StackBehavior::new(1, 0),
        )
    }

    /// `ldarg` in its shortest encoding
    #[must_use]
    pub fn ldarg(self, index: u16) -> Self {
        let stack = StackBehavior::new(0, 1);
        let category = InstructionCategory::LoadStore;
        let flow = FlowType::Sequential;
        let operand = Operand::Argument(index);

        match index {
            0..=3 => {
                let slot = index as u8;
                self.emit(
                    0,
                    opcodes::LDARG_0 + slot,
                    LDARG_SHORT[usize::from(slot)],
                    1,
                    category,
                    flow,
                    operand,
                    stack,
                )
            }
            4..=255 => self.emit(0, opcodes::LDARG_S, "ldarg.s", 2, category, flow, operand, stack),
            _ => self.emit(
                opcodes::FE_PREFIX,
                opcodes::FE_LDARG,
                "ldarg",
                4,
                category,
                flow,
                operand,
                stack,
            ),
        }
    }

    /// `ldloc` in its shortest encoding
    #[must_use]
    pub fn ldloc(self, index: u16) -> Self {
        self.local(
            index,
            &LDLOC_SHORT,
            opcodes::LDLOC_0,
            (opcodes::LDLOC_S, "ldloc.s"),
            (opcodes::FE_LDLOC, "ldloc"),
            StackBehavior::new(0, 1),
        )
    }

    /// `stloc` in its shortest encoding
    #[must_use]
    pub fn stloc(self, index: u16) -> Self {
        self.local(
            index,
            &STLOC_SHORT,
            opcodes::STLOC_0,
            (opcodes::STLOC_S, "stloc.s"),
            (opcodes::FE_STLOC, "stloc"),
            StackBehavior::new(1, 0),
        )
    }

    /// `ldc.i4` in its shortest encoding
    #[must_use]
    pub fn ldc_i4(self, value: i32) -> Self {
        let stack = StackBehavior::new(0, 1);
        let category = InstructionCategory::LoadStore;
        let flow = FlowType::Sequential;

        match value {
            -1..=8 => {
                let slot = u8::try_from(value + 1).unwrap_or_default();
                self.emit(
                    0,
                    opcodes::LDC_I4_M1 + slot,
                    LDC_I4_SHORT[usize::from(slot)],
                    1,
                    category,
                    flow,
                    Operand::Immediate(Immediate::Int32(value)),
                    stack,
                )
            }
            _ => match i8::try_from(value) {
                Ok(short) => self.emit(
                    0,
                    opcodes::LDC_I4_S,
                    "ldc.i4.s",
                    2,
                    category,
                    flow,
                    Operand::Immediate(Immediate::Int8(short)),
                    stack,
                ),
                Err(_) => self.emit(
                    0,
                    opcodes::LDC_I4,
                    "ldc.i4",
                    5,
                    category,
                    flow,
                    Operand::Immediate(Immediate::Int32(value)),
                    stack,
                ),
            },
        }
    }

    /// `ldstr` of the user string `token`
    #[must_use]
    pub fn ldstr(self, token: u32) -> Self {
        self.with_token(
            opcodes::LDSTR,
            "ldstr",
            token,
            InstructionCategory::ObjectModel,
            FlowType::Sequential,
            StackBehavior::new(0, 1),
        )
    }

    /// `ldfld` of the field `token`
    #[must_use]
    pub fn ldfld(self, token: u32) -> Self {
        self.with_token(
            opcodes::LDFLD,
            "ldfld",
            token,
            InstructionCategory::ObjectModel,
            FlowType::Sequential,
            StackBehavior::new(1, 1),
        )
    }

    /// `ldsfld` of the static field `token`
    #[must_use]
    pub fn ldsfld(self, token: u32) -> Self {
        self.with_token(
            opcodes::LDSFLD,
            "ldsfld",
            token,
            InstructionCategory::ObjectModel,
            FlowType::Sequential,
            StackBehavior::new(0, 1),
        )
    }

    /// `call` of a static, parameterless method returning a value
    #[must_use]
    pub fn call(self, token: u32) -> Self {
        self.with_token(
            opcodes::CALL,
            "call",
            token,
            InstructionCategory::ControlFlow,
            FlowType::Call,
            StackBehavior::new(0, 1),
        )
    }

    /// `callvirt` of a parameterless instance method returning a value
    #[must_use]
    pub fn callvirt(self, token: u32) -> Self {
        self.with_token(
            opcodes::CALLVIRT,
            "callvirt",
            token,
            InstructionCategory::ControlFlow,
            FlowType::Call,
            StackBehavior::new(1, 1),
        )
    }

    /// `newobj` of a parameterless constructor
    #[must_use]
    pub fn newobj(self, token: u32) -> Self {
        self.with_token(
            opcodes::NEWOBJ,
            "newobj",
            token,
            InstructionCategory::ObjectModel,
            FlowType::Call,
            StackBehavior::new(0, 1),
        )
    }

    /// `newarr` of element type `token`, the length being on the stack
    #[must_use]
    pub fn newarr(self, token: u32) -> Self {
        self.with_token(
            opcodes::NEWARR,
            "newarr",
            token,
            InstructionCategory::ObjectModel,
            FlowType::Sequential,
            StackBehavior::new(1, 1),
        )
    }

    /// `br` to `label`
    #[must_use]
    pub fn br(self, label: &str) -> Self {
        self.branch(opcodes::BR, "br", label, FlowType::UnconditionalBranch, 0)
    }

    /// `brtrue` to `label`
    #[must_use]
    pub fn brtrue(self, label: &str) -> Self {
        self.branch(opcodes::BRTRUE, "brtrue", label, FlowType::ConditionalBranch, 1)
    }

    /// `brfalse` to `label`
    #[must_use]
    pub fn brfalse(self, label: &str) -> Self {
        self.branch(opcodes::BRFALSE, "brfalse", label, FlowType::ConditionalBranch, 1)
    }

    /// `leave` to `label`
    #[must_use]
    pub fn leave(self, label: &str) -> Self {
        self.branch(opcodes::LEAVE, "leave", label, FlowType::Leave, 0)
    }

    /// Resolves all labels and returns the finished body
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if a branch targets an undefined label or a label
    /// is defined twice.
    pub fn build(mut self) -> Result<MethodBody> {
        if let Some(message) = self.error.take() {
            return Err(malformed_error!(message));
        }

        for (index, label) in &self.fixups {
            let Some(&target) = self.labels.get(label) else {
                return Err(malformed_error!("Branch to undefined label '{}'", label));
            };

            let instruction = &mut self.instructions[*index];
            instruction.operand = Operand::Target(target);
            instruction.branch_targets = vec![target];
        }

        let mut depth: i32 = 0;
        let mut max_stack: i32 = 0;
        for instruction in &self.instructions {
            depth = (depth + i32::from(instruction.stack_behavior.net_effect)).max(0);
            max_stack = max_stack.max(depth);
        }

        Ok(MethodBody::new(
            self.instructions,
            usize::try_from(max_stack).unwrap_or_default(),
            self.local_count,
        ))
    }
}
