//! CIL opcode byte constants (ECMA-335).
//!
//! Raw byte values of the opcodes this crate builds and inspects. Single-byte opcodes are
//! named after their mnemonic (e.g. [`CALL`] = `0x28`). Two-byte opcodes share the first
//! byte [`FE_PREFIX`] and have their second byte stored with an `FE_` prefix.
#![allow(missing_docs)]

// Misc
pub const NOP: u8 = 0x00;

// Load argument / local shorthand
pub const LDARG_0: u8 = 0x02;
pub const LDLOC_0: u8 = 0x06;
pub const LDLOC_3: u8 = 0x09;
pub const STLOC_0: u8 = 0x0A;
pub const STLOC_3: u8 = 0x0D;

// Load/store argument/local (short form)
pub const LDARG_S: u8 = 0x0E;
pub const LDLOC_S: u8 = 0x11;
pub const STLOC_S: u8 = 0x13;

// Null / constant loaders
pub const LDNULL: u8 = 0x14;
pub const LDC_I4_M1: u8 = 0x15;
pub const LDC_I4_S: u8 = 0x1F;
pub const LDC_I4: u8 = 0x20;

// Stack manipulation
pub const DUP: u8 = 0x25;
pub const POP: u8 = 0x26;

// Call / return
pub const CALL: u8 = 0x28;
pub const RET: u8 = 0x2A;

// Branch (long form)
pub const BR: u8 = 0x38;
pub const BRFALSE: u8 = 0x39;
pub const BRTRUE: u8 = 0x3A;

// Object model
pub const CALLVIRT: u8 = 0x6F;
pub const LDSTR: u8 = 0x72;
pub const NEWOBJ: u8 = 0x73;
pub const THROW: u8 = 0x7A;
pub const LDFLD: u8 = 0x7B;
pub const LDSFLD: u8 = 0x7E;
pub const NEWARR: u8 = 0x8D;

// Exception handling
pub const LEAVE: u8 = 0xDD;

// Two-byte opcodes; the first byte is always FE_PREFIX
pub const FE_PREFIX: u8 = 0xFE;
pub const FE_LDARG: u8 = 0x09;
pub const FE_LDLOC: u8 = 0x0C;
pub const FE_STLOC: u8 = 0x0E;
