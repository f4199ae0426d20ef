//! # dotlint Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotlint library. Import this module to get quick access to everything needed
//! to build a metadata model, register rules and run them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotlint operations
pub use crate::Error;

/// The result type used throughout dotlint
pub use crate::Result;

// ================================================================================================
// Rule Engine
// ================================================================================================

/// The runner, its configuration and the outcome of a run
pub use crate::runner::{AnalysisReport, RuleSummary, RunSummary, Runner, RunnerConfig};

/// The rule contract
pub use crate::rules::{
    ReturnNullRule, Rule, RuleContext, RuleInfo, RuleResult, RuleTargets, RunId,
};

/// Rules of the catalog
pub use crate::rules::{
    badpractice::PreferEmptyInstanceOverNull, design::DeclareEventHandlersCorrectly,
};

// ================================================================================================
// Defect Reporting
// ================================================================================================

/// Defects and the reporter collecting them
pub use crate::defects::{Confidence, Defect, DefectTarget, Defects, Severity};

// ================================================================================================
// Metadata Model
// ================================================================================================

/// Metadata token type for referencing table entries
pub use crate::metadata::token::Token;

/// Core type system components
pub use crate::metadata::typesystem::{CilFlavor, CilType, CilTypeRc, TypeRegistry};

/// Members of declared types
pub use crate::metadata::{
    event::{Event, EventRc},
    method::{Method, MethodAccessFlags, MethodBody, MethodModifiers, MethodRc},
};

/// Type and method signatures
pub use crate::metadata::signatures::{SignatureMethod, SignatureParameter, TypeSignature};

/// The resolution service
pub use crate::metadata::query::{Capability, MetadataQuery, WellKnownType};

/// The in-memory model and its builder
pub use crate::metadata::model::{
    EventDef, MetadataModel, MetadataModelBuilder, MethodDef, TypeDef,
};

// ================================================================================================
// Instructions and Analysis
// ================================================================================================

/// Decoded CIL instructions and the method body builder
pub use crate::assembly::{FlowType, Instruction, InstructionBuilder, Operand};

/// Detection of returned null literals
pub use crate::analysis::NullReturnScanner;
