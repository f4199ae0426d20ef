// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # dotlint
//!
//! [![Crates.io](https://img.shields.io/crates/v/dotlint.svg)](https://crates.io/crates/dotlint)
//! [![Documentation](https://docs.rs/dotlint/badge.svg)](https://docs.rs/dotlint)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/dotlint/blob/main/LICENSE-APACHE)
//!
//! A rule-based static analyzer for .NET programs. `dotlint` inspects the metadata of a
//! compiled program (types, members, signatures and CIL method bodies) and reports
//! defects, violations of structural or semantic conventions, without executing anything.
//!
//! This crate is the rule execution core: the contract a rule implements, the resolution
//! service rules query, the defect reporting protocol and the runner that drives rules
//! over thousands of entities in parallel. Loading binaries, selecting rules from a
//! command line and rendering reports are left to the embedding tool.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dotlint::prelude::*;
//!
//! let mut builder = MetadataModelBuilder::new().with_corlib()?;
//! let args = builder.well_known(WellKnownType::EventArgs);
//! let handler = builder
//!     .define(
//!         TypeDef::delegate("Demo", "ClosedHandler")
//!             .public()
//!             .method(
//!                 MethodDef::invoke(TypeSignature::Void)
//!                     .param("source", TypeSignature::Object)
//!                     .param("e", args),
//!             ),
//!     )?
//!     .signature();
//! builder.define(
//!     TypeDef::class("Demo", "Door")
//!         .public()
//!         .event(EventDef::new("Closed", handler)),
//! )?;
//! let model = builder.build();
//!
//! let mut runner = Runner::new(RunnerConfig::default());
//! runner.add_rule(Arc::new(DeclareEventHandlersCorrectly::new()))?;
//!
//! let report = runner.run(&model);
//! for defect in report.defects.iter() {
//!     println!("{defect}");
//! }
//! assert_eq!(report.defects.count(), 1);
//! # Ok::<(), dotlint::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - Read-only model of the analyzed program and the
//!   [`metadata::query::MetadataQuery`] resolution service
//! - [`assembly`] - Decoded CIL instructions and a builder for method bodies
//! - [`analysis`] - Instruction-level analyses shared by rules
//! - [`rules`] - The [`rules::Rule`] contract and the rule catalog
//! - [`defects`] - Defects and the concurrent reporter collecting them
//! - [`Runner`] - The engine driving rules over a model
//! - [`Error`] and [`Result`] - Errors of model construction and runner setup
//!
//! ## Error Handling
//!
//! Rule execution has no error path. A reference that cannot be resolved, an open generic
//! type or an incomplete signature makes the dependent check not apply; it is never
//! reported as a defect and never fails the run. Only building a model and registering
//! rules return [`Result`].
//!
//! ## Logging
//!
//! The crate emits [`tracing`] spans and events (an `analysis_run` span per run, skipped
//! entities at trace level) and never installs a subscriber.
#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotlint::prelude::*;
///
/// let model = MetadataModelBuilder::new().with_corlib()?.build();
/// let report = Runner::new(RunnerConfig::sequential()).run(&model);
/// assert!(report.defects.is_empty());
/// # Ok::<(), dotlint::Error>(())
/// ```
pub mod prelude;

/// Instruction-level analyses shared by rules
pub mod analysis;

/// CIL instructions, opcodes and method body construction
pub mod assembly;

/// Defects and the reporter collecting them
pub mod defects;

/// Read-only metadata model and resolution service
pub mod metadata;

/// The rule contract and the rule catalog
pub mod rules;

/// The engine driving rules over a metadata model
pub mod runner;

/// `dotlint` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `dotlint` Error type
///
/// Raised while building a metadata model or configuring a [`Runner`], never by a rule.
pub use error::Error;

/// The rule engine and its configuration.
///
/// See [`runner`] for the run lifecycle.
pub use runner::{AnalysisReport, Runner, RunnerConfig};
