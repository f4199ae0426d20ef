//! Rule contract and rule catalog.
//!
//! A [`Rule`] is the unit of analysis the [`crate::Runner`] drives: it is invoked once
//! per applicable entity of the analyzed program, inspects it through the
//! [`MetadataQuery`] available from its [`RuleContext`], reports zero or more defects and
//! answers with a [`RuleResult`].
//!
//! # Lifecycle
//!
//! The runner calls [`Rule::initialize`] once before a run, the check operations once per
//! entity (possibly from several worker threads at the same time) and [`Rule::teardown`]
//! once after every check of the run has completed. A rule instance can be reused for any
//! number of runs, and runs of different runners may overlap on the same instance. Every
//! run carries its own [`RunId`]: state a rule keeps between checks is keyed by it and
//! released in `teardown`.
//!
//! # Applicability
//!
//! Rules reject entities outside their domain before doing any resolution work and
//! answer [`RuleResult::DoesNotApply`]. Unresolvable references, open generic types and
//! incomplete metadata are routine inputs: the dependent check is skipped, nothing is
//! reported and no error is raised.
//!
//! # Catalog
//!
//! - [`design::DeclareEventHandlersCorrectly`] - Event delegates follow the
//!   `void (object sender, EventArgs e)` convention
//! - [`badpractice::PreferEmptyInstanceOverNull`] - Methods returning strings, arrays or
//!   collections return empty instances rather than `null`
//!
//! # Examples
//!
//! ```rust
//! use dotlint::defects::Defects;
//! use dotlint::metadata::model::{MetadataModelBuilder, TypeDef};
//! use dotlint::metadata::query::MetadataQuery;
//! use dotlint::rules::{
//!     design::DeclareEventHandlersCorrectly, Rule, RuleContext, RuleResult, RunId,
//! };
//!
//! let mut builder = MetadataModelBuilder::new().with_corlib()?;
//! builder.define(TypeDef::class("Demo", "Silent").public())?;
//! let model = builder.build();
//!
//! let defects = Defects::new();
//! let rule = DeclareEventHandlersCorrectly::new();
//! let run = RunId::next();
//!
//! rule.initialize(&model, run);
//! for ty in model.analyzed_types() {
//!     let context = RuleContext::new(&model, &defects, rule.info().name, run);
//!     // no events, nothing to check
//!     assert_eq!(rule.check_type(&ty, &context), RuleResult::DoesNotApply);
//! }
//! rule.teardown(run);
//! # Ok::<(), dotlint::Error>(())
//! ```

pub mod badpractice;
mod context;
pub mod design;
mod nullreturn;

pub use context::RuleContext;
pub use nullreturn::ReturnNullRule;

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use bitflags::bitflags;
use strum::Display;

use crate::metadata::{method::MethodRc, query::MetadataQuery, typesystem::CilTypeRc};

/// Outcome of one rule invocation on one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RuleResult {
    /// The entity is outside the rule's domain; neither a finding nor a success
    DoesNotApply,
    /// The rule applied and found nothing
    Success,
    /// The rule applied and reported at least one defect
    Failure,
}

bitflags! {
    /// Entity kinds a rule has check operations for
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct RuleTargets: u8 {
        /// The rule implements [`Rule::check_type`]
        const TYPES = 0x01;
        /// The rule implements [`Rule::check_method`]
        const METHODS = 0x02;
    }
}

static NEXT_RUN: AtomicU64 = AtomicU64::new(1);

/// Identity of one analysis run.
///
/// Ids are unique within the process, so run-scoped state of a rule shared by several
/// runners never mixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId(u64);

impl RunId {
    /// Allocates a fresh id
    #[must_use]
    pub fn next() -> Self {
        RunId(NEXT_RUN.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw value of the id
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run#{}", self.0)
    }
}

/// Descriptive metadata of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleInfo {
    /// Unique name of the rule, stamped on every defect it reports
    pub name: &'static str,
    /// What is wrong with code that triggers the rule
    pub problem: &'static str,
    /// How to fix it
    pub solution: &'static str,
}

/// A diagnostic rule.
///
/// Implementors override the check operations matching the [`RuleTargets`] they declare;
/// the defaults answer [`RuleResult::DoesNotApply`].
///
/// # Thread Safety
///
/// The runner shares one instance across all workers of a run. State kept across checks
/// must tolerate concurrent access; racing checks may repeat work but must not corrupt it
/// or report the same finding twice.
pub trait Rule: Send + Sync {
    /// Name, problem and solution of the rule
    fn info(&self) -> RuleInfo;

    /// Entity kinds this rule checks
    fn targets(&self) -> RuleTargets;

    /// Called once before the first check of `run`
    fn initialize(&self, _model: &dyn MetadataQuery, _run: RunId) {}

    /// Checks one declared type of the analyzed set
    fn check_type(&self, _ty: &CilTypeRc, _context: &RuleContext<'_>) -> RuleResult {
        RuleResult::DoesNotApply
    }

    /// Checks one method of the analyzed set
    fn check_method(&self, _method: &MethodRc, _context: &RuleContext<'_>) -> RuleResult {
        RuleResult::DoesNotApply
    }

    /// Called once after every check of `run` has completed; releases the state kept for it
    fn teardown(&self, _run: RunId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_ids_are_unique() {
        let first = RunId::next();
        let second = RunId::next();
        assert_ne!(first, second);
        assert!(second > first);
        assert_eq!(first.to_string(), format!("run#{}", first.value()));
    }
}
