//! Rule engine driving an analysis run.
//!
//! The [`Runner`] owns the registered rules and runs them over the analyzed set of a
//! [`MetadataQuery`]: every rule declaring [`RuleTargets::TYPES`] is invoked once per
//! declared type, every rule declaring [`RuleTargets::METHODS`] once per method. Defects
//! go to one [`Defects`] container per run, outcomes are tallied per rule.
//!
//! # Run Lifecycle
//!
//! 1. a fresh [`RunId`] is allocated and [`Rule::initialize`] called for every rule
//! 2. type checks, then method checks, on the [`rayon`] pool unless
//!    [`RunnerConfig::parallel`] is off
//! 3. [`Rule::teardown`] for every rule, once all checks have returned
//!
//! Outcomes and defects never carry over from one run to the next: each call to
//! [`Runner::run`] returns a fresh [`AnalysisReport`], and rules release the state kept for
//! the run in `teardown`. Runs may overlap, on one runner called from several threads or
//! on several runners sharing rule instances; the run id keeps their state apart.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use dotlint::metadata::model::{EventDef, MetadataModelBuilder, MethodDef, TypeDef};
//! use dotlint::rules::{
//!     badpractice::PreferEmptyInstanceOverNull, design::DeclareEventHandlersCorrectly,
//! };
//! use dotlint::{Runner, RunnerConfig};
//!
//! let mut builder = MetadataModelBuilder::new().with_corlib()?;
//! let handler = builder.type_ref("System", "EventHandler");
//! builder.define(
//!     TypeDef::class("Demo", "Button")
//!         .public()
//!         .event(EventDef::new("Click", handler)),
//! )?;
//! let model = builder.build();
//!
//! let mut runner = Runner::new(RunnerConfig::default());
//! runner.add_rule(Arc::new(DeclareEventHandlersCorrectly::new()))?;
//! runner.add_rule(Arc::new(PreferEmptyInstanceOverNull::new()))?;
//!
//! let report = runner.run(&model);
//! assert!(report.defects.is_empty());
//! assert_eq!(report.summary.rule("DeclareEventHandlersCorrectly").map(|r| r.success), Some(1));
//! # Ok::<(), dotlint::Error>(())
//! ```

use std::{
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use rayon::prelude::*;
use tracing::{debug, info, info_span};

use crate::{
    defects::Defects,
    metadata::{method::MethodRc, query::MetadataQuery, typesystem::CilTypeRc},
    rules::{Rule, RuleContext, RuleResult, RuleTargets, RunId},
    Error::DuplicateRule,
    Result,
};

/// Configuration of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunnerConfig {
    /// Run entity checks on the rayon thread pool
    pub parallel: bool,
    /// Invoke rules on declared types
    pub check_types: bool,
    /// Invoke rules on methods
    pub check_methods: bool,
    /// Drop defects identical to one already reported in the same run
    pub deduplicate_defects: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            check_types: true,
            check_methods: true,
            deduplicate_defects: true,
        }
    }
}

impl RunnerConfig {
    /// Default configuration, checking entities one after the other on the calling thread
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }
}

/// Outcome counts of one rule over one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSummary {
    /// Name of the rule
    pub name: &'static str,
    /// Entities outside the rule's domain
    pub does_not_apply: usize,
    /// Entities checked without findings
    pub success: usize,
    /// Entities with at least one defect
    pub failure: usize,
}

/// Totals of one analysis run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Number of declared types checked
    pub types: usize,
    /// Number of methods checked
    pub methods: usize,
    /// Number of defects recorded
    pub defects: usize,
    /// Outcome counts per rule, in registration order
    pub rules: Vec<RuleSummary>,
}

impl RunSummary {
    /// Outcome counts of the rule named `name`
    #[must_use]
    pub fn rule(&self, name: &str) -> Option<&RuleSummary> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    /// Number of invocations that reported defects, over all rules
    #[must_use]
    pub fn failures(&self) -> usize {
        self.rules.iter().map(|rule| rule.failure).sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} types, {} methods, {} defects",
            self.types, self.methods, self.defects
        )?;
        for rule in &self.rules {
            writeln!(
                f,
                "  {}: {} failed, {} passed, {} not applicable",
                rule.name, rule.failure, rule.success, rule.does_not_apply
            )?;
        }
        Ok(())
    }
}

/// Result of [`Runner::run`]
#[derive(Debug)]
pub struct AnalysisReport {
    /// Every defect reported during the run
    pub defects: Defects,
    /// Outcome counts of the run
    pub summary: RunSummary,
}

/// Outcome counters of one rule, shared by the workers of a run
#[derive(Default)]
struct Tally {
    does_not_apply: AtomicUsize,
    success: AtomicUsize,
    failure: AtomicUsize,
}

impl Tally {
    fn record(&self, result: RuleResult) {
        let counter = match result {
            RuleResult::DoesNotApply => &self.does_not_apply,
            RuleResult::Success => &self.success,
            RuleResult::Failure => &self.failure,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn summary(&self, name: &'static str) -> RuleSummary {
        RuleSummary {
            name,
            does_not_apply: self.does_not_apply.load(Ordering::Relaxed),
            success: self.success.load(Ordering::Relaxed),
            failure: self.failure.load(Ordering::Relaxed),
        }
    }
}

/// Drives registered rules over the analyzed set of a metadata model.
pub struct Runner {
    config: RunnerConfig,
    rules: Vec<Arc<dyn Rule>>,
}

impl Runner {
    /// Creates a runner without rules
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Runner {
            config,
            rules: Vec::new(),
        }
    }

    /// The configuration runs use
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Registers a rule.
    ///
    /// # Errors
    /// Returns [`crate::Error::DuplicateRule`] if a rule with the same name is registered.
    pub fn add_rule(&mut self, rule: Arc<dyn Rule>) -> Result<()> {
        let name = rule.info().name;
        if self.rules.iter().any(|known| known.info().name == name) {
            return Err(DuplicateRule(name.to_string()));
        }

        self.rules.push(rule);
        Ok(())
    }

    /// The registered rules, in registration order
    #[must_use]
    pub fn rules(&self) -> &[Arc<dyn Rule>] {
        &self.rules
    }

    /// Runs every registered rule over the analyzed set of `model`
    pub fn run(&self, model: &dyn MetadataQuery) -> AnalysisReport {
        let types = if self.config.check_types {
            model.analyzed_types()
        } else {
            Vec::new()
        };
        let methods = if self.config.check_methods {
            model.analyzed_methods()
        } else {
            Vec::new()
        };

        let run = RunId::next();
        let span = info_span!(
            "analysis_run",
            %run,
            rules = self.rules.len(),
            types = types.len(),
            methods = methods.len()
        );
        let _guard = span.enter();

        for rule in &self.rules {
            rule.initialize(model, run);
        }

        let defects = if self.config.deduplicate_defects {
            Defects::deduplicating()
        } else {
            Defects::new()
        };
        let tallies: Vec<Tally> = self.rules.iter().map(|_| Tally::default()).collect();

        let check_type = |ty: &CilTypeRc| {
            for (rule, tally) in self.rules_for(RuleTargets::TYPES, &tallies) {
                let context = RuleContext::new(model, &defects, rule.info().name, run);
                tally.record(rule.check_type(ty, &context));
            }
        };
        let check_method = |method: &MethodRc| {
            for (rule, tally) in self.rules_for(RuleTargets::METHODS, &tallies) {
                let context = RuleContext::new(model, &defects, rule.info().name, run);
                tally.record(rule.check_method(method, &context));
            }
        };

        if self.config.parallel {
            types.par_iter().for_each(check_type);
            methods.par_iter().for_each(check_method);
        } else {
            types.iter().for_each(check_type);
            methods.iter().for_each(check_method);
        }

        // every check has returned, run-scoped state can go
        for rule in &self.rules {
            debug!(rule = rule.info().name, %run, "teardown");
            rule.teardown(run);
        }

        let summary = RunSummary {
            types: types.len(),
            methods: methods.len(),
            defects: defects.count(),
            rules: self
                .rules
                .iter()
                .zip(&tallies)
                .map(|(rule, tally)| tally.summary(rule.info().name))
                .collect(),
        };
        info!(
            types = summary.types,
            methods = summary.methods,
            defects = summary.defects,
            failures = summary.failures(),
            "analysis run complete"
        );

        AnalysisReport { defects, summary }
    }

    fn rules_for<'a>(
        &'a self,
        target: RuleTargets,
        tallies: &'a [Tally],
    ) -> impl Iterator<Item = (&'a Arc<dyn Rule>, &'a Tally)> {
        self.rules
            .iter()
            .zip(tallies)
            .filter(move |(rule, _)| rule.targets().contains(target))
    }
}
