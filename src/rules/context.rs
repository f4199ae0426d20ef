use std::cell::Cell;

use crate::{
    defects::{Confidence, Defect, DefectTarget, Defects, Severity},
    metadata::query::MetadataQuery,
    rules::{RuleResult, RunId},
};

/// Everything one rule invocation works with: read access to the metadata graph and the
/// reporter defects go to.
///
/// A context is created per invocation and counts the reports made through it, which
/// decides between [`RuleResult::Success`] and [`RuleResult::Failure`].
pub struct RuleContext<'a> {
    model: &'a dyn MetadataQuery,
    defects: &'a Defects,
    rule: &'static str,
    run: RunId,
    reported: Cell<usize>,
}

impl<'a> RuleContext<'a> {
    /// Creates the context of one invocation of the rule named `rule` during `run`
    pub fn new(
        model: &'a dyn MetadataQuery,
        defects: &'a Defects,
        rule: &'static str,
        run: RunId,
    ) -> Self {
        RuleContext {
            model,
            defects,
            rule,
            run,
            reported: Cell::new(0),
        }
    }

    /// The metadata graph under analysis
    #[must_use]
    pub fn model(&self) -> &'a dyn MetadataQuery {
        self.model
    }

    /// The run this invocation belongs to
    #[must_use]
    pub fn run(&self) -> RunId {
        self.run
    }

    /// Reports a defect against `target`
    pub fn report(
        &self,
        target: DefectTarget,
        severity: Severity,
        confidence: Confidence,
        message: impl Into<String>,
    ) {
        self.push(Defect::new(self.rule, target, severity, confidence, message));
    }

    /// Reports a defect against `target`, located at the instruction at `offset`
    pub fn report_at(
        &self,
        target: DefectTarget,
        offset: u64,
        severity: Severity,
        confidence: Confidence,
        message: impl Into<String>,
    ) {
        let defect = Defect::new(self.rule, target, severity, confidence, message);
        self.push(defect.with_offset(offset));
    }

    /// Number of reports made through this context, duplicates included
    #[must_use]
    pub fn reported(&self) -> usize {
        self.reported.get()
    }

    /// [`RuleResult::Failure`] if anything was reported, [`RuleResult::Success`] otherwise
    #[must_use]
    pub fn outcome(&self) -> RuleResult {
        if self.reported() > 0 {
            RuleResult::Failure
        } else {
            RuleResult::Success
        }
    }

    fn push(&self, defect: Defect) {
        self.reported.set(self.reported.get() + 1);
        self.defects.push(defect);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::token::Token, test::corlib_model};

    #[test]
    fn test_outcome_follows_reports() {
        let model = corlib_model();
        let defects = Defects::deduplicating();
        let run = RunId::next();
        let context = RuleContext::new(&model, &defects, "Sample", run);
        assert_eq!(context.run(), run);

        assert_eq!(context.outcome(), RuleResult::Success);

        let target = DefectTarget::Method {
            token: Token::new(0x0600_0001),
            name: "Demo.Sample::Run".to_string(),
        };
        context.report_at(target.clone(), 4, Severity::Low, Confidence::High, "first");
        context.report_at(target, 4, Severity::Low, Confidence::High, "first");

        assert_eq!(context.reported(), 2);
        assert_eq!(context.outcome(), RuleResult::Failure);
        assert_eq!(defects.count(), 1);

        let recorded = defects.iter().next().unwrap();
        assert_eq!(recorded.rule, "Sample");
        assert_eq!(recorded.offset, Some(4));
    }
}
