use crate::{
    analysis::NullReturnScanner,
    assembly::Instruction,
    metadata::method::Method,
    rules::{RuleContext, RuleResult},
};

/// Shared behavior of rules that flag every `ret` returning a `null` literal.
///
/// Implementors decide which methods the check applies to and how a finding is
/// reported; [`ReturnNullRule::check_null_returns`] does the instruction level work.
pub trait ReturnNullRule {
    /// The scanner tracing returned values
    fn scanner(&self) -> &NullReturnScanner;

    /// Reports one `ret` of `method` that returns `null`
    fn report(&self, method: &Method, ret: &Instruction, context: &RuleContext<'_>);

    /// Scans the body of `method` and reports every `ret` reached by a `null` literal.
    ///
    /// Methods without a body, or without any `ldnull`, are outside the domain.
    fn check_null_returns(&self, method: &Method, context: &RuleContext<'_>) -> RuleResult {
        let Some(body) = &method.body else {
            return RuleResult::DoesNotApply;
        };

        if !body.instructions.iter().any(Instruction::is_ldnull) {
            return RuleResult::DoesNotApply;
        }

        for ret in self.scanner().scan(body) {
            self.report(method, ret, context);
        }

        context.outcome()
    }
}
