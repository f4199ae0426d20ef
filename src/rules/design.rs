//! Rules for the shape of types and their public contracts.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::{DashMap, DashSet};
use tracing::{debug, trace};

use crate::{
    defects::{Confidence, DefectTarget, Severity},
    metadata::{
        event::Event,
        query::{MetadataQuery, WellKnownType},
        signatures::SignatureMethod,
        token::Token,
        typesystem::{CilType, CilTypeRc},
    },
    rules::{Rule, RuleContext, RuleInfo, RuleResult, RuleTargets, RunId},
};

/// Verifies one aspect of a delegate's `Invoke` signature, returning the failure message
type InvokeCheck = fn(&dyn MetadataQuery, &SignatureMethod) -> Option<String>;

/// Checks every event delegate is run through, with the severity of a failure.
///
/// All checks run, so one delegate can yield several defects.
const INVOKE_CHECKS: [(Severity, InvokeCheck); 6] = [
    (Severity::Medium, returns_void),
    (Severity::Medium, has_two_parameters),
    (Severity::Medium, sender_is_object),
    (Severity::Medium, args_are_event_args),
    (Severity::Low, sender_is_named),
    (Severity::Low, args_are_named),
];

fn returns_void(model: &dyn MetadataQuery, invoke: &SignatureMethod) -> Option<String> {
    let return_type = &invoke.return_type.base;
    if model.is_well_known(return_type, WellKnownType::Void) {
        return None;
    }
    Some(format!(
        "The delegate should return void, not {}",
        model.fullname(return_type)
    ))
}

fn has_two_parameters(_model: &dyn MetadataQuery, invoke: &SignatureMethod) -> Option<String> {
    (invoke.params.len() != 2).then(|| "The delegate should have 2 parameters".to_string())
}

fn sender_is_object(model: &dyn MetadataQuery, invoke: &SignatureMethod) -> Option<String> {
    let sender = invoke.param(0)?;
    if model.is_well_known(&sender.base, WellKnownType::Object) {
        return None;
    }
    Some(format!(
        "The first parameter should have an object, not {}",
        model.fullname(&sender.base)
    ))
}

fn args_are_event_args(model: &dyn MetadataQuery, invoke: &SignatureMethod) -> Option<String> {
    let args = invoke.param(1)?;
    // an unresolvable base chain proves nothing either way
    match model.inherits_from(&args.base, WellKnownType::EventArgs) {
        Some(false) => {
            Some("The second parameter should be a subclass of System.EventArgs".to_string())
        }
        Some(true) | None => None,
    }
}

fn expect_name(invoke: &SignatureMethod, position: usize, expected: &str) -> Option<String> {
    let param = invoke.param(position)?;
    (param.name != expected)
        .then(|| format!("The expected name is {expected}, not {}", param.name))
}

fn sender_is_named(_model: &dyn MetadataQuery, invoke: &SignatureMethod) -> Option<String> {
    expect_name(invoke, 0, "sender")
}

fn args_are_named(_model: &dyn MetadataQuery, invoke: &SignatureMethod) -> Option<String> {
    expect_name(invoke, 1, "e")
}

/// Flags events whose delegate type does not follow the `EventHandler` convention.
///
/// A conforming delegate returns `void` and takes two parameters, `object sender` and an
/// `EventArgs` (or derived) `e`:
///
/// ```csharp
/// public delegate void StatusChanged(object sender, StatusEventArgs e);
/// ```
///
/// Delegates that cannot be resolved, open generic delegates such as `EventHandler<T>`
/// and delegates without an `Invoke` method are skipped. A defect is attributed to the
/// delegate type when it belongs to the analyzed set and to the event otherwise.
///
/// Delegate types found valid are remembered for the rest of the run, keyed by the
/// reference token the event uses, and are not verified again. Invalid delegates are
/// verified again by every event using them. Each run has its own set, dropped at
/// teardown, so runs sharing the instance never see each other's entries.
#[derive(Debug, Default)]
pub struct DeclareEventHandlersCorrectly {
    valid_handlers: DashMap<RunId, DashSet<Token>>,
    verifications: AtomicUsize,
}

impl DeclareEventHandlersCorrectly {
    /// Name the rule reports defects under
    pub const NAME: &'static str = "DeclareEventHandlersCorrectly";

    /// Creates the rule with an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of delegate signatures verified since the rule was created
    pub fn verifications(&self) -> usize {
        self.verifications.load(Ordering::Relaxed)
    }

    /// Number of delegate types currently known to be valid, over all runs in progress
    pub fn cached_handlers(&self) -> usize {
        self.valid_handlers.iter().map(|entry| entry.len()).sum()
    }

    fn is_known_valid(&self, run: RunId, token: Token) -> bool {
        self.valid_handlers
            .get(&run)
            .is_some_and(|handlers| handlers.contains(&token))
    }

    fn check_event(&self, event: &Event, context: &RuleContext<'_>) {
        let model = context.model();
        let reference = event.event_type.token();

        if let Some(token) = reference {
            if self.is_known_valid(context.run(), token) {
                trace!(event = %event.name, %token, "delegate already verified");
                return;
            }
        }

        let Some(delegate) = model.resolve(&event.event_type) else {
            trace!(event = %event.name, "delegate type cannot be resolved");
            return;
        };

        if delegate.is_generic_definition() {
            trace!(
                event = %event.name,
                delegate = %delegate.fullname(),
                "open generic delegate"
            );
            return;
        }

        let Some(invoke) = delegate.method_by_name("Invoke") else {
            trace!(delegate = %delegate.fullname(), "delegate has no Invoke method");
            return;
        };

        self.verifications.fetch_add(1, Ordering::Relaxed);
        let target = Self::attribution(model, &delegate, event);

        let mut valid = true;
        for (severity, check) in INVOKE_CHECKS {
            let failure = check(model, &invoke.signature);
            valid &= failure.is_none();
            if let Some(message) = failure {
                context.report(target.clone(), severity, Confidence::High, message);
            }
        }

        if valid {
            if let Some(token) = reference {
                self.valid_handlers
                    .entry(context.run())
                    .or_default()
                    .insert(token);
            }
        }
    }

    /// The delegate type when it can be reported against, the event otherwise
    fn attribution(model: &dyn MetadataQuery, delegate: &CilType, event: &Event) -> DefectTarget {
        if model.is_analyzed(delegate) {
            DefectTarget::from(delegate)
        } else {
            DefectTarget::from(event)
        }
    }
}

impl Rule for DeclareEventHandlersCorrectly {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name: Self::NAME,
            problem: "The delegate which handles the event haven't the correct signature.",
            solution: "You should correct the signature, return type, parameter types or \
                       parameter names.",
        }
    }

    fn targets(&self) -> RuleTargets {
        RuleTargets::TYPES
    }

    fn check_type(&self, ty: &CilTypeRc, context: &RuleContext<'_>) -> RuleResult {
        if ty.events.count() == 0 {
            return RuleResult::DoesNotApply;
        }

        for (_, event) in ty.events.iter() {
            self.check_event(event, context);
        }

        context.outcome()
    }

    fn teardown(&self, run: RunId) {
        if let Some((_, handlers)) = self.valid_handlers.remove(&run) {
            debug!(%run, cached = handlers.len(), "dropping valid event handler cache");
        }
    }
}
