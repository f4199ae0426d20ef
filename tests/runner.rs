use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dotlint::prelude::*;

/// Flags public types without a namespace
#[derive(Default)]
struct GlobalNamespace {
    initialized: AtomicUsize,
    torn_down: AtomicUsize,
}

impl Rule for GlobalNamespace {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name: "AvoidGlobalNamespace",
            problem: "The type is declared outside any namespace.",
            solution: "Move the type into a namespace.",
        }
    }

    fn targets(&self) -> RuleTargets {
        RuleTargets::TYPES
    }

    fn initialize(&self, _model: &dyn MetadataQuery, _run: RunId) {
        self.initialized.fetch_add(1, Ordering::SeqCst);
    }

    fn check_type(&self, ty: &CilTypeRc, context: &RuleContext<'_>) -> RuleResult {
        if ty.is_nested() {
            return RuleResult::DoesNotApply;
        }

        if ty.namespace.is_empty() {
            context.report(
                DefectTarget::from(&**ty),
                Severity::Medium,
                Confidence::Total,
                "Type is in the global namespace",
            );
        }
        context.outcome()
    }

    fn teardown(&self, _run: RunId) {
        self.torn_down.fetch_add(1, Ordering::SeqCst);
    }
}

fn mixed_model() -> MetadataModel {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = builder.type_ref("System", "EventHandler");
    let broken = builder
        .define(
            TypeDef::delegate("", "Notify")
                .public()
                .method(MethodDef::invoke(TypeSignature::Void)),
        )
        .unwrap()
        .signature();
    let null_body = InstructionBuilder::new().ldnull().ret().build().unwrap();

    builder
        .define(
            TypeDef::class("Demo", "Mailbox")
                .public()
                .event(EventDef::new("Received", handler))
                .event(EventDef::new("Notified", broken))
                .method(
                    MethodDef::new("Subjects")
                        .public()
                        .param("folder", TypeSignature::String)
                        .returns(TypeSignature::sz_array(TypeSignature::String))
                        .body(null_body),
                ),
        )
        .unwrap();
    builder.build()
}

#[test]
fn all_rules_over_one_model() {
    let custom = Arc::new(GlobalNamespace::default());
    let mut runner = Runner::new(RunnerConfig::default());
    runner
        .add_rule(Arc::new(DeclareEventHandlersCorrectly::new()))
        .unwrap();
    runner
        .add_rule(Arc::new(PreferEmptyInstanceOverNull::new()))
        .unwrap();
    runner.add_rule(custom.clone()).unwrap();

    let report = runner.run(&mixed_model());

    assert_eq!(report.summary.types, 2);
    assert_eq!(report.summary.methods, 2);
    assert_eq!(custom.initialized.load(Ordering::SeqCst), 1);
    assert_eq!(custom.torn_down.load(Ordering::SeqCst), 1);

    assert_eq!(
        report.defects.by_rule(DeclareEventHandlersCorrectly::NAME).len(),
        1
    );
    let empty = report.defects.by_rule(PreferEmptyInstanceOverNull::NAME);
    assert_eq!(empty.len(), 1);
    assert_eq!(empty[0].message, "Replace null with an empty String[] array.");
    assert_eq!(report.defects.by_rule("AvoidGlobalNamespace").len(), 1);

    assert_eq!(report.summary.defects, 3);
    assert_eq!(report.summary.failures(), 3);
    let order: Vec<&str> = report.summary.rules.iter().map(|r| r.name).collect();
    assert_eq!(
        order,
        vec![
            DeclareEventHandlersCorrectly::NAME,
            PreferEmptyInstanceOverNull::NAME,
            "AvoidGlobalNamespace"
        ]
    );
}

#[test]
fn methods_only() {
    let mut runner = Runner::new(RunnerConfig {
        check_types: false,
        ..RunnerConfig::default()
    });
    runner
        .add_rule(Arc::new(DeclareEventHandlersCorrectly::new()))
        .unwrap();
    runner
        .add_rule(Arc::new(PreferEmptyInstanceOverNull::new()))
        .unwrap();

    let report = runner.run(&mixed_model());
    assert_eq!(report.summary.types, 0);
    assert_eq!(report.defects.count(), 1);

    let events = report.summary.rule(DeclareEventHandlersCorrectly::NAME).unwrap();
    assert_eq!(events.success + events.failure + events.does_not_apply, 0);
}

#[test]
fn empty_runner() {
    let runner = Runner::new(RunnerConfig::default());
    let report = runner.run(&mixed_model());

    assert!(report.defects.is_empty());
    assert!(report.summary.rules.is_empty());
    assert_eq!(report.summary.types, 2);
}

#[test]
fn rule_metadata() {
    let events = DeclareEventHandlersCorrectly::new();
    assert_eq!(events.info().name, "DeclareEventHandlersCorrectly");
    assert_eq!(
        events.info().problem,
        "The delegate which handles the event haven't the correct signature."
    );
    assert_eq!(events.targets(), RuleTargets::TYPES);

    let empty = PreferEmptyInstanceOverNull::new();
    assert_eq!(empty.info().solution, "Return an empty instance rather than null.");
    assert_eq!(empty.targets(), RuleTargets::METHODS);
}
