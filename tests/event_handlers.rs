use std::{
    sync::{Arc, Barrier},
    thread,
};

use dotlint::{metadata::typesystem::TypeAttributes, prelude::*};

const RULE: &str = DeclareEventHandlersCorrectly::NAME;

/// `Demo.<name>` delegate with the conventional `Invoke`
fn valid_delegate(builder: &mut MetadataModelBuilder, name: &str) -> TypeSignature {
    let args = builder.well_known(WellKnownType::EventArgs);
    builder
        .define(
            TypeDef::delegate("Demo", name).public().method(
                MethodDef::invoke(TypeSignature::Void)
                    .param("sender", TypeSignature::Object)
                    .param("e", args),
            ),
        )
        .unwrap()
        .signature()
}

/// `Demo.<name>` delegate returning `int` and taking a single `int value`
fn broken_delegate(builder: &mut MetadataModelBuilder, name: &str) -> TypeSignature {
    builder
        .define(
            TypeDef::delegate("Demo", name)
                .public()
                .method(MethodDef::invoke(TypeSignature::I4).param("value", TypeSignature::I4)),
        )
        .unwrap()
        .signature()
}

fn publishers(builder: &mut MetadataModelBuilder, count: usize, handler: &TypeSignature) {
    for index in 0..count {
        builder
            .define(
                TypeDef::class("Demo", &format!("Publisher{index}"))
                    .public()
                    .event(EventDef::new("Changed", handler.clone()))
                    .event(EventDef::new("Reset", handler.clone())),
            )
            .unwrap();
    }
}

fn runner(rule: Arc<DeclareEventHandlersCorrectly>, config: RunnerConfig) -> Runner {
    let mut runner = Runner::new(config);
    runner.add_rule(rule).unwrap();
    runner
}

#[test]
fn valid_delegate_is_verified_once_per_run() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = valid_delegate(&mut builder, "ChangedHandler");
    publishers(&mut builder, 10, &handler);
    let model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let report = runner(rule.clone(), RunnerConfig::sequential()).run(&model);

    assert!(report.defects.is_empty());
    assert_eq!(rule.verifications(), 1);
    assert_eq!(report.summary.rule(RULE).unwrap().success, 10);
    // the delegate type itself declares no events
    assert_eq!(report.summary.rule(RULE).unwrap().does_not_apply, 1);
    // teardown emptied the cache
    assert_eq!(rule.cached_handlers(), 0);
}

#[test]
fn cache_does_not_leak_into_next_run() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = valid_delegate(&mut builder, "ChangedHandler");
    publishers(&mut builder, 3, &handler);
    let model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let runner = runner(rule.clone(), RunnerConfig::sequential());

    runner.run(&model);
    runner.run(&model);
    assert_eq!(rule.verifications(), 2);
}

#[test]
fn rerun_after_teardown_reports_the_same_defects() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = broken_delegate(&mut builder, "ValueHandler");
    publishers(&mut builder, 3, &handler);
    let valid = valid_delegate(&mut builder, "ChangedHandler");
    builder
        .define(
            TypeDef::class("Demo", "Listener")
                .public()
                .event(EventDef::new("Changed", valid)),
        )
        .unwrap();
    let model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let runner = runner(rule.clone(), RunnerConfig::default());

    let first = runner.run(&model);
    let after_first = rule.verifications();
    let second = runner.run(&model);

    assert_eq!(first.summary, second.summary);
    let first = first.defects.into_sorted();
    assert_eq!(first.len(), 4);
    assert_eq!(first, second.defects.into_sorted());
    // the valid delegate is verified again in the second run
    assert_eq!(rule.verifications(), 2 * after_first);
}

/// Blocks the run at the type named `Hold` until released twice
struct Hold {
    barrier: Barrier,
}

impl Rule for Hold {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name: "Hold",
            problem: "None.",
            solution: "None.",
        }
    }

    fn targets(&self) -> RuleTargets {
        RuleTargets::TYPES
    }

    fn check_type(&self, ty: &CilTypeRc, _context: &RuleContext<'_>) -> RuleResult {
        if ty.name == "Hold" {
            self.barrier.wait();
            self.barrier.wait();
        }
        RuleResult::DoesNotApply
    }
}

#[test]
fn overlapping_runs_do_not_share_the_cache() {
    // `Demo.Handler` is the first definition of both models, so both share its token
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = valid_delegate(&mut builder, "Handler");
    publishers(&mut builder, 1, &handler);
    builder.define(TypeDef::class("Demo", "Hold")).unwrap();
    let valid_model = builder.build();

    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = broken_delegate(&mut builder, "Handler");
    publishers(&mut builder, 1, &handler);
    let broken_model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let hold = Arc::new(Hold {
        barrier: Barrier::new(2),
    });

    let mut held = runner(rule.clone(), RunnerConfig::sequential());
    held.add_rule(hold.clone()).unwrap();
    let other = runner(rule.clone(), RunnerConfig::sequential());

    let alone = other.run(&broken_model).defects.into_sorted();
    assert_eq!(alone.len(), 4);

    thread::scope(|scope| {
        let pending = scope.spawn(|| held.run(&valid_model));

        // the held run has verified and cached `Demo.Handler`
        hold.barrier.wait();
        assert_eq!(rule.cached_handlers(), 1);

        let overlapped = other.run(&broken_model).defects.into_sorted();
        assert_eq!(overlapped, alone);
        // the other run's teardown left the held run's cache alone
        assert_eq!(rule.cached_handlers(), 1);

        hold.barrier.wait();
        let report = pending.join().unwrap();
        assert!(report.defects.is_empty());
    });

    assert_eq!(rule.cached_handlers(), 0);
}

#[test]
fn invalid_delegate_reported_once_with_deduplication() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = broken_delegate(&mut builder, "ValueHandler");
    publishers(&mut builder, 4, &handler);
    let model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let report = runner(rule.clone(), RunnerConfig::sequential()).run(&model);

    // invalid delegates are verified again by every event
    assert_eq!(rule.verifications(), 8);
    assert_eq!(rule.cached_handlers(), 0);
    assert_eq!(report.summary.rule(RULE).unwrap().failure, 4);

    let defects = report.defects.into_sorted();
    let messages: Vec<&str> = defects.iter().map(|d| d.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "The delegate should have 2 parameters",
            "The delegate should return void, not System.Int32",
            "The expected name is sender, not value",
            "The first parameter should have an object, not System.Int32",
        ]
    );
    assert!(defects
        .iter()
        .all(|d| d.target.name() == "Demo.ValueHandler"));
}

#[test]
fn invalid_delegate_reported_per_event_without_deduplication() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let handler = broken_delegate(&mut builder, "ValueHandler");
    publishers(&mut builder, 2, &handler);
    let model = builder.build();

    let config = RunnerConfig {
        deduplicate_defects: false,
        ..RunnerConfig::sequential()
    };
    let report = runner(Arc::new(DeclareEventHandlersCorrectly::new()), config).run(&model);
    assert_eq!(report.defects.count(), 4 * 4);
}

#[test]
fn parallel_run_matches_sequential_run() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let valid = valid_delegate(&mut builder, "ChangedHandler");
    let broken = broken_delegate(&mut builder, "ValueHandler");
    publishers(&mut builder, 50, &valid);
    for index in 0..50 {
        builder
            .define(
                TypeDef::class("Demo", &format!("Sink{index}"))
                    .event(EventDef::new("Overflow", broken.clone())),
            )
            .unwrap();
    }
    let model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let parallel = runner(rule.clone(), RunnerConfig::default()).run(&model);
    let sequential = runner(
        Arc::new(DeclareEventHandlersCorrectly::new()),
        RunnerConfig::sequential(),
    )
    .run(&model);

    assert_eq!(parallel.summary, sequential.summary);
    assert_eq!(
        parallel.defects.into_sorted(),
        sequential.defects.into_sorted()
    );
    // racing events may both verify the valid delegate before it is cached
    assert!(rule.verifications() >= 51);
    assert!(rule.verifications() <= 150);
}

#[test]
fn referenced_but_unavailable_delegate_is_not_a_defect() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let missing = builder.type_ref("Vendor.Controls", "ClickHandler");
    builder
        .define(
            TypeDef::class("Demo", "Button")
                .public()
                .event(EventDef::new("Click", missing)),
        )
        .unwrap();
    let model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let report = runner(rule.clone(), RunnerConfig::default()).run(&model);
    assert!(report.defects.is_empty());
    assert_eq!(rule.verifications(), 0);
}

#[test]
fn generic_event_handler_is_skipped() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let generic = builder.type_ref("System", "EventHandler`1");
    let args = builder.well_known(WellKnownType::EventArgs);
    builder
        .define(
            TypeDef::class("Demo", "Download")
                .public()
                .event(EventDef::new(
                    "Completed",
                    TypeSignature::generic_inst(generic, vec![args]),
                )),
        )
        .unwrap();
    let model = builder.build();

    let rule = Arc::new(DeclareEventHandlersCorrectly::new());
    let report = runner(rule.clone(), RunnerConfig::default()).run(&model);
    assert!(report.defects.is_empty());
    assert_eq!(rule.verifications(), 0);
}

#[test]
fn nested_delegate_is_attributed_to_itself() {
    let mut builder = MetadataModelBuilder::new().with_corlib().unwrap();
    let outer = builder
        .define(TypeDef::class("Demo", "Grid").public())
        .unwrap();
    let handler = builder
        .define(
            TypeDef::delegate("", "CellHandler")
                .visibility(TypeAttributes::NESTED_PUBLIC)
                .nested_in(&outer)
                .method(
                    MethodDef::invoke(TypeSignature::Void)
                        .param("source", TypeSignature::Object)
                        .param("e", TypeSignature::Object),
                ),
        )
        .unwrap()
        .signature();
    builder
        .define(
            TypeDef::class("Demo", "Sheet")
                .public()
                .event(EventDef::new("CellChanged", handler)),
        )
        .unwrap();
    let model = builder.build();

    let report = runner(
        Arc::new(DeclareEventHandlersCorrectly::new()),
        RunnerConfig::default(),
    )
    .run(&model);

    let defects = report.defects.into_sorted();
    assert_eq!(defects.len(), 2);
    assert!(defects
        .iter()
        .all(|d| d.target.name() == "Demo.Grid/CellHandler"));
    assert!(defects
        .iter()
        .any(|d| d.message == "The second parameter should be a subclass of System.EventArgs"));
    assert!(defects
        .iter()
        .any(|d| d.message == "The expected name is sender, not source"
            && d.severity == Severity::Low));
}
