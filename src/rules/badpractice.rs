//! Rules for practices that make code harder to use correctly.

use tracing::trace;

use crate::{
    analysis::NullReturnScanner,
    assembly::Instruction,
    defects::{Confidence, DefectTarget, Severity},
    metadata::{
        method::{Method, MethodRc},
        query::{Capability, MetadataQuery, WellKnownType},
        signatures::TypeSignature,
    },
    rules::{ReturnNullRule, Rule, RuleContext, RuleInfo, RuleResult, RuleTargets},
};

/// Flags methods returning a string, an array or an enumerable that return `null`.
///
/// Callers of such methods can use an empty instance directly, while `null` forces a
/// check before every use:
///
/// ```csharp
/// public string DisplayName {
///     get {
///         if (IsAnonymous)
///             return null;    // return string.Empty;
///         return name;
///     }
/// }
/// ```
///
/// Each `ret` reached by a `null` literal is reported at its offset with a replacement
/// suggestion matching the return type. Severity is [`Severity::Medium`] when the method
/// is visible outside its assembly and [`Severity::Low`] otherwise. Parameterless
/// `ToString` methods are left alone; returning `null` there is a defect class of its own.
#[derive(Debug, Default)]
pub struct PreferEmptyInstanceOverNull {
    scanner: NullReturnScanner,
}

impl PreferEmptyInstanceOverNull {
    /// Name the rule reports defects under
    pub const NAME: &'static str = "PreferEmptyInstanceOverNull";

    /// Creates the rule with the default scanner
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the rule with a custom scanner
    #[must_use]
    pub fn with_scanner(scanner: NullReturnScanner) -> Self {
        PreferEmptyInstanceOverNull { scanner }
    }

    fn suggestion(model: &dyn MetadataQuery, return_type: &TypeSignature) -> String {
        if model.is_well_known(return_type, WellKnownType::String) {
            "string.Empty".to_string()
        } else if return_type.is_array() {
            format!("an empty {} array", model.name(return_type))
        } else if model
            .fullname(return_type)
            .starts_with(&WellKnownType::GenericIEnumerable.fullname())
        {
            "yield break (or equivalent)".to_string()
        } else {
            "an empty collection".to_string()
        }
    }
}

impl ReturnNullRule for PreferEmptyInstanceOverNull {
    fn scanner(&self) -> &NullReturnScanner {
        &self.scanner
    }

    fn report(&self, method: &Method, ret: &Instruction, context: &RuleContext<'_>) {
        let model = context.model();
        let severity = if model.is_visible(method) {
            Severity::Medium
        } else {
            Severity::Low
        };

        context.report_at(
            DefectTarget::from(method),
            ret.offset,
            severity,
            Confidence::High,
            format!(
                "Replace null with {}.",
                Self::suggestion(model, &method.signature.return_type.base)
            ),
        );
    }
}

impl Rule for PreferEmptyInstanceOverNull {
    fn info(&self) -> RuleInfo {
        RuleInfo {
            name: Self::NAME,
            problem: "This method returns null whereas returning an empty instance would make it easier to use.",
            solution: "Return an empty instance rather than null.",
        }
    }

    fn targets(&self) -> RuleTargets {
        RuleTargets::METHODS
    }

    fn check_method(&self, method: &MethodRc, context: &RuleContext<'_>) -> RuleResult {
        if !method.has_body() {
            return RuleResult::DoesNotApply;
        }

        if !method.has_parameters() && method.name == "ToString" {
            return RuleResult::DoesNotApply;
        }

        let model = context.model();
        let return_type = &method.signature.return_type.base;
        if !model.is_well_known(return_type, WellKnownType::String)
            && !return_type.is_array()
            && !model.implements(return_type, Capability::Enumerable)
        {
            trace!(method = %method.fullname(), "return type is not string, array or enumerable");
            return RuleResult::DoesNotApply;
        }

        self.check_null_returns(method, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assembly::InstructionBuilder,
        defects::Defects,
        metadata::model::{MetadataModel, MethodDef, TypeDef},
        rules::RunId,
        test::{corlib, null_return_body},
    };

    fn model_with(method: MethodDef, public: bool) -> MetadataModel {
        let mut builder = corlib();
        let class = TypeDef::class("Demo", "Store").method(method);
        let class = if public { class.public() } else { class };
        builder.define(class).unwrap();
        builder.build()
    }

    fn check(model: &MetadataModel) -> (RuleResult, Defects) {
        let rule = PreferEmptyInstanceOverNull::new();
        let defects = Defects::new();
        let method = model.analyzed_methods()[0].clone();
        let result = {
            let context = RuleContext::new(
                model,
                &defects,
                PreferEmptyInstanceOverNull::NAME,
                RunId::next(),
            );
            rule.check_method(&method, &context)
        };
        (result, defects)
    }

    #[test]
    fn test_public_string_method() {
        let model = model_with(
            MethodDef::new("GetName")
                .public()
                .returns(TypeSignature::String)
                .body(null_return_body()),
            true,
        );

        let (result, defects) = check(&model);
        assert_eq!(result, RuleResult::Failure);
        assert_eq!(defects.count(), 1);

        let defect = defects.iter().next().unwrap();
        assert_eq!(defect.severity, Severity::Medium);
        assert_eq!(defect.confidence, Confidence::High);
        assert_eq!(defect.message, "Replace null with string.Empty.");
        assert_eq!(defect.offset, Some(1));
    }

    #[test]
    fn test_internal_method_is_low() {
        let model = model_with(
            MethodDef::new("GetName")
                .public()
                .returns(TypeSignature::String)
                .body(null_return_body()),
            false,
        );

        let (_, defects) = check(&model);
        assert_eq!(defects.iter().next().unwrap().severity, Severity::Low);
    }

    #[test]
    fn test_tostring_excluded() {
        let model = model_with(
            MethodDef::new("ToString")
                .public()
                .returns(TypeSignature::String)
                .body(null_return_body()),
            true,
        );

        let (result, defects) = check(&model);
        assert_eq!(result, RuleResult::DoesNotApply);
        assert!(defects.is_empty());
    }

    #[test]
    fn test_tostring_with_parameters_applies() {
        let model = model_with(
            MethodDef::new("ToString")
                .public()
                .param("format", TypeSignature::String)
                .returns(TypeSignature::String)
                .body(null_return_body()),
            true,
        );

        assert_eq!(check(&model).0, RuleResult::Failure);
    }

    #[test]
    fn test_without_body() {
        let model = model_with(
            MethodDef::new("GetName").public().returns(TypeSignature::String),
            true,
        );

        assert_eq!(check(&model).0, RuleResult::DoesNotApply);
    }

    #[test]
    fn test_other_return_types() {
        let model = model_with(
            MethodDef::new("Find")
                .public()
                .returns(TypeSignature::Object)
                .body(null_return_body()),
            true,
        );

        assert_eq!(check(&model).0, RuleResult::DoesNotApply);
    }

    #[test]
    fn test_no_null_in_body() {
        let body = InstructionBuilder::new()
            .ldstr(0x7000_0001)
            .ret()
            .build()
            .unwrap();
        let model = model_with(
            MethodDef::new("GetName")
                .public()
                .returns(TypeSignature::String)
                .body(body),
            true,
        );

        assert_eq!(check(&model).0, RuleResult::DoesNotApply);
    }

    #[test]
    fn test_null_not_returned() {
        let body = InstructionBuilder::new()
            .ldnull()
            .stloc(0)
            .ldstr(0x7000_0001)
            .ret()
            .build()
            .unwrap();
        let model = model_with(
            MethodDef::new("GetName")
                .public()
                .returns(TypeSignature::String)
                .body(body),
            true,
        );

        let (result, defects) = check(&model);
        assert_eq!(result, RuleResult::Success);
        assert!(defects.is_empty());
    }

    #[test]
    fn test_suggestions() {
        let mut builder = corlib();
        let sequence = builder.type_ref("System.Collections.Generic", "IEnumerable`1");
        let list = builder.type_ref("System.Collections.Generic", "List`1");
        let collection = builder.type_ref("System.Collections", "ICollection");
        let model = builder.build();

        let cases = [
            (TypeSignature::String, "string.Empty"),
            (
                TypeSignature::sz_array(TypeSignature::I4),
                "an empty Int32[] array",
            ),
            (
                TypeSignature::generic_inst(sequence, vec![TypeSignature::I4]),
                "yield break (or equivalent)",
            ),
            (
                TypeSignature::generic_inst(list, vec![TypeSignature::I4]),
                "an empty collection",
            ),
            (collection, "an empty collection"),
        ];

        for (return_type, expected) in cases {
            assert_eq!(
                PreferEmptyInstanceOverNull::suggestion(&model, &return_type),
                expected
            );
        }
    }
}
