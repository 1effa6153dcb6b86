// crates/qocim-routing-filter/tests/compiler.rs
// ============================================================================
// Test Module: Routing Filter Compiler
// Coverage: Emitted text, determinism, ordering, families, criteria, errors.
// ============================================================================
//! ## Overview
//! Integration tests for the constraint and criterion compilers.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

mod support;

use proptest::prelude::*;
use qocim_core::Combinator;
use qocim_core::CriterionArena;
use qocim_core::CriterionError;
use qocim_core::CriterionId;
use qocim_core::IndicatorId;
use qocim_core::MetricDefinition;
use qocim_core::MetricUnit;
use qocim_core::PrimitiveCriterion;
use qocim_core::QocConstraint;
use qocim_core::QocIndicator;
use qocim_core::QocOperator;
use qocim_core::SelectionOperator;
use qocim_core::constraint_list_digest;
use qocim_routing_filter::ConfigError;
use qocim_routing_filter::FilterRuntime;
use qocim_routing_filter::GeneratorChain;
use qocim_routing_filter::MissingPolicy;
use qocim_routing_filter::RoutingFilterCompiler;
use qocim_routing_filter::RoutingFilterConfig;
use qocim_routing_filter::RoutingFilterError;
use qocim_routing_filter::compile;
use support::TestResult;
use support::ensure;
use support::percent_precision;
use support::presence;

/// Constraints on both precision definitions at their minimum.
fn precision_constraints() -> Vec<QocConstraint> {
    vec![
        presence(MetricDefinition::PercentPrecision),
        presence(MetricDefinition::PerthousandPrecision),
    ]
}

// ============================================================================
// SECTION: Emitted Text
// ============================================================================

/// Tests the default rendering of two presence constraints.
#[test]
fn precision_filter_renders_expected_code() -> TestResult {
    let constraints = precision_constraints();
    let artifact = compile(&constraints)?;
    let digest = constraint_list_digest(&constraints)?;
    let expected = format!(
        "// criteria: [10], [10]\n\
         // constraints: {digest}\n\
         var qoc = message.qocMetaData;\n\
         if (!hasQoCMetricDefinition(qoc, \"10.1\") && \
         !hasQoCMetricDefinition(qoc, \"10.2\")) {{\n    return false;\n}}\nreturn true;\n"
    );
    ensure(digest.to_string().starts_with("sha256:"), "sha-256 digest")?;
    ensure(artifact.as_str() == expected, format!("unexpected code:\n{artifact}"))
}

/// Tests that the any-missing policy joins guards with `||`.
#[test]
fn any_missing_policy_uses_disjunction() -> TestResult {
    let config = RoutingFilterConfig {
        missing_policy: MissingPolicy::RejectWhenAnyMissing,
        metadata_variable: "meta".to_string(),
        indent_width: 2,
    };
    let artifact = RoutingFilterCompiler::new(config)?.compile(&precision_constraints())?;
    ensure(artifact.as_str().contains("var meta = message.qocMetaData;"), "custom variable")?;
    ensure(
        artifact.as_str().contains(
            "if (!hasQoCMetricDefinition(meta, \"10.1\") || !hasQoCMetricDefinition(meta, \"10.2\")) {\n  return false;",
        ),
        "disjunction with two-space indent",
    )
}

/// Tests binary and not-exists rendering.
#[test]
fn operators_render_threshold_and_presence_tests() -> TestResult {
    let fresh = QocConstraint::new("[1.1]", QocIndicator::new(MetricDefinition::Freshness, "0", 30_u32))
        .with_operator(QocOperator::Lt);
    let custom = MetricDefinition::Custom {
        indicator_id: IndicatorId::new(42),
        ordinal: 1,
        unit: MetricUnit::Scalar,
    };
    let absent =
        QocConstraint::new("[42.1]", QocIndicator::new(custom, "0", 0_u32)).with_operator(QocOperator::NotExists);
    let artifact = compile(&[fresh, absent])?;
    ensure(
        artifact
            .as_str()
            .contains("if (!matchQoCMetricValue(qoc, \"1.1\", \"lt\", 30) && hasQoCMetricDefinition(qoc, \"42.1\")) {"),
        format!("unexpected guard:\n{artifact}"),
    )
}

/// Tests that constraints of one family share one guard.
#[test]
fn constraints_of_one_family_share_a_guard() -> TestResult {
    let low = QocConstraint::new("[10.1a]", QocIndicator::new(MetricDefinition::PercentPrecision, "0", 20_u32))
        .with_operator(QocOperator::Ge);
    let fresh = presence(MetricDefinition::Freshness);
    let high = QocConstraint::new("[10.1b]", QocIndicator::new(MetricDefinition::PercentPrecision, "0", 90_u32))
        .with_operator(QocOperator::Le);
    let artifact = compile(&[low, fresh, high])?;
    ensure(
        artifact.as_str().contains(
            "if (!(matchQoCMetricValue(qoc, \"10.1\", \"ge\", 20) && matchQoCMetricValue(qoc, \"10.1\", \"le\", 90)) \
             && !hasQoCMetricDefinition(qoc, \"1.1\")) {",
        ),
        format!("unexpected guard:\n{artifact}"),
    )
}

// ============================================================================
// SECTION: Determinism and Ordering
// ============================================================================

/// Tests that compiling twice yields identical artifacts.
#[test]
fn compile_is_deterministic() -> TestResult {
    let first = compile(&precision_constraints())?;
    let second = compile(&precision_constraints())?;
    ensure(first == second, "artifacts differ")?;
    ensure(first.digest() == second.digest(), "digests differ")
}

/// Tests that permuting distinct constraints changes the artifact.
#[test]
fn permutation_changes_the_artifact() -> TestResult {
    let mut constraints = precision_constraints();
    let forward = compile(&constraints)?;
    constraints.reverse();
    let reversed = compile(&constraints)?;
    ensure(forward.as_str() != reversed.as_str(), "permutation must change code")?;
    ensure(forward.digest() != reversed.digest(), "permutation must change digest")
}

/// Tests that permuting constraints of one family changes the artifact.
#[test]
fn permutation_inside_a_family_changes_the_artifact() -> TestResult {
    let a = QocConstraint::new("[a]", QocIndicator::new(MetricDefinition::Freshness, "0", 1_u32));
    let b = QocConstraint::new("[b]", QocIndicator::new(MetricDefinition::Freshness, "0", 1_u32));
    let forward = compile(&[a.clone(), b.clone()])?;
    let reversed = compile(&[b, a])?;
    ensure(forward != reversed, "criterion order must show in the artifact")
}

/// Tests that constraints differing only in an ignored threshold stay distinct.
#[test]
fn permutation_of_presence_constraints_with_same_id_changes_the_artifact() -> TestResult {
    let zero = QocConstraint::new("[10]", QocIndicator::new(MetricDefinition::PercentPrecision, "0", 0_u32));
    let fifty = QocConstraint::new("[10]", QocIndicator::new(MetricDefinition::PercentPrecision, "0", 50_u32));
    let forward = compile(&[zero.clone(), fifty.clone()])?;
    let reversed = compile(&[fifty, zero])?;
    ensure(forward != reversed, "header digest must follow the ordered input")
}

/// Tests that an empty constraint list is rejected.
#[test]
fn empty_constraint_list_is_rejected() {
    assert_eq!(compile(&[]), Err(RoutingFilterError::EmptyConstraintList));
}

// ============================================================================
// SECTION: Header Escaping
// ============================================================================

/// Tests that a line separator in a criterion id cannot end the comment.
#[test]
fn criterion_ids_cannot_escape_the_header_comment() -> TestResult {
    let hostile = QocConstraint::new(
        "[10]\u{2028}return true;//",
        QocIndicator::new(MetricDefinition::PercentPrecision, "0", 0_u32),
    );
    let artifact = compile(&[hostile])?;
    let code = artifact.as_str();
    ensure(!code.contains('\u{2028}'), "line separator must be escaped")?;
    ensure(code.starts_with("// criteria: [10]\\u{2028}return true\\u{3b}\\u{2f}\\u{2f}\n"), "escaped id")?;
    ensure(code.matches("return true;").count() == 1, "only the trailing accept")?;
    let runtime = FilterRuntime::new();
    ensure(!runtime.evaluate(&artifact, &[])?, "missing precision still rejects")?;
    ensure(runtime.evaluate(&artifact, &[percent_precision(5)])?, "present precision accepts")
}

/// Tests that escaping keeps distinct identifiers distinct.
#[test]
fn escaped_criterion_ids_stay_distinct() -> TestResult {
    let literal = QocConstraint::new("x\\u{2028}", QocIndicator::new(MetricDefinition::Freshness, "0", 1_u32));
    let separator = QocConstraint::new("x\u{2028}", QocIndicator::new(MetricDefinition::Freshness, "0", 1_u32));
    let literal = compile(&[literal])?;
    let separator = compile(&[separator])?;
    ensure(literal.as_str().starts_with("// criteria: x\\u{5c}u\\u{7b}2028\\u{7d}\n"), "backslash escaped")?;
    ensure(separator.as_str().starts_with("// criteria: x\\u{2028}\n"), "separator escaped")?;
    ensure(literal != separator, "escaping is injective")
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Tests that the compiler validates directly constructed configuration.
#[test]
fn compiler_rejects_unvalidated_configuration() {
    let injected = RoutingFilterConfig {
        metadata_variable: "q = 1; return true; var x".to_string(),
        ..RoutingFilterConfig::default()
    };
    assert!(matches!(RoutingFilterCompiler::new(injected), Err(ConfigError::Invalid(_))));
    for keyword in ["function", "this", "new", "null", "typeof"] {
        let config = RoutingFilterConfig {
            metadata_variable: keyword.to_string(),
            ..RoutingFilterConfig::default()
        };
        assert!(RoutingFilterCompiler::new(config).is_err(), "{keyword} must be reserved");
    }
}

/// Tests that rendering a chain directly also validates the configuration.
#[test]
fn chain_render_rejects_invalid_configuration() -> TestResult {
    let constraints = precision_constraints();
    let chain = GeneratorChain::for_constraints(&constraints)?;
    let config = RoutingFilterConfig {
        indent_width: 0,
        ..RoutingFilterConfig::default()
    };
    ensure(
        matches!(chain.render(&config), Err(RoutingFilterError::Config(ConfigError::Invalid(_)))),
        "zero indent must fail",
    )
}

// ============================================================================
// SECTION: Criteria
// ============================================================================

/// Tests compiling a composite criterion with a selection.
#[test]
fn criterion_tree_compiles_to_one_guard() -> TestResult {
    let mut arena = CriterionArena::new();
    let percent = arena.add_primitive(
        PrimitiveCriterion::compare("[10.1]", MetricDefinition::PercentPrecision, QocOperator::Ge, 50_u32)
            .with_selection(SelectionOperator::Max),
    )?;
    let fresh = arena.add_primitive(PrimitiveCriterion::exists("[1.1]", MetricDefinition::Freshness))?;
    let root = arena.add_composite("[root]", Combinator::Or, [percent, fresh])?;
    let artifact = RoutingFilterCompiler::default().compile_criterion(&arena, root)?;
    ensure(
        artifact.as_str().starts_with("// criteria: [root]\n// constraints: sha256:"),
        "header lists the root and the leaf digest",
    )?;
    ensure(
        artifact.as_str().contains(
            "if (!(matchQoCMetricValue(qoc, \"10.1\", \"ge\", 50, \"MAX\") || hasQoCMetricDefinition(qoc, \"1.1\"))) {",
        ),
        format!("unexpected guard:\n{artifact}"),
    )
}

/// Tests that binary custom criteria without threshold never reach the compiler.
#[test]
fn criterion_without_threshold_is_rejected() -> TestResult {
    let custom = MetricDefinition::custom(IndicatorId::new(5), 2, MetricUnit::Scalar)?;
    let mut arena = CriterionArena::new();
    let mut primitive = PrimitiveCriterion::exists("[5.2]", custom);
    primitive.operator = QocOperator::Gt;
    let result = arena.add_primitive(primitive);
    ensure(
        result == Err(CriterionError::MissingThreshold(CriterionId::new("[5.2]"))),
        "missing threshold must fail",
    )
}

/// Tests that a defaulted threshold renders as the definition default.
#[test]
fn criterion_without_threshold_compiles_at_the_default() -> TestResult {
    let mut arena = CriterionArena::new();
    let mut primitive = PrimitiveCriterion::exists("[10.1]", MetricDefinition::PercentPrecision);
    primitive.operator = QocOperator::Ge;
    let root = arena.add_primitive(primitive)?;
    let artifact = RoutingFilterCompiler::default().compile_criterion(&arena, root)?;
    ensure(
        artifact.as_str().contains("if (!(matchQoCMetricValue(qoc, \"10.1\", \"ge\", 0))) {"),
        format!("unexpected guard:\n{artifact}"),
    )
}

// ============================================================================
// SECTION: Properties
// ============================================================================

proptest! {
    /// Compiling any non-empty threshold list is deterministic.
    #[test]
    fn compile_is_deterministic_for_thresholds(thresholds in proptest::collection::vec(0_u32 .. 100, 1 .. 8)) {
        let constraints: Vec<QocConstraint> = thresholds
            .iter()
            .enumerate()
            .map(|(index, threshold)| {
                QocConstraint::new(
                    format!("[{index}]"),
                    QocIndicator::new(MetricDefinition::PercentPrecision, "0", *threshold),
                )
                .with_operator(QocOperator::Ge)
            })
            .collect();
        let first = compile(&constraints).unwrap();
        let second = compile(&constraints).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Distinct orderings of one constraint set never share an artifact.
    #[test]
    fn permutations_compile_to_distinct_artifacts(
        (original, shuffled) in proptest::sample::subsequence((0_u32 ..= 100).collect::<Vec<_>>(), 2 .. 6)
            .prop_flat_map(|values| (Just(values.clone()), Just(values).prop_shuffle()))
    ) {
        let build = |thresholds: &[u32]| -> Vec<QocConstraint> {
            thresholds
                .iter()
                .map(|threshold| {
                    QocConstraint::new(
                        "[10]",
                        QocIndicator::new(MetricDefinition::PercentPrecision, "0", *threshold),
                    )
                })
                .collect()
        };
        let first = compile(&build(&original)).unwrap();
        let second = compile(&build(&shuffled)).unwrap();
        prop_assert_eq!(original == shuffled, first == second);
    }
}
