// crates/qocim-core/tests/criterion.rs
// ============================================================================
// Test Module: Criterion Arena
// Coverage: Arena construction rules, constraint flattening, evaluation.
// ============================================================================
//! ## Overview
//! Integration tests for criterion trees stored in an arena.

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

use qocim_core::Combinator;
use qocim_core::CriterionArena;
use qocim_core::CriterionError;
use qocim_core::CriterionId;
use qocim_core::IndicatorId;
use qocim_core::MetricDefinition;
use qocim_core::MetricUnit;
use qocim_core::PrimitiveCriterion;
use qocim_core::QocOperator;
use qocim_core::SelectionOperator;
use support::TestResult;
use support::ensure;
use support::freshness;
use support::percent_precision;
use support::perthousand_precision;

// ============================================================================
// SECTION: Construction
// ============================================================================

#[test]
fn duplicate_ids_are_rejected() -> TestResult {
    let mut arena = CriterionArena::new();
    arena.add_primitive(PrimitiveCriterion::exists("[1]", MetricDefinition::Freshness))?;
    let result =
        arena.add_primitive(PrimitiveCriterion::exists("[1]", MetricDefinition::Freshness));
    ensure(
        result == Err(CriterionError::DuplicateId(CriterionId::new("[1]"))),
        "duplicate id must fail",
    )
}

#[test]
fn binary_criterion_without_any_threshold_is_rejected() -> TestResult {
    let custom = MetricDefinition::custom(IndicatorId::new(42), 1, MetricUnit::Scalar)?;
    let mut arena = CriterionArena::new();
    let result = arena.add_primitive(PrimitiveCriterion {
        id: CriterionId::new("[42]"),
        definition: custom,
        operator: QocOperator::Gt,
        threshold: None,
        selection: None,
    });
    ensure(
        result == Err(CriterionError::MissingThreshold(CriterionId::new("[42]"))),
        "custom definitions have no default",
    )?;
    ensure(arena.is_empty(), "nothing was added")?;
    arena.add_primitive(PrimitiveCriterion::exists("[42]", custom))?;
    ensure(arena.len() == 1, "presence needs no threshold")
}

#[test]
fn empty_composites_are_rejected() {
    let mut arena = CriterionArena::new();
    let result = arena.add_composite("[2]", Combinator::And, []);
    assert!(matches!(result, Err(CriterionError::EmptyComposite(_))));
}

#[test]
fn children_have_a_single_owner() -> TestResult {
    let mut arena = CriterionArena::new();
    let leaf =
        arena.add_primitive(PrimitiveCriterion::exists("[10]", MetricDefinition::PercentPrecision))?;
    let parent = arena.add_composite("[2]", Combinator::Or, [leaf])?;
    ensure(arena.owner(leaf) == Some(parent), "leaf owned by parent")?;
    let result = arena.add_composite("[3]", Combinator::Or, [leaf]);
    ensure(
        matches!(result, Err(CriterionError::ChildAlreadyOwned { .. })),
        "second owner must fail",
    )?;
    ensure(arena.len() == 2, "failed insert must not allocate")
}

#[test]
fn children_cannot_repeat_or_be_unknown() -> TestResult {
    let mut arena = CriterionArena::new();
    let leaf = arena.add_primitive(PrimitiveCriterion::exists("[1]", MetricDefinition::Freshness))?;
    let repeated = arena.add_composite("[2]", Combinator::And, [leaf, leaf]);
    ensure(
        matches!(repeated, Err(CriterionError::ChildAlreadyOwned { .. })),
        "repeated child must fail",
    )?;
    let mut other = CriterionArena::new();
    let foreign = other.add_primitive(PrimitiveCriterion::exists("[a]", MetricDefinition::Freshness))?;
    let _ = other.add_primitive(PrimitiveCriterion::exists("[b]", MetricDefinition::Freshness))?;
    let second = other.add_primitive(PrimitiveCriterion::exists("[c]", MetricDefinition::Freshness))?;
    ensure(foreign.get() == 0, "first slot")?;
    let unknown = arena.add_composite("[3]", Combinator::And, [second]);
    ensure(unknown == Err(CriterionError::UnknownIndex(2)), "unknown index must fail")
}

// ============================================================================
// SECTION: Flattening
// ============================================================================

#[test]
fn constraints_follow_tree_order_with_default_thresholds() -> TestResult {
    let mut arena = CriterionArena::new();
    let percent =
        arena.add_primitive(PrimitiveCriterion::exists("[10.1]", MetricDefinition::PercentPrecision))?;
    let fresh = arena.add_primitive(PrimitiveCriterion::compare(
        "[1.1]",
        MetricDefinition::Freshness,
        QocOperator::Lt,
        60_u32,
    ))?;
    let root = arena.add_composite("[root]", Combinator::And, [fresh, percent])?;
    let constraints = arena.constraints(root)?;
    ensure(constraints.len() == 2, "two leaves")?;
    ensure(constraints[0].criterion_id.as_str() == "[1.1]", "freshness first")?;
    ensure(constraints[0].operator == QocOperator::Lt, "operator kept")?;
    ensure(constraints[0].threshold().value.as_u64() == Some(60), "threshold kept")?;
    ensure(constraints[1].definition() == MetricDefinition::PercentPrecision, "percent second")?;
    ensure(constraints[1].threshold().value.as_u64() == Some(0), "default threshold")
}

#[test]
fn defaulted_threshold_is_the_one_evaluated_and_flattened() -> TestResult {
    let mut arena = CriterionArena::new();
    let at_least = arena.add_primitive(PrimitiveCriterion {
        id: CriterionId::new("[10.1]"),
        definition: MetricDefinition::PercentPrecision,
        operator: QocOperator::Ge,
        threshold: None,
        selection: None,
    })?;
    ensure(arena.evaluate(at_least, &[percent_precision(50)])?, "50 >= default 0")?;
    ensure(!arena.evaluate(at_least, &[freshness(1)])?, "absent family fails")?;
    let constraints = arena.constraints(at_least)?;
    ensure(constraints[0].threshold().value.as_u64() == Some(0), "flattened at default")
}

// ============================================================================
// SECTION: Evaluation
// ============================================================================

#[test]
fn and_or_evaluation() -> TestResult {
    let mut arena = CriterionArena::new();
    let percent =
        arena.add_primitive(PrimitiveCriterion::exists("[10.1]", MetricDefinition::PercentPrecision))?;
    let perthousand = arena
        .add_primitive(PrimitiveCriterion::exists("[10.2]", MetricDefinition::PerthousandPrecision))?;
    let precision = arena.add_composite("[10]", Combinator::Or, [percent, perthousand])?;
    let fresh = arena.add_primitive(PrimitiveCriterion::compare(
        "[1]",
        MetricDefinition::Freshness,
        QocOperator::Le,
        5_u32,
    ))?;
    let root = arena.add_composite("[root]", Combinator::And, [precision, fresh])?;

    ensure(
        arena.evaluate(root, &[perthousand_precision(10), freshness(2)])?,
        "precision and fresh data satisfy",
    )?;
    ensure(
        !arena.evaluate(root, &[percent_precision(10), freshness(9)])?,
        "stale data fails",
    )?;
    ensure(!arena.evaluate(root, &[freshness(1)])?, "missing precision fails")
}

#[test]
fn selection_picks_indicator_before_comparing() -> TestResult {
    let mut arena = CriterionArena::new();
    let best = arena.add_primitive(
        PrimitiveCriterion::compare(
            "[10.1]",
            MetricDefinition::PercentPrecision,
            QocOperator::Ge,
            80_u32,
        )
        .with_selection(SelectionOperator::Max),
    )?;
    let indicators = [percent_precision(20), percent_precision(90)];
    ensure(arena.evaluate(best, &indicators)?, "max selection sees 90")?;

    let mut plain = CriterionArena::new();
    let first = plain.add_primitive(PrimitiveCriterion::compare(
        "[10.1]",
        MetricDefinition::PercentPrecision,
        QocOperator::Ge,
        80_u32,
    ))?;
    ensure(!plain.evaluate(first, &indicators)?, "first indicator is 20")
}
