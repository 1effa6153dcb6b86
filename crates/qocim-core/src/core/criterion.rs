// crates/qocim-core/src/core/criterion.rs
// ============================================================================
// Module: QoCIM Criteria
// Description: Primitive and composite QoC criteria stored in an arena.
// Purpose: Model criterion trees without shared or back references.
// Dependencies: crate::core, crate::runtime::{aggregation, matcher}, smallvec, thiserror
// ============================================================================

//! ## Overview
//! Criteria live in a [`CriterionArena`] and are addressed by
//! [`CriterionIndex`]. A composite node lists child indices that were
//! allocated before it, and every child has at most one owner, so criterion
//! trees cannot contain cycles.
//!
//! Evaluation short-circuits in child order: `And` stops at the first
//! unsatisfied child and `Or` at the first satisfied one.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Number;
use smallvec::SmallVec;
use thiserror::Error;

use crate::core::constraint::QocConstraint;
use crate::core::context::Information;
use crate::core::identifiers::CriterionId;
use crate::core::identifiers::MetricValueId;
use crate::core::indicator::QocIndicator;
use crate::core::metric::MetricDefinition;
use crate::core::operator::QocOperator;
use crate::runtime::aggregation::AggregationOperator;
use crate::runtime::aggregation::SelectionOperator;
use crate::runtime::matcher::Operand;
use crate::runtime::matcher::matches;

// ============================================================================
// SECTION: Node Types
// ============================================================================

/// Index of a criterion node inside a [`CriterionArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriterionIndex(usize);

impl CriterionIndex {
    /// Returns the raw arena slot.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0
    }
}

/// Boolean combinator of a composite criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Combinator {
    /// Every child must be satisfied.
    And,
    /// At least one child must be satisfied.
    Or,
}

/// Criterion over a single indicator family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveCriterion {
    /// Criterion identifier.
    pub id: CriterionId,
    /// Indicator family the criterion applies to.
    pub definition: MetricDefinition,
    /// Comparison operator.
    pub operator: QocOperator,
    /// Threshold for binary operators, in the definition's unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<Number>,
    /// Selection used when several indicators of the family are present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionOperator>,
}

impl PrimitiveCriterion {
    /// Creates a presence criterion for the definition.
    #[must_use]
    pub fn exists(id: impl Into<CriterionId>, definition: MetricDefinition) -> Self {
        Self {
            id: id.into(),
            definition,
            operator: QocOperator::Exists,
            threshold: None,
            selection: None,
        }
    }

    /// Creates a threshold criterion for the definition.
    #[must_use]
    pub fn compare(
        id: impl Into<CriterionId>,
        definition: MetricDefinition,
        operator: QocOperator,
        threshold: impl Into<Number>,
    ) -> Self {
        Self {
            id: id.into(),
            definition,
            operator,
            threshold: Some(threshold.into()),
            selection: None,
        }
    }

    /// Returns the criterion with the given selection operator.
    #[must_use]
    pub fn with_selection(mut self, selection: SelectionOperator) -> Self {
        self.selection = Some(selection);
        self
    }

    /// Returns the threshold binary operators compare against.
    ///
    /// An absent threshold falls back to the definition's default value.
    #[must_use]
    pub fn effective_threshold(&self) -> Option<Number> {
        self.threshold.clone().or_else(|| self.definition.default_value())
    }
}

/// Criterion combining ordered sub-criteria.
///
/// # Invariants
/// - `children` is non-empty and every child index precedes the node's own index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeCriterion {
    /// Criterion identifier.
    pub id: CriterionId,
    /// Boolean combinator.
    pub combinator: Combinator,
    /// Child criteria in evaluation order.
    pub children: SmallVec<[CriterionIndex; 4]>,
}

/// Criterion node stored in the arena.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriterionNode {
    /// Primitive criterion.
    Primitive(PrimitiveCriterion),
    /// Composite criterion.
    Composite(CompositeCriterion),
}

impl CriterionNode {
    /// Returns the criterion identifier.
    #[must_use]
    pub const fn id(&self) -> &CriterionId {
        match self {
            Self::Primitive(primitive) => &primitive.id,
            Self::Composite(composite) => &composite.id,
        }
    }

    /// Returns true for composite nodes.
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while building or reading a criterion arena.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CriterionError {
    /// A criterion with the same identifier already exists.
    #[error("duplicate criterion id {0}")]
    DuplicateId(CriterionId),
    /// Composite criterion declared without children.
    #[error("composite criterion {0} has no children")]
    EmptyComposite(CriterionId),
    /// Index does not refer to a node of this arena.
    #[error("unknown criterion index {0}")]
    UnknownIndex(usize),
    /// Binary criterion has neither a threshold nor a definition default.
    #[error("criterion {0} needs a threshold for its binary operator")]
    MissingThreshold(CriterionId),
    /// Child already belongs to another composite (or is listed twice).
    #[error("criterion index {child} is already owned by {owner}")]
    ChildAlreadyOwned {
        /// Child arena slot.
        child: usize,
        /// Identifier of the existing owner.
        owner: CriterionId,
    },
}

// ============================================================================
// SECTION: Arena
// ============================================================================

/// Arena of criterion nodes.
///
/// # Invariants
/// - Criterion identifiers are unique.
/// - `owners[i]` is the composite that owns node `i`, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CriterionArena {
    /// Nodes in allocation order.
    nodes: Vec<CriterionNode>,
    /// Owning composite per node.
    owners: Vec<Option<CriterionIndex>>,
}

impl CriterionArena {
    /// Creates an empty arena.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            nodes: Vec::new(),
            owners: Vec::new(),
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true when the arena holds no nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the node at `index`.
    #[must_use]
    pub fn get(&self, index: CriterionIndex) -> Option<&CriterionNode> {
        self.nodes.get(index.0)
    }

    /// Finds a node by criterion identifier.
    #[must_use]
    pub fn find(&self, id: &CriterionId) -> Option<CriterionIndex> {
        self.nodes.iter().position(|node| node.id() == id).map(CriterionIndex)
    }

    /// Returns the owning composite of `index`, if any.
    #[must_use]
    pub fn owner(&self, index: CriterionIndex) -> Option<CriterionIndex> {
        self.owners.get(index.0).copied().flatten()
    }

    /// Adds a primitive criterion.
    ///
    /// # Errors
    ///
    /// Returns [`CriterionError::DuplicateId`] when the identifier is taken and
    /// [`CriterionError::MissingThreshold`] when a binary operator has nothing
    /// to compare against.
    pub fn add_primitive(
        &mut self,
        criterion: PrimitiveCriterion,
    ) -> Result<CriterionIndex, CriterionError> {
        self.ensure_unique(&criterion.id)?;
        if !criterion.operator.is_unary() && criterion.effective_threshold().is_none() {
            return Err(CriterionError::MissingThreshold(criterion.id));
        }
        Ok(self.push(CriterionNode::Primitive(criterion)))
    }

    /// Adds a composite criterion owning `children`.
    ///
    /// # Errors
    ///
    /// Returns [`CriterionError`] when the identifier is taken, the child list is
    /// empty, a child is unknown, or a child is already owned.
    pub fn add_composite(
        &mut self,
        id: impl Into<CriterionId>,
        combinator: Combinator,
        children: impl IntoIterator<Item = CriterionIndex>,
    ) -> Result<CriterionIndex, CriterionError> {
        let id = id.into();
        self.ensure_unique(&id)?;
        let children: SmallVec<[CriterionIndex; 4]> = children.into_iter().collect();
        if children.is_empty() {
            return Err(CriterionError::EmptyComposite(id));
        }
        for (position, child) in children.iter().enumerate() {
            if child.0 >= self.nodes.len() {
                return Err(CriterionError::UnknownIndex(child.0));
            }
            if let Some(owner) = self.owner(*child) {
                return Err(CriterionError::ChildAlreadyOwned {
                    child: child.0,
                    owner: self.nodes[owner.0].id().clone(),
                });
            }
            if children[.. position].contains(child) {
                return Err(CriterionError::ChildAlreadyOwned {
                    child: child.0,
                    owner: id,
                });
            }
        }
        let index = CriterionIndex(self.nodes.len());
        for child in &children {
            self.owners[child.0] = Some(index);
        }
        Ok(self.push(CriterionNode::Composite(CompositeCriterion {
            id,
            combinator,
            children,
        })))
    }

    /// Flattens the primitive leaves under `root` into constraints, in tree order.
    ///
    /// Leaves carry their effective threshold. Presence leaves without one
    /// carry zero, which the presence operators never read.
    ///
    /// # Errors
    ///
    /// Returns [`CriterionError::UnknownIndex`] when `root` is not in the arena
    /// and [`CriterionError::MissingThreshold`] for a binary leaf without a
    /// threshold.
    pub fn constraints(&self, root: CriterionIndex) -> Result<Vec<QocConstraint>, CriterionError> {
        let mut out = Vec::new();
        self.collect_constraints(root, &mut out)?;
        Ok(out)
    }

    /// Evaluates the criterion at `root` against a metadata set.
    ///
    /// # Errors
    ///
    /// Returns [`CriterionError::UnknownIndex`] when `root` is not in the arena.
    pub fn evaluate(
        &self,
        root: CriterionIndex,
        indicators: &[QocIndicator],
    ) -> Result<bool, CriterionError> {
        match self.node(root)? {
            CriterionNode::Primitive(primitive) => Ok(evaluate_primitive(primitive, indicators)),
            CriterionNode::Composite(composite) => {
                for child in &composite.children {
                    let satisfied = self.evaluate(*child, indicators)?;
                    match composite.combinator {
                        Combinator::And if !satisfied => return Ok(false),
                        Combinator::Or if satisfied => return Ok(true),
                        Combinator::And | Combinator::Or => {}
                    }
                }
                Ok(composite.combinator == Combinator::And)
            }
        }
    }

    /// Returns the node at `index` or an error.
    fn node(&self, index: CriterionIndex) -> Result<&CriterionNode, CriterionError> {
        self.nodes.get(index.0).ok_or(CriterionError::UnknownIndex(index.0))
    }

    /// Rejects identifiers that are already in use.
    fn ensure_unique(&self, id: &CriterionId) -> Result<(), CriterionError> {
        if self.find(id).is_some() {
            return Err(CriterionError::DuplicateId(id.clone()));
        }
        Ok(())
    }

    /// Appends a node and returns its index.
    fn push(&mut self, node: CriterionNode) -> CriterionIndex {
        self.nodes.push(node);
        self.owners.push(None);
        CriterionIndex(self.nodes.len() - 1)
    }

    /// Depth-first leaf collection.
    fn collect_constraints(
        &self,
        index: CriterionIndex,
        out: &mut Vec<QocConstraint>,
    ) -> Result<(), CriterionError> {
        match self.node(index)? {
            CriterionNode::Primitive(primitive) => {
                let threshold = match primitive.effective_threshold() {
                    Some(threshold) => threshold,
                    None if primitive.operator.is_unary() => Number::from(0_u32),
                    None => return Err(CriterionError::MissingThreshold(primitive.id.clone())),
                };
                let indicator = QocIndicator::new(
                    primitive.definition,
                    MetricValueId::placeholder(),
                    threshold,
                );
                out.push(
                    QocConstraint::new(primitive.id.clone(), indicator)
                        .with_operator(primitive.operator),
                );
            }
            CriterionNode::Composite(composite) => {
                for child in &composite.children {
                    self.collect_constraints(*child, out)?;
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Primitive Evaluation
// ============================================================================

/// Evaluates a primitive criterion against a metadata set.
fn evaluate_primitive(criterion: &PrimitiveCriterion, indicators: &[QocIndicator]) -> bool {
    if criterion.operator.is_unary() {
        let operand = Operand::Metadata {
            indicators,
            definition: criterion.definition,
        };
        return matches(criterion.operator, operand, None);
    }
    let candidates: Vec<&QocIndicator> =
        indicators.iter().filter(|indicator| indicator.definition() == criterion.definition).collect();
    let chosen = match criterion.selection {
        Some(selection) => select_indicator(selection, &candidates),
        None => candidates.first().copied(),
    };
    let Some(chosen) = chosen else {
        return false;
    };
    let threshold = criterion.effective_threshold().map(|value| criterion.definition.value(value));
    matches(criterion.operator, Operand::Value(chosen.metric_value()), threshold.as_ref())
}

/// Picks one indicator among candidates using a selection operator.
fn select_indicator<'a>(
    selection: SelectionOperator,
    candidates: &[&'a QocIndicator],
) -> Option<&'a QocIndicator> {
    let information: Vec<Information> =
        candidates.iter().map(|indicator| Information::from_indicator(indicator)).collect();
    let selected = selection.aggregate(&information)?;
    let position = information.iter().position(|item| std::ptr::eq(item, selected))?;
    candidates.get(position).copied()
}
