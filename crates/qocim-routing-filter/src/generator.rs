// crates/qocim-routing-filter/src/generator.rs
// ============================================================================
// Module: Filter Generator Chain
// Description: Ordered generator strategies rendering routing filter code.
// Purpose: Turn constraints or criterion trees into one rejection guard.
// Dependencies: crate::{config, error, runtime}, qocim-core
// ============================================================================

//! ## Overview
//! A [`GeneratorChain`] is a fixed ordered list of [`FilterGenerator`]
//! strategies: one begin generator, one guard generator per metric definition
//! (first-seen order) or one guard generator per criterion tree, and one end
//! generator. Rendering folds the chain into a single buffer. Generators keep
//! no state between calls, so a chain renders the same text every time.
//!
//! Each guard renders "the metadata set lacks a satisfying indicator of this
//! family". Guards are joined with the configured [`MissingPolicy`] junction
//! inside one `if (...) { return false; }` statement.
//!
//! The header carries the criterion identifiers (escaped so they cannot leave
//! the comment line) and the canonical digest of the ordered constraint list,
//! so distinct ordered inputs never share an artifact.
//!
//! [`MissingPolicy`]: crate::config::MissingPolicy

// ============================================================================
// SECTION: Imports
// ============================================================================

use qocim_core::Combinator;
use qocim_core::CriterionArena;
use qocim_core::CriterionError;
use qocim_core::CriterionIndex;
use qocim_core::CriterionNode;
use qocim_core::HashDigest;
use qocim_core::MetricDefinition;
use qocim_core::PrimitiveCriterion;
use qocim_core::QocConstraint;
use qocim_core::QocOperator;
use qocim_core::SelectionOperator;
use qocim_core::constraint_list_digest;
use serde_json::Number;

use crate::config::RoutingFilterConfig;
use crate::error::RoutingFilterError;
use crate::runtime::MAX_FILTER_NESTING;

// ============================================================================
// SECTION: Language Constants
// ============================================================================

/// Built-in testing whether a metadata set carries a metric definition.
pub const HAS_DEFINITION_BUILTIN: &str = "hasQoCMetricDefinition";
/// Built-in comparing a metadata set against a threshold.
pub const MATCH_VALUE_BUILTIN: &str = "matchQoCMetricValue";
/// Message path the metadata variable is bound to.
pub const METADATA_SOURCE: &str = "message.qocMetaData";
/// Prefix of the header comment listing compiled criteria.
pub const CRITERIA_COMMENT: &str = "// criteria:";
/// Prefix of the header comment carrying the constraint list digest.
pub const CONSTRAINTS_COMMENT: &str = "// constraints:";
/// Maximum composite nesting of a compilable criterion tree.
///
/// The guard adds four levels around the tree: the `if` condition, the
/// outer negation, a negated atom, and the built-in call.
pub const MAX_CRITERION_DEPTH: usize = MAX_FILTER_NESTING - 4;

// ============================================================================
// SECTION: Generator Trait
// ============================================================================

/// Rendering context shared by every generator of a chain.
#[derive(Debug, Clone, Copy)]
pub struct GeneratorContext<'a> {
    /// Compiler configuration.
    pub config: &'a RoutingFilterConfig,
}

/// One step of a generator chain.
pub trait FilterGenerator {
    /// Appends this generator's fragment to `out` and returns the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingFilterError`] when the fragment cannot be rendered.
    fn generate(
        &self,
        context: &GeneratorContext<'_>,
        out: String,
    ) -> Result<String, RoutingFilterError>;
}

// ============================================================================
// SECTION: Begin / End Generators
// ============================================================================

/// Emits the header comments, the metadata binding, and the guard opening.
#[derive(Debug, Clone)]
pub struct BeginGenerator {
    /// Escaped criterion identifiers in input order.
    criteria: Vec<String>,
    /// Digest of the ordered constraint list.
    digest: HashDigest,
}

impl FilterGenerator for BeginGenerator {
    fn generate(
        &self,
        context: &GeneratorContext<'_>,
        mut out: String,
    ) -> Result<String, RoutingFilterError> {
        out.push_str(CRITERIA_COMMENT);
        for (index, criterion) in self.criteria.iter().enumerate() {
            out.push_str(if index == 0 { " " } else { ", " });
            out.push_str(criterion);
        }
        out.push('\n');
        out.push_str(CONSTRAINTS_COMMENT);
        out.push(' ');
        out.push_str(&self.digest.to_string());
        out.push('\n');
        out.push_str("var ");
        out.push_str(&context.config.metadata_variable);
        out.push_str(" = ");
        out.push_str(METADATA_SOURCE);
        out.push_str(";\nif (");
        Ok(out)
    }
}

/// Closes the guard and emits the accepting fallthrough.
#[derive(Debug, Clone, Copy, Default)]
pub struct EndGenerator;

impl FilterGenerator for EndGenerator {
    fn generate(
        &self,
        context: &GeneratorContext<'_>,
        mut out: String,
    ) -> Result<String, RoutingFilterError> {
        out.push_str(") {\n");
        out.push_str(&context.config.indent());
        out.push_str("return false;\n}\nreturn true;\n");
        Ok(out)
    }
}

// ============================================================================
// SECTION: Family Generator
// ============================================================================

/// Emits the missing test of one metric definition.
///
/// # Invariants
/// - `constraints` is non-empty and shares `definition`.
#[derive(Debug, Clone)]
pub struct FamilyGenerator<'a> {
    /// Position among guard generators (0 for the first).
    position: usize,
    /// Metric definition of the family.
    definition: MetricDefinition,
    /// Constraints of the family in input order.
    constraints: Vec<&'a QocConstraint>,
}

impl FamilyGenerator<'_> {
    /// Returns the family's metric definition.
    #[must_use]
    pub const fn definition(&self) -> MetricDefinition {
        self.definition
    }
}

impl FilterGenerator for FamilyGenerator<'_> {
    fn generate(
        &self,
        context: &GeneratorContext<'_>,
        mut out: String,
    ) -> Result<String, RoutingFilterError> {
        if self.position > 0 {
            out.push_str(context.config.missing_policy.junction());
        }
        let variable = &context.config.metadata_variable;
        let atoms: Vec<Atom> = self
            .constraints
            .iter()
            .map(|constraint| {
                Atom::new(
                    variable,
                    constraint.definition(),
                    constraint.operator,
                    Some(&constraint.threshold().value),
                    None,
                )
            })
            .collect();
        match atoms.as_slice() {
            [single] => out.push_str(&single.render_negation()),
            many => {
                out.push_str("!(");
                out.push_str(&join_atoms(many, " && "));
                out.push(')');
            }
        }
        Ok(out)
    }
}

// ============================================================================
// SECTION: Criterion Generator
// ============================================================================

/// Emits the rejection test of a whole criterion tree.
#[derive(Debug, Clone, Copy)]
pub struct CriterionGenerator<'a> {
    /// Arena holding the tree.
    arena: &'a CriterionArena,
    /// Root of the tree.
    root: CriterionIndex,
}

impl FilterGenerator for CriterionGenerator<'_> {
    fn generate(
        &self,
        context: &GeneratorContext<'_>,
        mut out: String,
    ) -> Result<String, RoutingFilterError> {
        let variable = &context.config.metadata_variable;
        let expression = render_node(self.arena, self.root, variable, 0)?;
        out.push('!');
        if expression.starts_with('(') {
            out.push_str(&expression);
        } else {
            out.push('(');
            out.push_str(&expression);
            out.push(')');
        }
        Ok(out)
    }
}

/// Renders a criterion node as a satisfaction expression.
///
/// `depth` counts the composites enclosing `index`.
fn render_node(
    arena: &CriterionArena,
    index: CriterionIndex,
    variable: &str,
    depth: usize,
) -> Result<String, RoutingFilterError> {
    let node = arena.get(index).ok_or(CriterionError::UnknownIndex(index.get()))?;
    match node {
        CriterionNode::Primitive(primitive) => Ok(primitive_atom(primitive, variable)?.render()),
        CriterionNode::Composite(composite) => {
            let depth = depth + 1;
            if depth > MAX_CRITERION_DEPTH {
                return Err(RoutingFilterError::CriterionTooDeep {
                    max_depth: MAX_CRITERION_DEPTH,
                    depth,
                });
            }
            let separator = match composite.combinator {
                Combinator::And => " && ",
                Combinator::Or => " || ",
            };
            let mut parts = Vec::with_capacity(composite.children.len());
            for child in &composite.children {
                parts.push(render_node(arena, *child, variable, depth)?);
            }
            Ok(format!("({})", parts.join(separator)))
        }
    }
}

/// Builds the atom of a primitive criterion.
fn primitive_atom(
    primitive: &PrimitiveCriterion,
    variable: &str,
) -> Result<Atom, RoutingFilterError> {
    if primitive.operator.is_unary() {
        return Ok(Atom::new(variable, primitive.definition, primitive.operator, None, None));
    }
    let threshold = primitive
        .effective_threshold()
        .ok_or_else(|| RoutingFilterError::MissingThreshold(primitive.id.clone()))?;
    Ok(Atom::new(
        variable,
        primitive.definition,
        primitive.operator,
        Some(&threshold),
        primitive.selection,
    ))
}

// ============================================================================
// SECTION: Atoms
// ============================================================================

/// Built-in call, possibly negated, testing one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Atom {
    /// Rendered built-in call.
    call: String,
    /// True when the satisfaction test is the negated call.
    negated: bool,
}

impl Atom {
    /// Builds the satisfaction atom of an operator applied to a definition.
    fn new(
        variable: &str,
        definition: MetricDefinition,
        operator: QocOperator,
        threshold: Option<&Number>,
        selection: Option<SelectionOperator>,
    ) -> Self {
        let definition_id = definition.definition_id();
        let presence = format!("{HAS_DEFINITION_BUILTIN}({variable}, \"{definition_id}\")");
        match (operator, threshold) {
            (QocOperator::NotExists, _) => Self {
                call: presence,
                negated: true,
            },
            (QocOperator::Exists, _) | (_, None) => Self {
                call: presence,
                negated: false,
            },
            (_, Some(threshold)) => {
                let selection = selection
                    .map(|selection| format!(", \"{}\"", selection.as_str()))
                    .unwrap_or_default();
                Self {
                    call: format!(
                        "{MATCH_VALUE_BUILTIN}({variable}, \"{definition_id}\", \"{}\", \
                         {threshold}{selection})",
                        operator.as_str()
                    ),
                    negated: false,
                }
            }
        }
    }

    /// Renders the satisfaction test.
    fn render(&self) -> String {
        if self.negated { format!("!{}", self.call) } else { self.call.clone() }
    }

    /// Renders the negation of the satisfaction test.
    fn render_negation(&self) -> String {
        if self.negated { self.call.clone() } else { format!("!{}", self.call) }
    }
}

/// Joins rendered atoms with a separator.
fn join_atoms(atoms: &[Atom], separator: &str) -> String {
    atoms.iter().map(Atom::render).collect::<Vec<_>>().join(separator)
}

// ============================================================================
// SECTION: Chain
// ============================================================================

/// Ordered list of generators folded into one filter.
pub struct GeneratorChain<'a> {
    /// Generators in rendering order.
    generators: Vec<Box<dyn FilterGenerator + 'a>>,
}

impl<'a> GeneratorChain<'a> {
    /// Builds the chain for an ordered constraint list.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingFilterError::EmptyConstraintList`] for an empty list and
    /// [`RoutingFilterError::Hash`] when the list cannot be digested.
    pub fn for_constraints(constraints: &'a [QocConstraint]) -> Result<Self, RoutingFilterError> {
        if constraints.is_empty() {
            return Err(RoutingFilterError::EmptyConstraintList);
        }
        let mut families: Vec<FamilyGenerator<'a>> = Vec::new();
        for constraint in constraints {
            let definition = constraint.definition();
            if let Some(family) =
                families.iter_mut().find(|family| family.definition == definition)
            {
                family.constraints.push(constraint);
            } else {
                families.push(FamilyGenerator {
                    position: families.len(),
                    definition,
                    constraints: vec![constraint],
                });
            }
        }
        let criteria = constraints
            .iter()
            .map(|constraint| escape_identifier(constraint.criterion_id.as_str()))
            .collect();
        let digest = constraint_list_digest(constraints)?;
        let mut generators: Vec<Box<dyn FilterGenerator + 'a>> =
            Vec::with_capacity(families.len() + 2);
        generators.push(Box::new(BeginGenerator {
            criteria,
            digest,
        }));
        for family in families {
            generators.push(Box::new(family));
        }
        generators.push(Box::new(EndGenerator));
        Ok(Self {
            generators,
        })
    }

    /// Builds the chain for a criterion tree.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingFilterError::Criterion`] when `root` is not in the arena
    /// and [`RoutingFilterError::Hash`] when its leaves cannot be digested.
    pub fn for_criterion(
        arena: &'a CriterionArena,
        root: CriterionIndex,
    ) -> Result<Self, RoutingFilterError> {
        let node = arena.get(root).ok_or(CriterionError::UnknownIndex(root.get()))?;
        let digest = constraint_list_digest(&arena.constraints(root)?)?;
        let generators: Vec<Box<dyn FilterGenerator + 'a>> = vec![
            Box::new(BeginGenerator {
                criteria: vec![escape_identifier(node.id().as_str())],
                digest,
            }),
            Box::new(CriterionGenerator {
                arena,
                root,
            }),
            Box::new(EndGenerator),
        ];
        Ok(Self {
            generators,
        })
    }

    /// Returns the number of generators in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.generators.len()
    }

    /// Returns true when the chain holds no generators.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Folds every generator into one code buffer.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingFilterError::Config`] for an invalid configuration and
    /// [`RoutingFilterError`] when a generator fails.
    pub fn render(&self, config: &RoutingFilterConfig) -> Result<String, RoutingFilterError> {
        config.validate()?;
        let context = GeneratorContext {
            config,
        };
        self.generators
            .iter()
            .try_fold(String::new(), |out, generator| generator.generate(&context, out))
    }
}

/// Escapes an identifier for the header comment.
///
/// Characters outside `[A-Za-z0-9._[] -]` (the backslash included) become
/// `\u{<hex>}`, so no line terminator survives and distinct identifiers stay
/// distinct.
fn escape_identifier(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '[' | ']' | ' ' | '-') {
            out.push(ch);
        } else {
            out.push_str(&format!("\\u{{{:x}}}", u32::from(ch)));
        }
    }
    out
}
