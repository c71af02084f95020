//! Constraint evaluation for generic parameter slots
//!
//! Decides whether a candidate type may fill a given slot. The verdict is
//! tri-state: `Hidden` candidates can never satisfy the slot and are kept out
//! of listings entirely, `VisibleButInvalid` candidates are legal starting
//! points that need further construction, and `Valid` candidates are legal
//! final arguments. Evaluation never raises; callers interpret the verdict.
//!
//! Checks run in a fixed order and short-circuit to `Hidden` on the first
//! hard failure: reference-type, value-type, default-constructor, then every
//! declared base-class/interface constraint (AND semantics). Dependent
//! parameter constraints (a constraint naming a sibling parameter) are not
//! evaluated here; see `TypeCatalog::validate_instantiation`.

use crate::catalog::TypeCatalog;
use crate::types::{GenericParameterSlot, TypeKinds, TypeNode};
use std::collections::HashSet;
use std::fmt;

/// Why a candidate failed (or has not yet satisfied) a slot's constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintFailure {
    /// Candidate is a value type, pointer, by-ref, or void under `: class`.
    NotAReferenceType,
    /// Candidate is not a value type under `: struct`.
    NotAValueType,
    /// Candidate is a nullable-wrapped value type under `: struct`.
    NullableValueType,
    /// Interfaces can never be instantiated, so `new()` is unsatisfiable.
    InterfaceCannotBeInstantiated,
    /// Abstract reference types cannot satisfy `new()`.
    AbstractType,
    /// Reference type without a public parameterless constructor.
    NoParameterlessConstructor,
    /// Open generic definition that clears the `new()` checks but must be
    /// constructed before it can actually satisfy them.
    RequiresConstruction,
    /// A declared base-class/interface constraint is not satisfied.
    UnsatisfiedConstraint(TypeNode),
}

impl fmt::Display for ConstraintFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAReferenceType => write!(f, "not a reference type"),
            Self::NotAValueType => write!(f, "not a value type"),
            Self::NullableValueType => write!(f, "nullable value types do not satisfy `struct`"),
            Self::InterfaceCannotBeInstantiated => {
                write!(f, "interfaces cannot satisfy `new()`")
            }
            Self::AbstractType => write!(f, "abstract types cannot satisfy `new()`"),
            Self::NoParameterlessConstructor => {
                write!(f, "no public parameterless constructor")
            }
            Self::RequiresConstruction => {
                write!(f, "open generic definition requires construction")
            }
            Self::UnsatisfiedConstraint(constraint) => {
                write!(f, "does not satisfy constraint `{constraint}`")
            }
        }
    }
}

/// Tri-state verdict for one (candidate, slot) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintCheckResult {
    /// Legal final argument for the slot.
    Valid,
    /// May be shown and chosen as a starting point, but is not currently a
    /// legal final argument.
    VisibleButInvalid(ConstraintFailure),
    /// Must not be shown for this slot at all.
    Hidden(ConstraintFailure),
}

impl ConstraintCheckResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden(_))
    }

    /// True for `Valid` and `VisibleButInvalid`.
    pub fn is_visible(&self) -> bool {
        !self.is_hidden()
    }
}

/// Evaluate `candidate` against a slot's declared constraints. An absent
/// parameter means the position is unconstrained and anything goes.
pub fn evaluate(
    catalog: &dyn TypeCatalog,
    candidate: &TypeNode,
    parameter: Option<&GenericParameterSlot>,
) -> ConstraintCheckResult {
    let Some(parameter) = parameter else {
        return ConstraintCheckResult::Valid;
    };
    let set = &parameter.constraints;
    let kind = catalog.kind(candidate);

    if set.reference_type
        && (kind.is_value_type() || kind.intersects(TypeKinds::UNINHABITABLE))
    {
        return ConstraintCheckResult::Hidden(ConstraintFailure::NotAReferenceType);
    }

    if set.value_type {
        if !kind.is_value_type() {
            return ConstraintCheckResult::Hidden(ConstraintFailure::NotAValueType);
        }
        if catalog.is_nullable_wrapper(candidate.id()) {
            return ConstraintCheckResult::Hidden(ConstraintFailure::NullableValueType);
        }
    }

    // The `new()` verdict for an open definition is deferred rather than
    // returned: a later base/interface check can still downgrade it to
    // Hidden, which takes precedence over VisibleButInvalid.
    let mut deferred = None;
    if set.default_constructor {
        if kind.contains(TypeKinds::INTERFACE) {
            return ConstraintCheckResult::Hidden(ConstraintFailure::InterfaceCannotBeInstantiated);
        }
        if !kind.is_value_type() {
            if kind.contains(TypeKinds::ABSTRACT) {
                return ConstraintCheckResult::Hidden(ConstraintFailure::AbstractType);
            }
            if !catalog.has_parameterless_constructor(candidate) {
                return ConstraintCheckResult::Hidden(ConstraintFailure::NoParameterlessConstructor);
            }
        }
        if candidate.is_open_definition() {
            deferred = Some(ConstraintCheckResult::VisibleButInvalid(
                ConstraintFailure::RequiresConstruction,
            ));
        }
    }

    for constraint in &set.constraint_types {
        let satisfied = if candidate.is_open_definition() {
            // Assignability cannot be tested against unbound parameters, so
            // walk the candidate's own declared hierarchy and compare each
            // entry against the constraint by open-generic shape.
            hierarchy_satisfies(catalog, candidate, constraint)
        } else {
            catalog.is_assignable(constraint, candidate)
        };
        if !satisfied {
            return ConstraintCheckResult::Hidden(ConstraintFailure::UnsatisfiedConstraint(
                constraint.clone(),
            ));
        }
    }

    deferred.unwrap_or(ConstraintCheckResult::Valid)
}

/// Check one declared constraint against an open definition's base-type chain
/// and interface list. A generic constraint matches any chain entry with the
/// same open-generic identity; a non-generic constraint matches through
/// direct assignability.
fn hierarchy_satisfies(
    catalog: &dyn TypeCatalog,
    candidate: &TypeNode,
    constraint: &TypeNode,
) -> bool {
    let mut seen: HashSet<TypeNode> = HashSet::new();
    let mut stack = vec![candidate.clone()];
    while let Some(node) = stack.pop() {
        if !seen.insert(node.clone()) {
            continue;
        }
        if shape_matches(&node, constraint) || catalog.is_assignable(constraint, &node) {
            return true;
        }
        if let Some(base) = catalog.base_type(&node) {
            stack.push(base);
        }
        stack.extend(catalog.interfaces(&node));
    }
    false
}

/// Open-generic-identity comparison: an unbound constraint shape matches an
/// unbound candidate shape of the same definition.
fn shape_matches(node: &TypeNode, constraint: &TypeNode) -> bool {
    match constraint {
        TypeNode::Definition(id) | TypeNode::Constructed { base: id, .. } => {
            !matches!(node, TypeNode::Simple(_)) && node.id() == id
        }
        TypeNode::Simple(_) => false,
    }
}
