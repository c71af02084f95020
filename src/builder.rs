//! Type builder
//!
//! Recursively assembles a final type from the construction state tree,
//! depth-first, resolving children before parents. `try_build` is pure with
//! respect to the state: it never mutates, so building twice with no
//! intervening edits yields identical results, and a failed build leaves the
//! pre-commit state available for continued editing.

use crate::catalog::TypeCatalog;
use crate::constraints::{evaluate, ConstraintCheckResult};
use crate::error::BuildError;
use crate::path::ConstructionPath;
use crate::policy::Policy;
use crate::state::ConstructionState;
use crate::types::{ConstructionResult, TypeId, TypeNode};
use tracing::{debug, trace};

/// Hard ceiling on construction-tree recursion. The self-nesting guard
/// bounds well-behaved catalogs; this bounds degenerate ones that permit
/// self-nesting into very deep or cyclic definitions.
pub const MAX_BUILD_DEPTH: usize = 64;

/// Build the type rooted at `root_definition` from the recorded selections.
pub fn try_build(
    catalog: &dyn TypeCatalog,
    root_definition: &TypeId,
    state: &ConstructionState,
) -> Result<(TypeNode, ConstructionResult), BuildError> {
    build_at(catalog, root_definition, &ConstructionPath::root(), state, 0)
}

/// Build the sub-tree at `path`, refining `definition`. Used by the session
/// for nested apply operations.
pub fn try_build_at(
    catalog: &dyn TypeCatalog,
    definition: &TypeId,
    path: &ConstructionPath,
    state: &ConstructionState,
) -> Result<(TypeNode, ConstructionResult), BuildError> {
    build_at(catalog, definition, path, state, 0)
}

fn build_at(
    catalog: &dyn TypeCatalog,
    definition: &TypeId,
    path: &ConstructionPath,
    state: &ConstructionState,
    depth: usize,
) -> Result<(TypeNode, ConstructionResult), BuildError> {
    if depth >= MAX_BUILD_DEPTH {
        return Err(BuildError::DepthLimitExceeded {
            limit: MAX_BUILD_DEPTH,
        });
    }
    trace!(%definition, %path, depth, "building construction node");

    let arity = catalog.arity(definition);
    if arity == 0 {
        return Ok((
            TypeNode::Simple(definition.clone()),
            ConstructionResult::complete(),
        ));
    }

    let slots = state.get_slots(path);
    let mut result = ConstructionResult::complete();
    let mut args: Vec<TypeNode> = Vec::with_capacity(arity);
    let mut all_bound = true;

    for index in 0..arity {
        let slot = slots
            .and_then(|slots| slots.get(index))
            .cloned()
            .flatten();
        let Some(node) = slot else {
            result.all_arguments_selected = false;
            all_bound = false;
            continue;
        };

        let child_path = path.child(index as u32);
        if node.is_open_definition() && state.has_entry(&child_path) {
            let child_definition = node.id().clone();
            let (built, child_result) =
                build_at(catalog, &child_definition, &child_path, state, depth + 1)?;
            if child_result.all_arguments_selected {
                result.is_fully_concrete &= child_result.is_fully_concrete;
                args.push(built);
            } else {
                // the child refinement is incomplete; keep the unconstructed
                // definition in the slot
                result.all_arguments_selected = false;
                result.is_fully_concrete = false;
                args.push(node);
            }
        } else {
            if !node.is_fully_concrete() {
                result.is_fully_concrete = false;
            }
            args.push(node);
        }
    }

    if all_bound {
        let built = instantiate(catalog, definition, args)?;
        debug!(%built, ?result, "assembled constructed type");
        Ok((built, result))
    } else {
        result.is_fully_concrete = false;
        Ok((TypeNode::Definition(definition.clone()), result))
    }
}

/// Fallible generic instantiation: arity check, re-validation of each fully
/// bound argument against its slot, then the catalog's whole-combination
/// hook. A rejection here typically means a dependent parameter constraint
/// the per-slot checks could not see.
pub fn instantiate(
    catalog: &dyn TypeCatalog,
    definition: &TypeId,
    args: Vec<TypeNode>,
) -> Result<TypeNode, BuildError> {
    let arity = catalog.arity(definition);
    if args.len() != arity {
        return Err(BuildError::ArityMismatch {
            definition: definition.name().to_string(),
            expected: arity,
            found: args.len(),
        });
    }

    let parameters = catalog.parameters(definition);
    for (arg, parameter) in args.iter().zip(parameters.iter()) {
        if !arg.is_fully_concrete() {
            continue;
        }
        if let ConstraintCheckResult::Hidden(reason) = evaluate(catalog, arg, Some(parameter)) {
            return Err(BuildError::InvalidConstruction {
                definition: definition.name().to_string(),
                message: format!("argument `{arg}` for {}: {reason}", parameter.name),
            });
        }
    }

    catalog
        .validate_instantiation(definition, &args)
        .map_err(|message| BuildError::InvalidConstruction {
            definition: definition.name().to_string(),
            message,
        })?;

    Ok(TypeNode::Constructed {
        base: definition.clone(),
        args,
    })
}

/// Root-level commit policy: refuse results the policy does not permit.
pub fn enforce_commit_policy(
    built: &TypeNode,
    result: &ConstructionResult,
    policy: &Policy,
) -> Result<(), BuildError> {
    if !result.is_fully_concrete && !policy.allow_open_generics {
        return Err(BuildError::OpenGenericsNotAllowed {
            rendered: built.to_string(),
        });
    }
    Ok(())
}

/// Locate the first unset slot (depth-first) under `definition` at `path`,
/// for precise missing-argument diagnostics.
pub(crate) fn first_missing_slot(
    catalog: &dyn TypeCatalog,
    definition: &TypeId,
    path: &ConstructionPath,
    state: &ConstructionState,
) -> Option<(String, usize, String)> {
    let parameters = catalog.parameters(definition);
    let slots = state.get_slots(path);

    for (index, parameter) in parameters.iter().enumerate() {
        let slot = slots.and_then(|slots| slots.get(index)).cloned().flatten();
        match slot {
            None => {
                return Some((
                    definition.name().to_string(),
                    index,
                    parameter.name.clone(),
                ));
            }
            Some(node) => {
                let child_path = path.child(index as u32);
                if node.is_open_definition() && state.has_entry(&child_path) {
                    let found =
                        first_missing_slot(catalog, node.id(), &child_path, state);
                    if found.is_some() {
                        return found;
                    }
                }
            }
        }
    }
    None
}

pub(crate) fn missing_argument_error(
    catalog: &dyn TypeCatalog,
    definition: &TypeId,
    path: &ConstructionPath,
    state: &ConstructionState,
) -> BuildError {
    let (definition, slot_index, slot_name) =
        first_missing_slot(catalog, definition, path, state).unwrap_or_else(|| {
            (definition.name().to_string(), 0, String::from("?"))
        });
    BuildError::MissingArgument {
        definition,
        slot_index,
        slot_name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalog, TypeDescriptor};
    use crate::types::{ConstraintSet, GenericParameterSlot};
    use pretty_assertions::assert_eq;

    fn catalog() -> InMemoryCatalog {
        let mut catalog = InMemoryCatalog::new();
        catalog.register(TypeDescriptor::class("ConcreteA")).unwrap();
        catalog.register(TypeDescriptor::class("ConcreteB")).unwrap();
        catalog
            .register(
                TypeDescriptor::class("Pair")
                    .with_parameter(GenericParameterSlot::new(0, "T1"))
                    .with_parameter(GenericParameterSlot::new(1, "T2")),
            )
            .unwrap();
        catalog
            .register(
                TypeDescriptor::class("Box").with_parameter(GenericParameterSlot::new(0, "T")),
            )
            .unwrap();
        catalog
    }

    #[test]
    fn test_build_with_all_slots_bound() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 2);
        state.set_slot(&root, 0, Some(TypeNode::simple("ConcreteA")));
        state.set_slot(&root, 1, Some(TypeNode::simple("ConcreteB")));

        let (built, result) = try_build(&catalog, &TypeId::new("Pair"), &state).unwrap();
        assert_eq!(built.to_string(), "Pair<ConcreteA, ConcreteB>");
        assert!(result.is_fully_concrete);
        assert!(result.all_arguments_selected);
    }

    #[test]
    fn test_unset_slot_yields_bare_definition() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 2);
        state.set_slot(&root, 0, Some(TypeNode::simple("ConcreteA")));

        let (built, result) = try_build(&catalog, &TypeId::new("Pair"), &state).unwrap();
        assert_eq!(built, TypeNode::definition("Pair"));
        assert!(!result.all_arguments_selected);
        assert!(!result.is_fully_concrete);
    }

    #[test]
    fn test_nested_subtree_resolves_child_first() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 1);
        state.set_slot(&root, 0, Some(TypeNode::definition("Pair")));
        let child = root.child(0);
        state.ensure_entry(child.clone(), 2);
        state.set_slot(&child, 0, Some(TypeNode::simple("ConcreteA")));
        state.set_slot(&child, 1, Some(TypeNode::simple("ConcreteB")));

        let (built, result) = try_build(&catalog, &TypeId::new("Box"), &state).unwrap();
        assert_eq!(built.to_string(), "Box<Pair<ConcreteA, ConcreteB>>");
        assert!(result.is_fully_concrete);
        assert!(result.all_arguments_selected);
    }

    #[test]
    fn test_incomplete_subtree_leaves_unconstructed_definition() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 1);
        state.set_slot(&root, 0, Some(TypeNode::definition("Pair")));
        let child = root.child(0);
        state.ensure_entry(child.clone(), 2);
        state.set_slot(&child, 0, Some(TypeNode::simple("ConcreteA")));

        let (built, result) = try_build(&catalog, &TypeId::new("Box"), &state).unwrap();
        assert_eq!(built.to_string(), "Box<Pair<>>");
        assert!(!result.all_arguments_selected);
        assert!(!result.is_fully_concrete);
    }

    #[test]
    fn test_open_definition_argument_without_subtree_counts_as_selected() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 1);
        state.set_slot(&root, 0, Some(TypeNode::definition("Pair")));

        let (built, result) = try_build(&catalog, &TypeId::new("Box"), &state).unwrap();
        assert_eq!(built.to_string(), "Box<Pair<>>");
        assert!(result.all_arguments_selected);
        assert!(!result.is_fully_concrete);
    }

    #[test]
    fn test_build_is_idempotent() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 1);
        state.set_slot(&root, 0, Some(TypeNode::simple("ConcreteA")));

        let first = try_build(&catalog, &TypeId::new("Box"), &state).unwrap();
        let second = try_build(&catalog, &TypeId::new("Box"), &state).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_instantiate_checks_arity() {
        let catalog = catalog();
        let result = instantiate(
            &catalog,
            &TypeId::new("Pair"),
            vec![TypeNode::simple("ConcreteA")],
        );
        assert!(matches!(
            result,
            Err(BuildError::ArityMismatch {
                expected: 2,
                found: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_instantiate_revalidates_concrete_arguments() {
        let mut catalog = InMemoryCatalog::new();
        catalog.register(TypeDescriptor::interface("IData")).unwrap();
        catalog.register(TypeDescriptor::class("Plain")).unwrap();
        catalog
            .register(
                TypeDescriptor::class("Repository").with_parameter(
                    GenericParameterSlot::new(0, "TData").with_constraints(ConstraintSet {
                        constraint_types: vec![TypeNode::simple("IData")],
                        ..Default::default()
                    }),
                ),
            )
            .unwrap();

        let result = instantiate(
            &catalog,
            &TypeId::new("Repository"),
            vec![TypeNode::simple("Plain")],
        );
        assert!(matches!(
            result,
            Err(BuildError::InvalidConstruction { .. })
        ));
    }

    #[test]
    fn test_catalog_instantiation_rule_surfaces_as_invalid_construction() {
        let mut catalog = catalog();
        catalog.add_instantiation_rule(|definition, args| {
            if definition.name() == "Pair" && args[0] == args[1] {
                Err(String::from("T2 must differ from T1"))
            } else {
                Ok(())
            }
        });

        let rejected = instantiate(
            &catalog,
            &TypeId::new("Pair"),
            vec![TypeNode::simple("ConcreteA"), TypeNode::simple("ConcreteA")],
        );
        assert!(matches!(
            rejected,
            Err(BuildError::InvalidConstruction { message, .. }) if message.contains("must differ")
        ));

        let accepted = instantiate(
            &catalog,
            &TypeId::new("Pair"),
            vec![TypeNode::simple("ConcreteA"), TypeNode::simple("ConcreteB")],
        );
        assert!(accepted.is_ok());
    }

    #[test]
    fn test_depth_ceiling() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        // a degenerate Box<Box<Box<...>>> chain past the ceiling
        let mut path = ConstructionPath::root();
        for _ in 0..=MAX_BUILD_DEPTH {
            state.ensure_entry(path.clone(), 1);
            state.set_slot(&path, 0, Some(TypeNode::definition("Box")));
            path = path.child(0);
            state.ensure_entry(path.clone(), 1);
        }

        let result = try_build(&catalog, &TypeId::new("Box"), &state);
        assert!(matches!(
            result,
            Err(BuildError::DepthLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_commit_policy_rejects_open_result_by_default() {
        let built = TypeNode::constructed("Box", vec![TypeNode::definition("Pair")]);
        let result = ConstructionResult {
            is_fully_concrete: false,
            all_arguments_selected: true,
        };
        assert!(matches!(
            enforce_commit_policy(&built, &result, &Policy::default()),
            Err(BuildError::OpenGenericsNotAllowed { .. })
        ));
        assert!(enforce_commit_policy(&built, &result, &Policy::permissive()).is_ok());
    }

    #[test]
    fn test_first_missing_slot_descends_into_subtrees() {
        let catalog = catalog();
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 1);
        state.set_slot(&root, 0, Some(TypeNode::definition("Pair")));
        let child = root.child(0);
        state.ensure_entry(child.clone(), 2);
        state.set_slot(&child, 0, Some(TypeNode::simple("ConcreteA")));

        let missing = first_missing_slot(&catalog, &TypeId::new("Box"), &root, &state);
        assert_eq!(missing, Some((String::from("Pair"), 1, String::from("T2"))));
    }
}
