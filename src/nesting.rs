//! Self-nesting guard
//!
//! Derives, for a construction path, the set of generic definitions already
//! open above it. When the policy forbids self-nesting, candidates carrying
//! any of those identities are kept out of candidate listings regardless of
//! what the constraint evaluator would report. This check exists purely to
//! bound recursion and takes precedence over everything else.

use crate::path::ConstructionPath;
use crate::state::ConstructionState;
use crate::types::{TypeId, TypeNode};
use std::collections::HashSet;

/// The root definition plus every open generic definition chosen along the
/// path from the root down to (excluding) `target_path`.
pub fn ancestor_definitions(
    root_definition: &TypeId,
    target_path: &ConstructionPath,
    state: &ConstructionState,
) -> HashSet<TypeId> {
    let mut ancestors = HashSet::new();
    ancestors.insert(root_definition.clone());

    let mut prefix = ConstructionPath::root();
    for &index in target_path.segments() {
        let Some(slots) = state.get_slots(&prefix) else {
            break;
        };
        let Some(Some(node)) = slots.get(index as usize) else {
            break;
        };
        if let TypeNode::Definition(id) = node {
            ancestors.insert(id.clone());
        }
        prefix = prefix.child(index);
    }
    ancestors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_definition_is_always_an_ancestor() {
        let state = ConstructionState::new();
        let ancestors = ancestor_definitions(
            &TypeId::new("Wrapper"),
            &ConstructionPath::root(),
            &state,
        );
        assert_eq!(ancestors, HashSet::from([TypeId::new("Wrapper")]));
    }

    #[test]
    fn test_intermediate_definitions_accumulate_along_the_path() {
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 1);
        state.set_slot(&root, 0, Some(TypeNode::definition("Inner")));
        state.ensure_entry(root.child(0), 1);
        state.set_slot(&root.child(0), 0, Some(TypeNode::definition("Leaf")));
        state.ensure_entry(root.child(0).child(0), 1);

        let ancestors = ancestor_definitions(
            &TypeId::new("Outer"),
            &root.child(0).child(0),
            &state,
        );
        assert_eq!(
            ancestors,
            HashSet::from([
                TypeId::new("Outer"),
                TypeId::new("Inner"),
                TypeId::new("Leaf"),
            ])
        );
    }

    #[test]
    fn test_concrete_selections_do_not_contribute_ancestors() {
        let mut state = ConstructionState::new();
        let root = ConstructionPath::root();
        state.ensure_entry(root.clone(), 1);
        state.set_slot(
            &root,
            0,
            Some(TypeNode::constructed("Inner", vec![TypeNode::simple("X")])),
        );

        let ancestors = ancestor_definitions(&TypeId::new("Outer"), &root.child(0), &state);
        assert_eq!(ancestors, HashSet::from([TypeId::new("Outer")]));
    }

    #[test]
    fn test_walk_stops_at_missing_state() {
        let state = ConstructionState::new();
        let deep = ConstructionPath::from_indices(&[0, 1, 2]);
        let ancestors = ancestor_definitions(&TypeId::new("Outer"), &deep, &state);
        assert_eq!(ancestors, HashSet::from([TypeId::new("Outer")]));
    }
}
