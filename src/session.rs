//! Construction session
//!
//! One editing session over one construction state tree: `Idle` until a root
//! definition is selected, then `Selecting` while arguments are picked,
//! expanded, applied, and finally committed or cancelled. Commit and cancel
//! both return the session to `Idle`. Operations are synchronous commands;
//! the engine never calls back into its caller mid-operation.

use crate::builder::{
    enforce_commit_policy, missing_argument_error, try_build, try_build_at, MAX_BUILD_DEPTH,
};
use crate::catalog::TypeCatalog;
use crate::constraints::{evaluate, ConstraintCheckResult};
use crate::error::{BuildError, SessionError};
use crate::nesting::ancestor_definitions;
use crate::path::ConstructionPath;
use crate::policy::Policy;
use crate::state::ConstructionState;
use crate::types::{GenericParameterSlot, TypeId, TypeNode};
use std::collections::HashSet;
use tracing::debug;

/// Result of `begin_construction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginOutcome {
    /// The session entered `Selecting`; arguments can now be picked.
    Editing,
    /// Construction is disabled by policy and the bare definition was
    /// committed directly.
    Committed(TypeNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SessionPhase {
    Idle,
    Selecting { root: TypeId },
}

/// Interactive construction of one generic type instantiation.
pub struct ConstructionSession<'a, C: TypeCatalog> {
    catalog: &'a C,
    policy: Policy,
    state: ConstructionState,
    phase: SessionPhase,
    committed: Option<TypeNode>,
}

impl<'a, C: TypeCatalog> ConstructionSession<'a, C> {
    pub fn new(catalog: &'a C, policy: Policy) -> Self {
        Self {
            catalog,
            policy,
            state: ConstructionState::new(),
            phase: SessionPhase::Idle,
            committed: None,
        }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.phase, SessionPhase::Selecting { .. })
    }

    /// The value stored by the most recent successful commit, if any.
    pub fn committed(&self) -> Option<&TypeNode> {
        self.committed.as_ref()
    }

    /// Start refining `definition`. With construction disabled by policy the
    /// bare definition commits directly when open generics are allowed, and
    /// is rejected outright otherwise.
    pub fn begin_construction(&mut self, definition: TypeId) -> Result<BeginOutcome, SessionError> {
        let arity = self.catalog.arity(&definition);
        if arity == 0 {
            return Err(SessionError::NotAGenericDefinition {
                name: definition.name().to_string(),
            });
        }

        if !self.policy.allow_generic_type_construction {
            if self.policy.allow_open_generics {
                let committed = TypeNode::Definition(definition);
                debug!(%committed, "construction disabled, committed bare definition");
                self.committed = Some(committed.clone());
                return Ok(BeginOutcome::Committed(committed));
            }
            return Err(SessionError::ConstructionDisabled {
                definition: definition.name().to_string(),
            });
        }

        debug!(%definition, arity, "begin construction");
        self.state.clear_all();
        self.state.ensure_entry(ConstructionPath::root(), arity);
        self.phase = SessionPhase::Selecting { root: definition };
        Ok(BeginOutcome::Editing)
    }

    /// Record `argument` in slot `index` at `path`. The previous selection's
    /// sub-tree is discarded. Candidates the evaluator hides, the nesting
    /// guard excludes, or the policy filters out are refused.
    pub fn select_argument(
        &mut self,
        path: &ConstructionPath,
        index: usize,
        argument: TypeNode,
    ) -> Result<(), SessionError> {
        let root = self.active_root()?.clone();
        let parameters = self.parameters_at(path)?;
        let parameter = Self::slot_parameter(&parameters, index)?;

        self.check_eligibility(&root, path, parameter, &argument)?;

        debug!(%path, index, argument = %argument, "select argument");
        if !self.state.set_slot(path, index, Some(argument)) {
            return Err(SessionError::UnknownPath {
                path: path.to_string(),
            });
        }
        Ok(())
    }

    /// Expand slot `index` at `path` for nested construction. The slot must
    /// hold an open generic definition. Expansion is refused once the child
    /// entry would sit past the build depth ceiling, which keeps every state
    /// tree buildable and bounds recursion in the preview renderer and the
    /// missing-argument diagnostics as well.
    pub fn expand(&mut self, path: &ConstructionPath, index: usize) -> Result<(), SessionError> {
        self.active_root()?;
        if path.len() + 1 >= MAX_BUILD_DEPTH {
            return Err(SessionError::Build(BuildError::DepthLimitExceeded {
                limit: MAX_BUILD_DEPTH,
            }));
        }
        let node = self.slot_value(path, index)?;
        let Some(TypeNode::Definition(child_definition)) = node else {
            return Err(SessionError::SlotNotExpandable { index });
        };

        let child_arity = self.catalog.arity(&child_definition);
        debug!(%path, index, definition = %child_definition, "expand slot");
        self.state.set_expanded_index(path, Some(index));
        self.state
            .ensure_entry(path.child(index as u32), child_arity);
        Ok(())
    }

    /// Build the nested sub-tree at `path + [index]` and, when complete,
    /// substitute the resolved type into the parent slot. The applied
    /// sub-tree is removed from the state: applied state must not linger.
    pub fn apply_nested(
        &mut self,
        path: &ConstructionPath,
        index: usize,
    ) -> Result<TypeNode, SessionError> {
        self.active_root()?;
        let node = self.slot_value(path, index)?;
        let Some(TypeNode::Definition(child_definition)) = node else {
            return Err(SessionError::SlotNotExpandable { index });
        };

        let child_path = path.child(index as u32);
        let (built, result) =
            try_build_at(self.catalog, &child_definition, &child_path, &self.state)?;
        if !result.all_arguments_selected {
            return Err(SessionError::Build(missing_argument_error(
                self.catalog,
                &child_definition,
                &child_path,
                &self.state,
            )));
        }

        debug!(%path, index, built = %built, "apply nested construction");
        // writing the resolved argument also clears the child's sub-tree
        self.state.set_slot(path, index, Some(built.clone()));
        Ok(built)
    }

    /// Abandon the in-progress refinement at `path + [index]`. With open
    /// generics allowed the slot reverts to the bare open definition;
    /// otherwise the slot is cleared entirely.
    pub fn cancel_nested(
        &mut self,
        path: &ConstructionPath,
        index: usize,
    ) -> Result<(), SessionError> {
        self.active_root()?;
        let node = self.slot_value(path, index)?;
        let Some(TypeNode::Definition(child_definition)) = node else {
            return Err(SessionError::SlotNotExpandable { index });
        };

        debug!(%path, index, "cancel nested construction");
        let replacement = if self.policy.allow_open_generics {
            Some(TypeNode::Definition(child_definition))
        } else {
            None
        };
        self.state.set_slot(path, index, replacement);
        Ok(())
    }

    /// Build and commit the session's type. On success the state tree is
    /// discarded and the session returns to `Idle`; on failure the session
    /// is left untouched for continued editing. A repeat commit with no
    /// intervening edits returns the identical stored value.
    pub fn commit(&mut self) -> Result<TypeNode, SessionError> {
        let root = match &self.phase {
            SessionPhase::Selecting { root } => root.clone(),
            SessionPhase::Idle => {
                return self
                    .committed
                    .clone()
                    .ok_or(SessionError::NoActiveConstruction);
            }
        };

        let (built, result) = try_build(self.catalog, &root, &self.state)?;
        if !result.all_arguments_selected && !self.policy.allow_open_generics {
            return Err(SessionError::Build(missing_argument_error(
                self.catalog,
                &root,
                &ConstructionPath::root(),
                &self.state,
            )));
        }
        enforce_commit_policy(&built, &result, &self.policy)?;

        debug!(committed = %built, "commit");
        self.committed = Some(built.clone());
        self.state.clear_all();
        self.phase = SessionPhase::Idle;
        Ok(built)
    }

    /// Abandon the session. Any previously committed value is untouched.
    pub fn cancel(&mut self) {
        debug!("cancel construction session");
        self.state.clear_all();
        self.phase = SessionPhase::Idle;
    }

    /// Human-readable rendering of the in-progress construction, with `?`
    /// placeholders for unset slots. When idle, renders the committed value.
    pub fn preview(&self) -> Option<String> {
        match &self.phase {
            SessionPhase::Selecting { root } => {
                Some(self.render_definition(root, &ConstructionPath::root()))
            }
            SessionPhase::Idle => self.committed.as_ref().map(TypeNode::to_string),
        }
    }

    /// Ordered candidate listing for slot `index` at `path`, filtered by
    /// policy, the self-nesting guard, and constraint visibility. Hidden
    /// candidates are absent; the rest carry their evaluation verdict.
    pub fn candidates_for(
        &self,
        path: &ConstructionPath,
        index: usize,
    ) -> Result<Vec<(TypeNode, ConstraintCheckResult)>, SessionError> {
        let root = self.active_root()?.clone();
        let parameters = self.parameters_at(path)?;
        let parameter = Self::slot_parameter(&parameters, index)?;

        let pool = match parameter.constraints.constraint_types.first() {
            Some(base_constraint) => self.catalog.assignable_types(base_constraint),
            None => self.catalog.all_types(),
        };

        let excluded = if self.policy.allow_self_nesting {
            HashSet::new()
        } else {
            ancestor_definitions(&root, path, &self.state)
        };

        let mut candidates = Vec::new();
        for node in pool {
            if !self.policy.permits_identity(node.id()) {
                continue;
            }
            if !self.policy.permits_kind(self.catalog.kind(&node)) {
                continue;
            }
            if node.references_any(&excluded) {
                continue;
            }
            let verdict = evaluate(self.catalog, &node, Some(parameter));
            if verdict.is_hidden() {
                continue;
            }
            candidates.push((node, verdict));
        }
        Ok(candidates)
    }

    fn active_root(&self) -> Result<&TypeId, SessionError> {
        match &self.phase {
            SessionPhase::Selecting { root } => Ok(root),
            SessionPhase::Idle => Err(SessionError::NoActiveConstruction),
        }
    }

    /// Resolve the generic definition being refined at `path`.
    fn definition_at(&self, path: &ConstructionPath) -> Result<TypeId, SessionError> {
        let root = self.active_root()?;
        if path.is_root() {
            return Ok(root.clone());
        }

        let parent = path.parent().ok_or_else(|| SessionError::UnknownPath {
            path: path.to_string(),
        })?;
        let index = path.last().unwrap_or(0) as usize;
        let slots = self
            .state
            .get_slots(&parent)
            .ok_or_else(|| SessionError::UnknownPath {
                path: path.to_string(),
            })?;
        match slots.get(index) {
            Some(Some(TypeNode::Definition(id))) => Ok(id.clone()),
            _ => Err(SessionError::UnknownPath {
                path: path.to_string(),
            }),
        }
    }

    fn parameters_at(
        &self,
        path: &ConstructionPath,
    ) -> Result<Vec<GenericParameterSlot>, SessionError> {
        let definition = self.definition_at(path)?;
        Ok(self.catalog.parameters(&definition))
    }

    fn slot_parameter(
        parameters: &[GenericParameterSlot],
        index: usize,
    ) -> Result<&GenericParameterSlot, SessionError> {
        parameters
            .get(index)
            .ok_or(SessionError::SlotIndexOutOfRange {
                index,
                arity: parameters.len(),
            })
    }

    fn slot_value(
        &self,
        path: &ConstructionPath,
        index: usize,
    ) -> Result<Option<TypeNode>, SessionError> {
        let slots = self
            .state
            .get_slots(path)
            .ok_or_else(|| SessionError::UnknownPath {
                path: path.to_string(),
            })?;
        let arity = slots.len();
        slots
            .get(index)
            .cloned()
            .ok_or(SessionError::SlotIndexOutOfRange { index, arity })
    }

    fn check_eligibility(
        &self,
        root: &TypeId,
        path: &ConstructionPath,
        parameter: &GenericParameterSlot,
        argument: &TypeNode,
    ) -> Result<(), SessionError> {
        if !self.references_only_known_types(argument) {
            return Err(SessionError::ArgumentNotEligible {
                argument: argument.to_string(),
                reason: String::from("not registered in the type catalog"),
            });
        }

        if !self.policy.permits_identity(argument.id())
            || !self.policy.permits_kind(self.catalog.kind(argument))
        {
            return Err(SessionError::ArgumentNotEligible {
                argument: argument.to_string(),
                reason: String::from("excluded by policy"),
            });
        }

        if !self.policy.allow_self_nesting {
            let excluded = ancestor_definitions(root, path, &self.state);
            if argument.references_any(&excluded) {
                return Err(SessionError::ArgumentNotEligible {
                    argument: argument.to_string(),
                    reason: String::from("self-nesting is not permitted here"),
                });
            }
        }

        if let ConstraintCheckResult::Hidden(reason) =
            evaluate(self.catalog, argument, Some(parameter))
        {
            return Err(SessionError::ArgumentNotEligible {
                argument: argument.to_string(),
                reason: reason.to_string(),
            });
        }
        Ok(())
    }

    /// True when every identity the argument names is registered in the
    /// catalog. Unregistered identities carry no kind flags, so the policy
    /// and constraint checks would wave them through.
    fn references_only_known_types(&self, node: &TypeNode) -> bool {
        match node {
            TypeNode::Simple(id) | TypeNode::Definition(id) => self.catalog.contains(id),
            TypeNode::Constructed { base, args } => {
                self.catalog.contains(base)
                    && args.iter().all(|arg| self.references_only_known_types(arg))
            }
        }
    }

    fn render_definition(&self, definition: &TypeId, path: &ConstructionPath) -> String {
        let arity = self.catalog.arity(definition);
        let slots = self.state.get_slots(path);
        let mut out = format!("{}<", definition.name());
        for index in 0..arity {
            if index > 0 {
                out.push_str(", ");
            }
            let slot = slots.and_then(|slots| slots.get(index)).cloned().flatten();
            match slot {
                None => out.push('?'),
                Some(node) => {
                    let child_path = path.child(index as u32);
                    if node.is_open_definition() && self.state.has_entry(&child_path) {
                        out.push_str(&self.render_definition(node.id(), &child_path));
                    } else {
                        out.push_str(&node.to_string());
                    }
                }
            }
        }
        out.push('>');
        out
    }
}
