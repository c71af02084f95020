//! Declarative policy for a construction session
//!
//! Configures which candidates may appear, whether multi-slot construction
//! is available at all, and what a commit may still leave unbound.

use crate::types::{TypeId, TypeKinds};
use indexmap::IndexSet;
use std::collections::HashSet;

/// Session configuration. Policy scopes candidate listings and commit rules;
/// it never changes the constraint evaluator's verdicts.
#[derive(Debug, Clone)]
pub struct Policy {
    /// Enable the multi-slot construction flow at all. When disabled, an
    /// open generic definition can only be committed bare, and only when
    /// `allow_open_generics` is set.
    pub allow_generic_type_construction: bool,
    /// Permit committing a type that still contains unbound or unconstructed
    /// generic parameters.
    pub allow_open_generics: bool,
    /// Permit a definition to appear within its own argument tree.
    pub allow_self_nesting: bool,
    /// Kinds a candidate may carry. A candidate is eligible only when every
    /// one of its kind flags is allowed.
    pub allowed_type_kinds: TypeKinds,
    /// When present, only these identities may appear as candidates.
    pub include: Option<IndexSet<TypeId>>,
    /// Identities that never appear as candidates.
    pub exclude: HashSet<TypeId>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allow_generic_type_construction: true,
            allow_open_generics: false,
            allow_self_nesting: false,
            // candidates must be usable as committed arguments, so kinds
            // that cannot stand on their own stay out by default
            allowed_type_kinds: TypeKinds::CLASS
                | TypeKinds::STRUCT
                | TypeKinds::ENUM
                | TypeKinds::PRIMITIVE
                | TypeKinds::DELEGATE,
            include: None,
            exclude: HashSet::new(),
        }
    }
}

impl Policy {
    /// Default policy with open-generic commits permitted.
    pub fn permissive() -> Self {
        Self {
            allow_open_generics: true,
            ..Self::default()
        }
    }

    pub fn permits_kind(&self, kind: TypeKinds) -> bool {
        self.allowed_type_kinds.contains(kind)
    }

    pub fn permits_identity(&self, id: &TypeId) -> bool {
        if self.exclude.contains(id) {
            return false;
        }
        match &self.include {
            Some(include) => include.contains(id),
            None => true,
        }
    }
}
