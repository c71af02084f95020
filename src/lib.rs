//! Interactive construction engine for generic type instantiations
//!
//! Lets a caller compose a valid instantiation such as
//! `Repository<StatData<HealthStat>>` from an open generic definition by
//! recursively picking an argument for each parameter slot, while the
//! declared constraints are enforced at every step.
//!
//! ## Architecture
//!
//! - **Type Catalog**: injected, read-only capability supplying all type
//!   metadata (`catalog::TypeCatalog`, with `InMemoryCatalog` for callers
//!   that assemble their universe up front)
//! - **Constraint Evaluator**: pure tri-state check deciding whether a
//!   candidate may fill a slot (`constraints::evaluate`)
//! - **Construction State Tree**: path-addressed selections with cascading
//!   invalidation (`state::ConstructionState`)
//! - **Self-Nesting Guard**: keeps a definition out of its own argument tree
//!   (`nesting::ancestor_definitions`)
//! - **Type Builder**: depth-first assembly with fallible instantiation
//!   (`builder::try_build`)
//! - **Session**: the caller-facing command surface and state machine
//!   (`session::ConstructionSession`)
//!
//! The engine never performs type inference: every argument is explicitly
//! chosen and only validated. Constraints that reference sibling parameters
//! of the same definition are not evaluated per-slot; they surface, if at
//! all, through `TypeCatalog::validate_instantiation` at build time.

pub mod builder;
pub mod catalog;
pub mod constraints;
pub mod error;
pub mod nesting;
pub mod path;
pub mod policy;
pub mod session;
pub mod state;
pub mod types;

pub use builder::{instantiate, try_build, try_build_at, MAX_BUILD_DEPTH};
pub use catalog::{InMemoryCatalog, TypeCatalog, TypeDescriptor};
pub use constraints::{evaluate, ConstraintCheckResult, ConstraintFailure};
pub use error::{BuildError, CatalogError, SessionError};
pub use nesting::ancestor_definitions;
pub use path::ConstructionPath;
pub use policy::Policy;
pub use session::{BeginOutcome, ConstructionSession};
pub use state::{ConstructionState, SlotEntry};
pub use types::{
    ConstraintSet, ConstructionResult, GenericParameterSlot, TypeId, TypeKinds, TypeNode,
};

#[cfg(test)]
mod tests;
