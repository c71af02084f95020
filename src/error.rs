//! Error types for the construction engine
//!
//! Every failure here is recoverable: the caller keeps editing or cancels.
//! Constraint violations are never errors at all — they surface as `Hidden`
//! entries in candidate listings (see `constraints::ConstraintCheckResult`).

use miette::Diagnostic;
use thiserror::Error;

/// Failures reported by the type builder and by `Commit`.
#[derive(Error, Diagnostic, Debug)]
pub enum BuildError {
    #[error("missing argument for slot {slot_index} ({slot_name}) of {definition}")]
    #[diagnostic(
        code(typeforge::build::missing_argument),
        help("Select an argument for every parameter slot before committing")
    )]
    MissingArgument {
        definition: String,
        slot_index: usize,
        slot_name: String,
    },

    #[error("instantiation of {definition} rejected: {message}")]
    #[diagnostic(
        code(typeforge::build::invalid_construction),
        help(
            "The chosen arguments passed per-slot checks but were rejected together, \
             typically by a dependent parameter constraint"
        )
    )]
    InvalidConstruction { definition: String, message: String },

    #[error("{rendered} still contains unbound generic parameters")]
    #[diagnostic(
        code(typeforge::build::open_generics_not_allowed),
        help("Finish constructing every argument, or enable open generics in the policy")
    )]
    OpenGenericsNotAllowed { rendered: String },

    #[error("{definition} expects {expected} generic arguments, found {found}")]
    #[diagnostic(code(typeforge::build::arity_mismatch))]
    ArityMismatch {
        definition: String,
        expected: usize,
        found: usize,
    },

    #[error("construction tree exceeds the depth limit of {limit}")]
    #[diagnostic(
        code(typeforge::build::depth_limit),
        help("The catalog permits pathologically deep nesting; this ceiling bounds recursion")
    )]
    DepthLimitExceeded { limit: usize },
}

/// Failures reported by session operations.
#[derive(Error, Diagnostic, Debug)]
pub enum SessionError {
    #[error("no construction is in progress")]
    #[diagnostic(code(typeforge::session::no_active_construction))]
    NoActiveConstruction,

    #[error("generic type construction is disabled by policy, cannot refine {definition}")]
    #[diagnostic(
        code(typeforge::session::construction_disabled),
        help(
            "With construction disabled, an open generic definition can only be committed \
             as-is, and only when the policy allows open generics"
        )
    )]
    ConstructionDisabled { definition: String },

    #[error("{name} is not an open generic definition")]
    #[diagnostic(code(typeforge::session::not_a_generic_definition))]
    NotAGenericDefinition { name: String },

    #[error("no construction entry exists at {path}")]
    #[diagnostic(code(typeforge::session::unknown_path))]
    UnknownPath { path: String },

    #[error("slot index {index} is out of range for a definition of arity {arity}")]
    #[diagnostic(code(typeforge::session::slot_out_of_range))]
    SlotIndexOutOfRange { index: usize, arity: usize },

    #[error("slot {index} does not hold an open generic definition, nothing to expand")]
    #[diagnostic(code(typeforge::session::slot_not_expandable))]
    SlotNotExpandable { index: usize },

    #[error("{argument} is not eligible here: {reason}")]
    #[diagnostic(code(typeforge::session::argument_not_eligible))]
    ArgumentNotEligible { argument: String, reason: String },

    #[error("build failed")]
    #[diagnostic(code(typeforge::session::build_failed))]
    Build(#[from] BuildError),
}

/// Failures reported by the in-memory catalog.
#[derive(Error, Diagnostic, Debug)]
pub enum CatalogError {
    #[error("type {name} is already registered")]
    #[diagnostic(code(typeforge::catalog::type_redefinition))]
    TypeRedefinition { name: String },

    #[error("type {name} is not registered")]
    #[diagnostic(code(typeforge::catalog::unknown_type))]
    UnknownType { name: String },
}
