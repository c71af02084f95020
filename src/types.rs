//! Core data model for generic type construction
//!
//! A `TypeNode` is a lightweight handle into the injected type catalog. It
//! carries just enough structure to represent nested instantiations
//! (`Repository<StatData<HealthStat>>`) without duplicating catalog metadata.

use bitflags::bitflags;
use std::collections::HashSet;
use std::fmt;

/// Unique identifier for a catalog entry. An open generic definition shares
/// one identity across all of its instantiations (`Repository<>` and
/// `Repository<X>` have the same `TypeId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub String);

impl TypeId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags! {
    /// Classification flags for a catalog entry. A single entry usually
    /// carries more than one flag (an abstract class is `CLASS | ABSTRACT`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeKinds: u16 {
        const CLASS     = 1 << 0;
        const STRUCT    = 1 << 1;
        const ABSTRACT  = 1 << 2;
        const INTERFACE = 1 << 3;
        const STATIC    = 1 << 4;
        const ENUM      = 1 << 5;
        const DELEGATE  = 1 << 6;
        const PRIMITIVE = 1 << 7;
        const POINTER   = 1 << 8;
        const BY_REF    = 1 << 9;
        const VOID      = 1 << 10;
    }
}

impl TypeKinds {
    /// Kinds that denote value types.
    pub const VALUE: TypeKinds = Self::STRUCT.union(Self::ENUM).union(Self::PRIMITIVE);

    /// Kinds that can never appear as a generic argument.
    pub const UNINHABITABLE: TypeKinds = Self::POINTER.union(Self::BY_REF).union(Self::VOID);

    pub fn is_value_type(self) -> bool {
        self.intersects(Self::VALUE)
    }
}

/// Handle to a type, possibly still containing unbound generic parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeNode {
    /// Non-generic type: `HealthStat`, `Int32`.
    Simple(TypeId),
    /// Open generic definition with all parameters unbound: `Repository<>`.
    Definition(TypeId),
    /// Constructed generic: every slot bound, though arguments may still be
    /// (or contain) open definitions.
    Constructed { base: TypeId, args: Vec<TypeNode> },
}

impl TypeNode {
    pub fn simple(name: impl Into<String>) -> Self {
        Self::Simple(TypeId::new(name))
    }

    pub fn definition(name: impl Into<String>) -> Self {
        Self::Definition(TypeId::new(name))
    }

    pub fn constructed(name: impl Into<String>, args: Vec<TypeNode>) -> Self {
        Self::Constructed {
            base: TypeId::new(name),
            args,
        }
    }

    /// Identity of the underlying catalog entry.
    pub fn id(&self) -> &TypeId {
        match self {
            Self::Simple(id) | Self::Definition(id) => id,
            Self::Constructed { base, .. } => base,
        }
    }

    pub fn is_open_definition(&self) -> bool {
        matches!(self, Self::Definition(_))
    }

    pub fn is_constructed(&self) -> bool {
        matches!(self, Self::Constructed { .. })
    }

    /// True when no open definition remains anywhere in the node.
    pub fn is_fully_concrete(&self) -> bool {
        match self {
            Self::Simple(_) => true,
            Self::Definition(_) => false,
            Self::Constructed { args, .. } => args.iter().all(|arg| arg.is_fully_concrete()),
        }
    }

    /// True when this node mentions any of the given identities, at any
    /// nesting depth. Used by the self-nesting guard.
    pub fn references_any(&self, ids: &HashSet<TypeId>) -> bool {
        match self {
            Self::Simple(id) | Self::Definition(id) => ids.contains(id),
            Self::Constructed { base, args } => {
                ids.contains(base) || args.iter().any(|arg| arg.references_any(ids))
            }
        }
    }
}

impl fmt::Display for TypeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple(id) => write!(f, "{id}"),
            Self::Definition(id) => write!(f, "{id}<>"),
            Self::Constructed { base, args } => {
                write!(f, "{base}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
        }
    }
}

/// Declared constraints for one generic parameter slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstraintSet {
    /// `where T: class`
    pub reference_type: bool,
    /// `where T: struct`
    pub value_type: bool,
    /// `where T: new()`
    pub default_constructor: bool,
    /// Ordered base-class / interface constraint types.
    pub constraint_types: Vec<TypeNode>,
}

impl ConstraintSet {
    pub fn is_empty(&self) -> bool {
        !self.reference_type
            && !self.value_type
            && !self.default_constructor
            && self.constraint_types.is_empty()
    }
}

/// One generic parameter slot of an open generic definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParameterSlot {
    /// Zero-based position within the definition's parameter list.
    pub position: usize,
    /// Declared name, for diagnostics (`TData`).
    pub name: String,
    pub constraints: ConstraintSet,
}

impl GenericParameterSlot {
    pub fn new(position: usize, name: impl Into<String>) -> Self {
        Self {
            position,
            name: name.into(),
            constraints: ConstraintSet::default(),
        }
    }

    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }
}

/// Completeness facts accumulated bottom-up during a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstructionResult {
    /// No open definition remains anywhere in the built type.
    pub is_fully_concrete: bool,
    /// Every slot (recursively) holds a selection.
    pub all_arguments_selected: bool,
}

impl ConstructionResult {
    /// Starting point for a node with no findings against it yet.
    pub fn complete() -> Self {
        Self {
            is_fully_concrete: true,
            all_arguments_selected: true,
        }
    }

    pub fn merge(&mut self, other: ConstructionResult) {
        self.is_fully_concrete &= other.is_fully_concrete;
        self.all_arguments_selected &= other.all_arguments_selected;
    }
}
