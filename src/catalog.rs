//! Type catalog: the injected, read-only source of type metadata
//!
//! The engine never owns reflection data. Everything it knows about types —
//! assignability, parameter lists, constraint sets, constructor existence —
//! comes through the `TypeCatalog` capability, which the caller injects.
//! Queries are idempotent and never mutate catalog state.

use crate::error::CatalogError;
use crate::types::{GenericParameterSlot, TypeId, TypeKinds, TypeNode};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Read-only type metadata queries consumed by the construction engine.
pub trait TypeCatalog {
    /// True when the identity is known to the catalog.
    fn contains(&self, id: &TypeId) -> bool;

    /// Classification flags for the node's underlying entry. Unknown
    /// identities report an empty flag set.
    fn kind(&self, node: &TypeNode) -> TypeKinds;

    /// Number of generic parameters of the definition (0 for non-generics).
    fn arity(&self, id: &TypeId) -> usize;

    /// Ordered generic parameter slots of the definition.
    fn parameters(&self, id: &TypeId) -> Vec<GenericParameterSlot>;

    /// Declared base type of the node's entry, if any.
    fn base_type(&self, node: &TypeNode) -> Option<TypeNode>;

    /// Declared interfaces of the node's entry.
    fn interfaces(&self, node: &TypeNode) -> Vec<TypeNode>;

    /// True when the entry has a public parameterless constructor.
    fn has_parameterless_constructor(&self, node: &TypeNode) -> bool;

    /// True when `candidate` can stand wherever `target` is required.
    fn is_assignable(&self, target: &TypeNode, candidate: &TypeNode) -> bool;

    /// All registered types assignable to `constraint`, in a stable order.
    fn assignable_types(&self, constraint: &TypeNode) -> Vec<TypeNode>;

    /// Every registered type, in a stable order.
    fn all_types(&self) -> Vec<TypeNode>;

    /// True when the identity is a nullable wrapper over a value type
    /// (`Nullable<>` in the seeded catalog).
    fn is_nullable_wrapper(&self, id: &TypeId) -> bool {
        let _ = id;
        false
    }

    /// Last-chance validation of a full argument combination. Per-slot
    /// constraint checks have already passed when this runs; a catalog can
    /// reject combinations the per-slot checks cannot see, such as dependent
    /// parameter constraints. The default accepts everything.
    fn validate_instantiation(&self, definition: &TypeId, args: &[TypeNode]) -> Result<(), String> {
        let _ = (definition, args);
        Ok(())
    }
}

/// Static metadata for one registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub id: TypeId,
    pub kind: TypeKinds,
    pub parameters: Vec<GenericParameterSlot>,
    pub base: Option<TypeNode>,
    pub interfaces: Vec<TypeNode>,
    pub has_parameterless_constructor: bool,
    pub nullable_wrapper: bool,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKinds) -> Self {
        Self {
            id: TypeId::new(name),
            kind,
            parameters: Vec::new(),
            base: None,
            interfaces: Vec::new(),
            has_parameterless_constructor: false,
            nullable_wrapper: false,
        }
    }

    /// Concrete class with a public parameterless constructor.
    pub fn class(name: impl Into<String>) -> Self {
        let mut descriptor = Self::new(name, TypeKinds::CLASS);
        descriptor.has_parameterless_constructor = true;
        descriptor
    }

    pub fn abstract_class(name: impl Into<String>) -> Self {
        Self::new(name, TypeKinds::CLASS | TypeKinds::ABSTRACT)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name, TypeKinds::INTERFACE)
    }

    pub fn value_type(name: impl Into<String>) -> Self {
        let mut descriptor = Self::new(name, TypeKinds::STRUCT);
        descriptor.has_parameterless_constructor = true;
        descriptor
    }

    pub fn with_base(mut self, base: TypeNode) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_interface(mut self, interface: TypeNode) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn with_parameter(mut self, slot: GenericParameterSlot) -> Self {
        self.parameters.push(slot);
        self
    }

    pub fn without_parameterless_constructor(mut self) -> Self {
        self.has_parameterless_constructor = false;
        self
    }

    /// The node used to present this entry in candidate listings: a bare
    /// definition for generics, a simple node otherwise.
    pub fn canonical_node(&self) -> TypeNode {
        if self.parameters.is_empty() {
            TypeNode::Simple(self.id.clone())
        } else {
            TypeNode::Definition(self.id.clone())
        }
    }
}

type InstantiationRule = Box<dyn Fn(&TypeId, &[TypeNode]) -> Result<(), String>>;

/// Registration-ordered catalog backed by an `IndexMap`, used by consumers
/// that assemble their type universe up front and by the test suite.
///
/// Candidate listings must come back in a stable order, which is why entries
/// iterate in registration order rather than hash order.
#[derive(Default)]
pub struct InMemoryCatalog {
    types: IndexMap<TypeId, TypeDescriptor>,
    instantiation_rules: Vec<InstantiationRule>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog pre-seeded with primitive types, `Void`, and the `Nullable<>`
    /// wrapper definition.
    pub fn with_core_types() -> Self {
        let mut catalog = Self::new();
        catalog.register_core_types();
        catalog
    }

    fn register_core_types(&mut self) {
        let primitives = ["Int32", "Int64", "Float64", "Boolean", "Char"];
        for name in primitives {
            let _ = self.register(TypeDescriptor {
                has_parameterless_constructor: true,
                ..TypeDescriptor::new(name, TypeKinds::PRIMITIVE | TypeKinds::STRUCT)
            });
        }

        let _ = self.register(
            TypeDescriptor::new("String", TypeKinds::CLASS).without_parameterless_constructor(),
        );
        let _ = self.register(TypeDescriptor::new("Void", TypeKinds::VOID));

        let mut nullable = TypeDescriptor::new("Nullable", TypeKinds::STRUCT)
            .with_parameter(GenericParameterSlot::new(0, "T"));
        nullable.nullable_wrapper = true;
        nullable.has_parameterless_constructor = true;
        let _ = self.register(nullable);
    }

    /// Register a type, refusing redefinition of an existing identity.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> Result<(), CatalogError> {
        if self.types.contains_key(&descriptor.id) {
            return Err(CatalogError::TypeRedefinition {
                name: descriptor.id.name().to_string(),
            });
        }
        self.types.insert(descriptor.id.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, id: &TypeId) -> Option<&TypeDescriptor> {
        self.types.get(id)
    }

    /// Descriptor lookup that reports unknown identities as errors.
    pub fn descriptor(&self, id: &TypeId) -> Result<&TypeDescriptor, CatalogError> {
        self.types.get(id).ok_or_else(|| CatalogError::UnknownType {
            name: id.name().to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Install a rule consulted by `validate_instantiation`. Rules model
    /// constraint checks the per-slot evaluator cannot perform, such as
    /// dependent parameter constraints.
    pub fn add_instantiation_rule(
        &mut self,
        rule: impl Fn(&TypeId, &[TypeNode]) -> Result<(), String> + 'static,
    ) {
        self.instantiation_rules.push(Box::new(rule));
    }

    fn descriptor_of(&self, node: &TypeNode) -> Option<&TypeDescriptor> {
        self.types.get(node.id())
    }
}

impl fmt::Debug for InMemoryCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryCatalog")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("instantiation_rules", &self.instantiation_rules.len())
            .finish()
    }
}

impl TypeCatalog for InMemoryCatalog {
    fn contains(&self, id: &TypeId) -> bool {
        self.types.contains_key(id)
    }

    fn kind(&self, node: &TypeNode) -> TypeKinds {
        self.descriptor_of(node)
            .map(|descriptor| descriptor.kind)
            .unwrap_or_else(TypeKinds::empty)
    }

    fn arity(&self, id: &TypeId) -> usize {
        self.types
            .get(id)
            .map(|descriptor| descriptor.parameters.len())
            .unwrap_or(0)
    }

    fn parameters(&self, id: &TypeId) -> Vec<GenericParameterSlot> {
        self.types
            .get(id)
            .map(|descriptor| descriptor.parameters.clone())
            .unwrap_or_default()
    }

    fn base_type(&self, node: &TypeNode) -> Option<TypeNode> {
        self.descriptor_of(node)
            .and_then(|descriptor| descriptor.base.clone())
    }

    fn interfaces(&self, node: &TypeNode) -> Vec<TypeNode> {
        self.descriptor_of(node)
            .map(|descriptor| descriptor.interfaces.clone())
            .unwrap_or_default()
    }

    fn has_parameterless_constructor(&self, node: &TypeNode) -> bool {
        self.descriptor_of(node)
            .map(|descriptor| descriptor.has_parameterless_constructor)
            .unwrap_or(false)
    }

    fn is_assignable(&self, target: &TypeNode, candidate: &TypeNode) -> bool {
        // Walk the candidate's base chain and interface lists transitively.
        // The seen set guards against degenerate catalogs with cyclic chains.
        let mut seen: HashSet<TypeNode> = HashSet::new();
        let mut stack = vec![candidate.clone()];
        while let Some(node) = stack.pop() {
            if !seen.insert(node.clone()) {
                continue;
            }
            if node == *target {
                return true;
            }
            if let Some(base) = self.base_type(&node) {
                stack.push(base);
            }
            stack.extend(self.interfaces(&node));
        }
        false
    }

    fn assignable_types(&self, constraint: &TypeNode) -> Vec<TypeNode> {
        self.types
            .values()
            .map(TypeDescriptor::canonical_node)
            .filter(|node| self.is_assignable(constraint, node))
            .collect()
    }

    fn all_types(&self) -> Vec<TypeNode> {
        self.types.values().map(TypeDescriptor::canonical_node).collect()
    }

    fn is_nullable_wrapper(&self, id: &TypeId) -> bool {
        self.types
            .get(id)
            .map(|descriptor| descriptor.nullable_wrapper)
            .unwrap_or(false)
    }

    fn validate_instantiation(&self, definition: &TypeId, args: &[TypeNode]) -> Result<(), String> {
        for rule in &self.instantiation_rules {
            rule(definition, args)?;
        }
        Ok(())
    }
}
