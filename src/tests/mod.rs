//! End-to-end tests for the construction engine
//!
//! Each module exercises one caller-visible behavior through the session
//! API, against a shared fixture catalog.

mod test_commit_policy;

use crate::catalog::{InMemoryCatalog, TypeDescriptor};
use crate::types::{ConstraintSet, GenericParameterSlot, TypeNode};

/// Catalog used across the end-to-end tests:
///
/// - `IData` interface; `StatData<T>` class implementing it; `StatStruct`
///   struct implementing it
/// - `HealthStat`, `ManaStat` concrete stat classes
/// - `Repository<TData> where TData : class, IData`
/// - `IWrapped` interface; `WrappedThing` implementing it;
///   `Wrapper<T> where T : IWrapped` (itself implementing `IWrapped`, so
///   self-nesting would be type-correct if the guard allowed it)
/// - `Pair<T1, T2>` with no constraints; `ConcreteA`, `ConcreteB`
pub(crate) fn fixture_catalog() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::with_core_types();

    catalog.register(TypeDescriptor::interface("IData")).unwrap();
    catalog.register(TypeDescriptor::class("HealthStat")).unwrap();
    catalog.register(TypeDescriptor::class("ManaStat")).unwrap();
    catalog
        .register(
            TypeDescriptor::class("StatData")
                .with_interface(TypeNode::simple("IData"))
                .with_parameter(GenericParameterSlot::new(0, "T")),
        )
        .unwrap();
    catalog
        .register(TypeDescriptor::value_type("StatStruct").with_interface(TypeNode::simple("IData")))
        .unwrap();
    catalog
        .register(
            TypeDescriptor::class("Repository").with_parameter(
                GenericParameterSlot::new(0, "TData").with_constraints(ConstraintSet {
                    reference_type: true,
                    constraint_types: vec![TypeNode::simple("IData")],
                    ..Default::default()
                }),
            ),
        )
        .unwrap();

    catalog.register(TypeDescriptor::interface("IWrapped")).unwrap();
    catalog
        .register(TypeDescriptor::class("WrappedThing").with_interface(TypeNode::simple("IWrapped")))
        .unwrap();
    catalog
        .register(
            TypeDescriptor::class("Wrapper")
                .with_interface(TypeNode::simple("IWrapped"))
                .with_parameter(
                    GenericParameterSlot::new(0, "T").with_constraints(ConstraintSet {
                        constraint_types: vec![TypeNode::simple("IWrapped")],
                        ..Default::default()
                    }),
                ),
        )
        .unwrap();

    catalog
        .register(
            TypeDescriptor::class("Pair")
                .with_parameter(GenericParameterSlot::new(0, "T1"))
                .with_parameter(GenericParameterSlot::new(1, "T2")),
        )
        .unwrap();
    catalog.register(TypeDescriptor::class("ConcreteA")).unwrap();
    catalog.register(TypeDescriptor::class("ConcreteB")).unwrap();

    catalog
}
