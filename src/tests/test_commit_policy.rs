//! Commit policy: open generics, disabled construction, instantiation rules.

use super::fixture_catalog;
use crate::error::{BuildError, SessionError};
use crate::path::ConstructionPath;
use crate::policy::Policy;
use crate::session::{BeginOutcome, ConstructionSession};
use crate::types::{TypeId, TypeNode};
use pretty_assertions::assert_eq;

fn root() -> ConstructionPath {
    ConstructionPath::root()
}

#[test]
fn test_open_argument_refused_without_open_generics() {
    let catalog = fixture_catalog();
    let mut session = ConstructionSession::new(&catalog, Policy::default());

    session
        .begin_construction(TypeId::new("Repository"))
        .unwrap();
    // StatData<> selected but never constructed
    session
        .select_argument(&root(), 0, TypeNode::definition("StatData"))
        .unwrap();

    let result = session.commit();
    assert!(matches!(
        result,
        Err(SessionError::Build(BuildError::OpenGenericsNotAllowed { .. }))
    ));
    assert!(session.is_editing());
}

#[test]
fn test_open_argument_commits_with_open_generics() {
    let catalog = fixture_catalog();
    let mut session = ConstructionSession::new(&catalog, Policy::permissive());

    session
        .begin_construction(TypeId::new("Repository"))
        .unwrap();
    session
        .select_argument(&root(), 0, TypeNode::definition("StatData"))
        .unwrap();

    let committed = session.commit().unwrap();
    assert_eq!(committed.to_string(), "Repository<StatData<>>");
    assert!(!committed.is_fully_concrete());
}

#[test]
fn test_bare_definition_commits_with_open_generics() {
    let catalog = fixture_catalog();
    let mut session = ConstructionSession::new(&catalog, Policy::permissive());

    session
        .begin_construction(TypeId::new("Repository"))
        .unwrap();
    let committed = session.commit().unwrap();
    assert_eq!(committed, TypeNode::definition("Repository"));
}

#[test]
fn test_construction_disabled_commits_bare_definition_when_open_generics_allowed() {
    let catalog = fixture_catalog();
    let policy = Policy {
        allow_generic_type_construction: false,
        allow_open_generics: true,
        ..Policy::default()
    };
    let mut session = ConstructionSession::new(&catalog, policy);

    let outcome = session
        .begin_construction(TypeId::new("Repository"))
        .unwrap();
    assert_eq!(
        outcome,
        BeginOutcome::Committed(TypeNode::definition("Repository"))
    );
    assert!(!session.is_editing());
    assert_eq!(session.committed(), Some(&TypeNode::definition("Repository")));
}

#[test]
fn test_construction_disabled_without_open_generics_is_a_configuration_error() {
    let catalog = fixture_catalog();
    let policy = Policy {
        allow_generic_type_construction: false,
        allow_open_generics: false,
        ..Policy::default()
    };
    let mut session = ConstructionSession::new(&catalog, policy);

    let result = session.begin_construction(TypeId::new("Repository"));
    assert!(matches!(
        result,
        Err(SessionError::ConstructionDisabled { definition }) if definition == "Repository"
    ));
}

#[test]
fn test_instantiation_rule_rejection_preserves_editing_state() {
    let mut catalog = fixture_catalog();
    // a dependent-constraint style rule: Pair arguments must differ
    catalog.add_instantiation_rule(|definition, args| {
        if definition.name() == "Pair" && args.len() == 2 && args[0] == args[1] {
            Err(String::from("T2 must not repeat T1"))
        } else {
            Ok(())
        }
    });
    let mut session = ConstructionSession::new(&catalog, Policy::default());

    session.begin_construction(TypeId::new("Pair")).unwrap();
    session
        .select_argument(&root(), 0, TypeNode::simple("ConcreteA"))
        .unwrap();
    session
        .select_argument(&root(), 1, TypeNode::simple("ConcreteA"))
        .unwrap();

    let result = session.commit();
    assert!(matches!(
        result,
        Err(SessionError::Build(BuildError::InvalidConstruction { message, .. }))
            if message.contains("must not repeat")
    ));
    // pre-commit state untouched: fix one slot and commit again
    assert!(session.is_editing());
    session
        .select_argument(&root(), 1, TypeNode::simple("ConcreteB"))
        .unwrap();
    assert_eq!(
        session.commit().unwrap().to_string(),
        "Pair<ConcreteA, ConcreteB>"
    );
}

#[test]
fn test_commit_without_any_session_or_value() {
    let catalog = fixture_catalog();
    let mut session = ConstructionSession::new(&catalog, Policy::default());
    assert!(matches!(
        session.commit(),
        Err(SessionError::NoActiveConstruction)
    ));
}
