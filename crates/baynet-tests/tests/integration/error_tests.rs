//! Failure modes surfaced by `execute()`.

use std::sync::Arc;

use baynet_core::{
    BayesianNetwork, BayesianQuery, EnumerationQuery, ExecError, QueryConfig, QueryDescriptor,
    QueryPhase,
};

use crate::fixtures::two_node;

fn incomplete_child() -> Arc<BayesianNetwork> {
    let mut net = BayesianNetwork::new();
    let a = net.add_boolean_event("a").unwrap();
    let b = net.add_boolean_event("b").unwrap();
    net.create_dependency(a, b).unwrap();
    net.add_line(a, 0.3, 0, &[]).unwrap();
    net.add_line(a, 0.7, 1, &[]).unwrap();
    net.add_line(b, 0.8, 0, &[0]).unwrap();
    net.add_line(b, 0.2, 1, &[0]).unwrap();
    Arc::new(net)
}

#[test]
fn missing_table_line_fails_instead_of_scoring_zero() {
    let mut query = EnumerationQuery::new(incomplete_child());
    query.define_outcome("b", "true").unwrap();

    let err = query.execute().unwrap_err();
    assert!(matches!(err, ExecError::Configuration(_)), "{}", err);
    assert!(err.to_string().contains("no matching table line"));
    assert_eq!(query.probability(), None);
}

#[test]
fn table_validation_catches_defect_before_enumeration() {
    let config = QueryConfig {
        validate_tables: true,
        ..QueryConfig::default()
    };
    let mut query = EnumerationQuery::with_config(incomplete_child(), config).unwrap();
    query.define_outcome("a", "true").unwrap();

    assert!(matches!(query.execute(), Err(ExecError::Configuration(_))));
    assert_eq!(query.phase(), QueryPhase::Idle);
}

#[test]
fn impossible_evidence_is_distinct_from_nan() {
    let mut net = BayesianNetwork::new();
    let a = net.add_boolean_event("a").unwrap();
    net.add_line(a, 1.0, 0, &[]).unwrap();
    net.add_line(a, 0.0, 1, &[]).unwrap();
    let b = net.add_boolean_event("b").unwrap();
    net.add_line(b, 0.5, 0, &[]).unwrap();
    net.add_line(b, 0.5, 1, &[]).unwrap();

    let mut query = EnumerationQuery::new(Arc::new(net));
    query
        .set_descriptor(QueryDescriptor::new().outcome(b, 0).evidence(a, 1))
        .unwrap();

    let err = query.execute().unwrap_err();
    assert!(matches!(err, ExecError::UnsatisfiableEvidence(_)), "{}", err);
    assert!(query.probability().is_none());
}

#[test]
fn failing_query_fails_the_same_way_again() {
    let mut query = EnumerationQuery::new(incomplete_child());
    query.define_outcome("b", "true").unwrap();
    let first = query.execute().unwrap_err();
    let second = query.execute().unwrap_err();
    assert_eq!(first, second);
}

#[test]
fn failure_does_not_disturb_other_sessions() {
    let (net, _, b) = two_node();
    let mut bad = EnumerationQuery::new(Arc::clone(&net));
    assert!(bad
        .set_descriptor(QueryDescriptor::new().outcome(b, 7))
        .is_err());

    let mut good = bad.clone_query();
    good.define_outcome("b", "true").unwrap();
    assert!((good.execute().unwrap() - 0.31).abs() < 1e-9);
}

#[test]
fn hidden_state_satisfaction_is_invalid() {
    let (net, a, _) = two_node();
    let mut query = EnumerationQuery::new(net);
    query.classify();
    let state = query.state(a).unwrap();
    assert!(matches!(
        state.is_satisfied(),
        Err(ExecError::InvalidState(_))
    ));
}
