//! Session lifecycle, cloning and batch execution.

use std::sync::Arc;
use std::thread;

use baynet_core::{
    execute_batch, BayesianQuery, EnumerationQuery, EventRole, QueryConfig, QueryDescriptor,
    QueryPhase,
};

use crate::fixtures::{burglary, two_node};

#[test]
fn execute_is_idempotent() {
    let mut query = EnumerationQuery::new(burglary());
    query.define_outcome("earthquake", "true").unwrap();
    query.define_evidence("alarm", "true").unwrap();

    let first = query.execute().unwrap();
    let second = query.execute().unwrap();
    assert_eq!(first.to_bits(), second.to_bits());
    assert_eq!(query.probability(), Some(second));
    assert_eq!(query.phase(), QueryPhase::Done);
}

#[test]
fn changing_the_query_clears_the_result() {
    let (net, _, _) = two_node();
    let mut query = EnumerationQuery::new(net);
    query.define_outcome("a", "true").unwrap();
    query.execute().unwrap();
    assert!(query.probability().is_some());

    query.define_evidence("b", "true").unwrap();
    assert_eq!(query.probability(), None);
    assert_eq!(query.phase(), QueryPhase::Idle);
}

#[test]
fn classify_reads_roles_from_descriptor() {
    let (net, a, b) = two_node();
    let mut query = EnumerationQuery::new(net);
    query
        .set_descriptor(QueryDescriptor::new().evidence(b, 1))
        .unwrap();
    query.classify();
    assert_eq!(query.state(a).unwrap().role(), EventRole::Hidden);
    assert_eq!(query.state(b).unwrap().role(), EventRole::Evidence);
    assert_eq!(query.state(b).unwrap().compare_value(), 1);
}

#[test]
fn clones_do_not_share_state() {
    let (net, a, b) = two_node();
    let mut first = EnumerationQuery::new(net);
    first
        .set_descriptor(QueryDescriptor::new().outcome(a, 0).evidence(b, 0))
        .unwrap();
    let mut second = first.clone_query();
    second
        .set_descriptor(QueryDescriptor::new().outcome(b, 1))
        .unwrap();

    let p_first = first.execute().unwrap();
    let p_second = second.execute().unwrap();
    assert!((p_first - 0.24 / 0.31).abs() < 1e-9);
    assert!((p_second - 0.69).abs() < 1e-9);
    assert_eq!(first.execute().unwrap(), p_first);
}

#[test]
fn sessions_run_concurrently_over_one_network() {
    let net = burglary();
    let handles: Vec<_> = ["john_calls", "mary_calls", "alarm"]
        .into_iter()
        .map(|label| {
            let net = Arc::clone(&net);
            thread::spawn(move || {
                let mut query = EnumerationQuery::new(net);
                query.define_outcome("burglary", "true").unwrap();
                query.define_evidence(label, "true").unwrap();
                query.execute().unwrap()
            })
        })
        .collect();

    let parallel: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for (label, p) in ["john_calls", "mary_calls", "alarm"].into_iter().zip(parallel) {
        let mut query = EnumerationQuery::new(Arc::clone(&net));
        query.define_outcome("burglary", "true").unwrap();
        query.define_evidence(label, "true").unwrap();
        assert_eq!(query.execute().unwrap(), p);
    }
}

#[test]
fn batch_matches_individual_sessions() {
    let (net, a, b) = two_node();
    let descriptors = vec![
        QueryDescriptor::new().outcome(b, 0),
        QueryDescriptor::new().outcome(a, 0).evidence(b, 0),
        QueryDescriptor::new().outcome(a, 1).evidence(b, 1),
    ];
    let results = execute_batch(&net, &descriptors, QueryConfig::default());
    assert_eq!(results.len(), descriptors.len());

    for (descriptor, result) in descriptors.iter().zip(&results) {
        let mut query = EnumerationQuery::new(Arc::clone(&net));
        query.set_descriptor(descriptor.clone()).unwrap();
        assert_eq!(query.execute().unwrap(), *result.as_ref().unwrap());
    }
}

#[cfg(feature = "serde")]
#[test]
fn descriptor_loads_from_json() {
    let (net, _, _) = two_node();
    let json = r#"{"assignments":[
        {"event":0,"role":"Outcome","value":0},
        {"event":1,"role":"Evidence","value":0}
    ]}"#;
    let descriptor: QueryDescriptor = serde_json::from_str(json).unwrap();

    let mut query = EnumerationQuery::new(net);
    query.set_descriptor(descriptor).unwrap();
    assert_eq!(query.problem(), "P(a=true|b=true)");
    assert!((query.execute().unwrap() - 0.24 / 0.31).abs() < 1e-9);
}
