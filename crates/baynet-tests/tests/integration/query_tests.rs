//! End-to-end probability queries against known fixtures.

use baynet_core::{BayesianQuery, EnumerationQuery, QueryDescriptor};

use crate::fixtures::{burglary, two_node, weather};

const EPS: f64 = 1e-9;

#[test]
fn child_marginal_without_evidence() {
    let (net, _, b) = two_node();
    let mut query = EnumerationQuery::new(net);
    query
        .set_descriptor(QueryDescriptor::new().outcome(b, 0))
        .unwrap();
    let p = query.execute().unwrap();
    assert!((p - 0.31).abs() < EPS, "got {}", p);
}

#[test]
fn parent_posterior_given_child() {
    let (net, a, b) = two_node();
    let mut query = EnumerationQuery::new(net);
    query
        .set_descriptor(QueryDescriptor::new().outcome(a, 0).evidence(b, 0))
        .unwrap();
    let p = query.execute().unwrap();
    assert!((p - 0.24 / 0.31).abs() < EPS, "got {}", p);
}

#[test]
fn burglary_given_both_calls() {
    let mut query = EnumerationQuery::new(burglary());
    query.define_outcome("burglary", "true").unwrap();
    query.define_evidence("john_calls", "true").unwrap();
    query.define_evidence("mary_calls", "true").unwrap();

    let p = query.execute().unwrap();
    assert!((p - 0.284_171_835_364_392_9).abs() < EPS, "got {}", p);
    assert_eq!(
        query.problem(),
        "P(burglary=true|john_calls=true,mary_calls=true)"
    );
    assert_eq!(
        query.to_string(),
        "[EnumerationQuery: P(burglary=true|john_calls=true,mary_calls=true)=28.42%]"
    );
}

#[test]
fn alarm_marginal() {
    let mut query = EnumerationQuery::new(burglary());
    query.define_outcome("alarm", "true").unwrap();
    let p = query.execute().unwrap();
    assert!((p - 0.002_516_442).abs() < EPS, "got {}", p);
}

#[test]
fn joint_outcome_over_two_events() {
    let (net, a, b) = two_node();
    let mut query = EnumerationQuery::new(net);
    query
        .set_descriptor(QueryDescriptor::new().outcome(a, 1).outcome(b, 1))
        .unwrap();
    let p = query.execute().unwrap();
    assert!((p - 0.7 * 0.9).abs() < EPS, "got {}", p);
}

#[test]
fn multi_valued_parent_posterior() {
    let mut query = EnumerationQuery::new(weather());
    query.define_outcome("weather", "rain").unwrap();
    query.define_evidence("umbrella", "true").unwrap();
    let p = query.execute().unwrap();
    assert!((p - 0.18 / 0.35).abs() < EPS, "got {}", p);
}

#[test]
fn posteriors_over_all_choices_sum_to_one() {
    let net = weather();
    let weather_id = net.event_id("weather").unwrap();
    let umbrella_id = net.event_id("umbrella").unwrap();

    let total: f64 = (0..3)
        .map(|v| {
            let mut query = EnumerationQuery::new(net.clone());
            query
                .set_descriptor(
                    QueryDescriptor::new()
                        .outcome(weather_id, v)
                        .evidence(umbrella_id, 1),
                )
                .unwrap();
            query.execute().unwrap()
        })
        .sum();
    assert!((total - 1.0).abs() < EPS);
}

#[test]
fn evidence_only_query_is_certain() {
    let (net, _, b) = two_node();
    let mut query = EnumerationQuery::new(net);
    query
        .set_descriptor(QueryDescriptor::new().evidence(b, 0))
        .unwrap();
    let p = query.execute().unwrap();
    assert!((p - 1.0).abs() < EPS);
    assert_eq!(query.problem(), "P(|b=true)");
}
