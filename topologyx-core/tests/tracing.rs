//! Instrumentation emitted by a full ToMaTo run.

mod common;

use common::{Line, two_squares};
use topologyx_core::TomatoBuilder;
use topologyx_test_support::tracing::capture;
use tracing::Level;

#[test]
fn run_records_each_stage() {
    let cloud = two_squares();
    let tomato = TomatoBuilder::new()
        .with_n_neighbors(3)
        .build()
        .expect("configuration is valid");

    let (result, trace) = capture(|| tomato.run(&cloud));
    let result = result.expect("clustering succeeds");

    for name in [
        "tomato.run",
        "tomato.fit",
        "density.estimate",
        "neighbors.rank",
        "filtration.build",
        "tomato.fit_predict",
        "tomato.define_clusters",
    ] {
        assert!(trace.span(name).is_some(), "missing span {name}");
    }

    let fit_predict = trace.span("tomato.fit_predict").expect("span was captured");
    assert_eq!(fit_predict.fields.get("width").map(String::as_str), Some("3"));
    assert_eq!(
        fit_predict.fields.get("clusters").map(String::as_str),
        Some(result.cluster_count().to_string().as_str()),
    );
    assert_eq!(
        fit_predict.fields.get("data_source").map(String::as_str),
        Some("two-squares"),
    );
    assert!(trace.has_event(Level::INFO, "tomato clustering complete"));
}

#[test]
fn escalation_steps_are_logged() {
    let cloud = two_squares();
    let tomato = TomatoBuilder::new()
        .with_n_neighbors(3)
        .with_n_clusters(1)
        .build()
        .expect("configuration is valid");

    let (result, trace) = capture(|| tomato.run(&cloud));
    let result = result.expect("clustering succeeds");

    assert!(trace.has_event(Level::DEBUG, "widened neighbourhood"));
    assert_eq!(
        trace.span_count("tomato.define_clusters"),
        result.escalations() + 1,
    );
    assert!(result.escalations() > 0);
    // Every width slices the same rankings.
    assert_eq!(trace.span_count("neighbors.rank"), 1);
}

#[test]
fn empty_source_warns_before_failing() {
    let tomato = TomatoBuilder::new().build().expect("configuration is valid");

    let (result, trace) = capture(|| tomato.run(&Line::new(&[])));

    assert!(result.is_err());
    assert!(trace.has_event(Level::WARN, "data source is empty, returning error"));
}
