//! End-to-end construction scenarios against the public API.

use pretty_assertions::assert_eq;
use smallvec::smallvec;
use tapestry::{Error, Processor, Topology, TopologyConfig, BALL_RADIUS};

#[test]
fn test_weave_is_deterministic_across_instances() {
    let mut t1 = Topology::default();
    let mut t2 = Topology::default();
    let a1 = t1.weave("concept").unwrap();
    let a2 = t2.weave("concept").unwrap();
    assert_eq!(t1.vector(a1).unwrap(), t2.vector(a2).unwrap());
}

#[test]
fn test_woven_vectors_satisfy_geometry_invariants() {
    let mut t = Topology::default();
    for name in ["fire", "smoke", "water", "a much longer identifier", ""] {
        let id = t.weave(name).unwrap();
        let v = t.vector(id).unwrap();
        assert!((v.norm() - 1.0).abs() < 1e-4, "norm for {name:?}");
        assert!(v.ball_radius() <= BALL_RADIUS + 1e-4, "ball for {name:?}");
    }
}

#[test]
fn test_repeated_bidirectional_never_grows_the_csr() {
    let mut t = Topology::default();
    let a = t.weave("a").unwrap();
    let b = t.weave("b").unwrap();
    t.create_bidirectional(a, b, 0.5).unwrap();
    let edges = t.edge_count();
    for _ in 0..10 {
        t.create_bidirectional(a, b, 0.5).unwrap();
    }
    assert_eq!(t.edge_count(), edges);
    assert_eq!(t.node_count(), 2);
}

#[test]
fn test_capacity_errors_leave_the_topology_untouched() {
    let mut t = Topology::new(TopologyConfig::default().with_max_nodes(1).with_max_edges(0));
    let a = t.weave("only").unwrap();
    assert!(matches!(t.weave("overflow"), Err(Error::CapacityExceeded { .. })));
    assert!(matches!(t.create_edge(a, a, 0.5, 0), Err(Error::CapacityExceeded { .. })));
    assert_eq!(t.node_count(), 1);
    assert_eq!(t.edge_count(), 0);
}

#[test]
fn test_invalid_references_are_rejected_without_partial_insert() {
    let mut t = Topology::default();
    let a = t.weave("a").unwrap();
    assert!(matches!(
        t.create_edge(a, 77, 0.5, 0),
        Err(Error::InvalidReference { kind: "node", id: 77 })
    ));
    assert_eq!(t.edge_count(), 0);
    assert_eq!(t.vector(a).unwrap().degree(), 0.0);
}

#[test]
fn test_sensor_input_routes_hormones_and_concepts() {
    let mut t = Topology::default();
    t.weave("anchor").unwrap();
    t.sensor_input("battery", 0.3);
    t.sensor_input("light", 1.0);
    t.sensor_input("temperature", 0.6);
    assert_eq!(t.hormones.drive, 0.3);
    assert_eq!(t.hormones.light, 1.0);
    assert_eq!(t.hormones.temperature, 0.6);

    // unknown names stimulate a node instead
    t.sensor_input("proximity", 0.7);
    assert!(t.activation(0) > 0.0);
}

#[test]
fn test_bootstrap_primordial_builds_the_seed_structure() {
    let mut t = Topology::default();
    t.bootstrap_primordial().unwrap();

    let this = t.node_id("self").unwrap();
    let now = t.node_id("now").unwrap();
    let other = t.node_id("other").unwrap();

    assert_eq!(t.node_count(), 4);
    assert_eq!(t.edge_count(), 6);
    assert_eq!(t.hyperedge_count(), 1);
    assert!(t.graph().weight(this, now).unwrap() > t.graph().weight(this, other).unwrap());
    // bootstrapping twice is harmless: every weave resolves to existing ids
    t.bootstrap_primordial().unwrap();
    assert_eq!(t.node_count(), 4);
    assert_eq!(t.edge_count(), 6);
}

#[test]
fn test_hyperedge_construction_validates_everything_up_front() {
    let mut t = Topology::default();
    let a = t.weave("a").unwrap();
    let b = t.weave("b").unwrap();
    let id = t.create_hyperedge(smallvec![a, b], Processor::And).unwrap();
    assert_eq!(id, 0);
    assert!(t.create_hyperedge(smallvec![a, 42], Processor::Or).is_err());
    assert_eq!(t.hyperedge_count(), 1);
}
