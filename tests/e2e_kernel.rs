//! End-to-end tick-loop scenarios: learning, emergence, consolidation,
//! and the cross-thread command queue.

use smallvec::smallvec;
use tapestry::graph::EDGE_TEMPORARY;
use tapestry::{Command, Curve, Kernel, KernelConfig, Processor, Topology};

fn coactive_pair() -> (Topology, u32, u32) {
    let mut t = Topology::default();
    let a = t.weave("fire").unwrap();
    let b = t.weave("smoke").unwrap();
    t.create_bidirectional(a, b, 0.5).unwrap();
    t.set_activation(a, 0.9).unwrap();
    t.set_activation(b, 0.7).unwrap();
    (t, a, b)
}

#[test]
fn test_coactivation_strengthens_the_connecting_edge() {
    let (mut t, a, b) = coactive_pair();
    let before = t.graph().weight(a, b).unwrap();
    let kernel = Kernel::default();
    kernel.cycle(&mut t, 0.01).unwrap();

    let after = t.graph().weight(a, b).unwrap();
    assert!(after > before, "weight should grow: {before} -> {after}");
    // one cycle can add at most act_a * act_b * rate * max_gain
    assert!(after - before < 0.9 * 0.7 * kernel.config().learning_rate * 1.5 + 1e-6);
    assert!(t.emergence_metric().is_finite());
}

#[test]
fn test_emergence_is_exactly_zero_when_nothing_is_active() {
    let mut t = Topology::default();
    t.weave("a").unwrap();
    t.weave("b").unwrap();
    let kernel = Kernel::default();
    kernel.run(&mut t, 5).unwrap();
    assert_eq!(t.emergence_metric(), 0.0);
    assert_eq!(t.cycles(), 5);
}

#[test]
fn test_and_state_collapses_when_a_participant_goes_silent() {
    let mut t = Topology::default();
    let a = t.weave("a").unwrap();
    let b = t.weave("b").unwrap();
    t.create_hyperedge(smallvec![a, b], Processor::And).unwrap();
    let kernel = Kernel::default();

    // all active: state climbs toward the average
    for _ in 0..30 {
        t.set_activation(a, 0.8).unwrap();
        t.set_activation(b, 0.8).unwrap();
        kernel.cycle(&mut t, 0.01).unwrap();
    }
    let engaged = t.hyperedge(0).unwrap().state;
    assert!(engaged > 0.3);

    // one participant drops below threshold: state decays toward 0
    for _ in 0..30 {
        t.set_activation(a, 0.8).unwrap();
        t.set_activation(b, 0.0).unwrap();
        kernel.cycle(&mut t, 0.01).unwrap();
    }
    let collapsed = t.hyperedge(0).unwrap().state;
    assert!(collapsed < engaged * 0.3, "state should decay: {engaged} -> {collapsed}");
}

#[test]
fn test_consolidation_soft_prunes_only_weak_edges() {
    let mut t = Topology::default();
    let a = t.weave("a").unwrap();
    let b = t.weave("b").unwrap();
    let c = t.weave("c").unwrap();
    t.create_edge(a, b, 0.01, 0).unwrap();
    t.create_edge(a, c, 0.9, 0).unwrap();

    let kernel = Kernel::new(KernelConfig::default().with_prune_threshold(0.05));
    kernel.consolidate(&mut t);

    let g = t.graph();
    let mut flagged = 0;
    for e in g.row_range(a) {
        if g.flags_at(e) & EDGE_TEMPORARY != 0 {
            flagged += 1;
            assert!(g.weight_at(e).abs() < 0.05);
        }
    }
    assert_eq!(flagged, 1);
    assert_eq!(g.live_out_degree(a), 1);
}

#[test]
fn test_command_queue_feeds_the_run_loop_from_another_thread() {
    let mut t = Topology::default();
    let kernel = Kernel::default();
    let sender = kernel.sender();

    let producer = std::thread::spawn(move || {
        sender.send(Command::Weave("alpha".into()));
        sender.send(Command::Weave("beta".into()));
        sender.send(Command::Bidirectional { a: 0, b: 1, weight: 0.6 });
        sender.send(Command::Sensor { name: "light".into(), value: 0.9 });
    });
    producer.join().unwrap();

    kernel.run(&mut t, 1).unwrap();
    assert_eq!(t.node_count(), 2);
    assert_eq!(t.edge_count(), 2);
    assert_eq!(t.hormones.light, 0.9);
}

#[test]
fn test_trajectory_drives_activation_and_expires() {
    let mut t = Topology::default();
    let a = t.weave("a").unwrap();
    t.evolve_toward(a, 0.8, 0.1, Curve::Sigmoid).unwrap();
    assert_eq!(t.trajectory_count(), 1);

    let kernel = Kernel::default();
    kernel.run(&mut t, 20).unwrap();

    assert_eq!(t.trajectory_count(), 0);
    assert!((t.activation(a) - 0.8).abs() < 0.1);
}

#[cfg(feature = "cuda")]
#[test]
fn test_unavailable_backend_fails_the_cycle_but_not_the_topology() {
    use tapestry::backend::cuda::CudaBackend;
    use tapestry::{Device, Error};

    let (mut t, a, b) = coactive_pair();
    let before = t.graph().weight(a, b).unwrap();

    // a kernel on the stub backend cannot propagate: the cycle fails with
    // a recoverable error and the tick counter does not advance
    let gpu = Kernel::with_backend(KernelConfig::default(), CudaBackend::new());
    let outcome = gpu.cycle(&mut t, 0.01);
    assert!(matches!(outcome, Err(Error::BackendUnavailable(Device::Cuda))));
    assert_eq!(t.cycles(), 0);
    assert_eq!(t.graph().weight(a, b), Some(before));

    // the same topology then ticks normally on the CPU reference
    let cpu = Kernel::default();
    cpu.run(&mut t, 3).unwrap();
    assert_eq!(t.cycles(), 3);
    assert!(t.graph().weight(a, b).unwrap() >= before);
}

#[test]
fn test_long_run_preserves_vector_invariants() {
    let mut t = Topology::default();
    t.bootstrap_primordial().unwrap();
    let kernel = Kernel::new(KernelConfig::default().with_consolidate_every(50));
    kernel.run(&mut t, 200).unwrap();

    for id in 0..t.node_count() as u32 {
        let v = t.vector(id).unwrap();
        assert!(v.norm().is_finite(), "node {id} norm diverged");
        assert!(v.ball_radius() <= tapestry::BALL_RADIUS + 1e-3, "node {id} left the ball");
        assert!(v.activation() >= 0.0 && v.activation().is_finite());
    }
    assert!(t.emergence_metric().is_finite());
}
