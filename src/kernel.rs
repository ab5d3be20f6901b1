//! Per-tick scheduler.
//!
//! Each cycle runs seven phases over one mutably-borrowed topology:
//! hormone refresh, hormonal modulation, hyperedge evaluation, activation
//! propagation, Hebbian batch learning, trajectory advancement, and stats.
//! The kernel never sleeps or throttles; the caller owns cadence.
//!
//! Structural mutation from other threads goes through the command queue
//! and is drained at tick boundaries. A failed command is logged and
//! dropped; it never aborts the run.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::backend::{CpuBackend, DType, TensorBackend};
use crate::graph::EDGE_TEMPORARY;
use crate::learning::{pair_mut, pairwise_update, LearningEngine};
use crate::model::Processor;
use crate::topology::Topology;
use crate::Result;

/// Blend factor for activation propagation: how much of the previous
/// activation survives one tick.
const PROPAGATION_RETAIN: f32 = 0.9;

/// Rate multiplier for hyperedge-to-pairwise learning feedback.
const LEVI_FEEDBACK_RATE: f32 = 0.01;

#[derive(Debug, Clone, PartialEq)]
pub struct KernelConfig {
    /// Simulated seconds per cycle.
    pub dt: f32,
    pub activation_threshold: f32,
    pub learning_rate: f32,
    /// Consolidation cadence in cycles.
    pub consolidate_every: u64,
    /// Edges below this |weight| get soft-pruned at consolidation.
    pub prune_threshold: f32,
    /// Hyperedge usage count above which consolidation reinforces.
    pub reinforce_after: u32,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            activation_threshold: 0.1,
            learning_rate: 0.01,
            consolidate_every: 1000,
            prune_threshold: 0.08,
            reinforce_after: 10,
        }
    }
}

impl KernelConfig {
    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    pub fn with_learning_rate(mut self, rate: f32) -> Self {
        self.learning_rate = rate;
        self
    }

    pub fn with_consolidate_every(mut self, cycles: u64) -> Self {
        self.consolidate_every = cycles;
        self
    }

    pub fn with_prune_threshold(mut self, threshold: f32) -> Self {
        self.prune_threshold = threshold;
        self
    }
}

// ============================================================================
// Command queue
// ============================================================================

/// Structural mutation requested from outside the tick loop.
#[derive(Debug, Clone)]
pub enum Command {
    Weave(String),
    Connect { src: u32, dst: u32, weight: f32, flags: u8 },
    Bidirectional { a: u32, b: u32, weight: f32 },
    Hyperedge { participants: SmallVec<[u32; 8]>, processor: Processor },
    Sensor { name: String, value: f32 },
}

type SharedQueue = Arc<Mutex<VecDeque<Command>>>;

/// Producer half of the command queue; cheap to clone across threads.
#[derive(Debug, Clone)]
pub struct CommandSender {
    queue: SharedQueue,
}

impl CommandSender {
    pub fn send(&self, command: Command) {
        self.queue.lock().push_back(command);
    }
}

// ============================================================================
// Kernel
// ============================================================================

pub struct Kernel<B: TensorBackend = CpuBackend> {
    config: KernelConfig,
    backend: B,
    engine: LearningEngine,
    queue: SharedQueue,
}

impl Kernel<CpuBackend> {
    pub fn new(config: KernelConfig) -> Self {
        Self::with_backend(config, CpuBackend::new())
    }
}

impl Default for Kernel<CpuBackend> {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}

impl<B: TensorBackend> Kernel<B> {
    pub fn with_backend(config: KernelConfig, backend: B) -> Self {
        let engine = LearningEngine {
            base_rate: config.learning_rate,
            activation_threshold: config.activation_threshold,
        };
        Self { config, backend, engine, queue: Arc::new(Mutex::new(VecDeque::new())) }
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Handle for pushing commands from other threads.
    pub fn sender(&self) -> CommandSender {
        CommandSender { queue: Arc::clone(&self.queue) }
    }

    /// Run `cycles` ticks: drain pending commands at each boundary, cycle,
    /// consolidate on cadence.
    pub fn run(&self, topology: &mut Topology, cycles: u64) -> Result<()> {
        for _ in 0..cycles {
            self.apply_pending(topology);
            self.cycle(topology, self.config.dt)?;
            if self.config.consolidate_every > 0
                && topology.cycles() % self.config.consolidate_every == 0
            {
                self.consolidate(topology);
            }
        }
        Ok(())
    }

    /// One tick.
    pub fn cycle(&self, topology: &mut Topology, dt: f32) -> Result<()> {
        // Phase 1: hormones.
        topology.hormones.refresh();

        // Phase 2: hormonal modulation of vector zones.
        self.modulate(topology);

        // Phase 3: hyperedge evaluation against the prior activation
        // snapshot, with Levi feedback into pairwise learning.
        let snapshot = topology.activation_snapshot();
        let threshold = self.config.activation_threshold;
        let mut feedback: Vec<(u32, u32, f32)> = Vec::new();
        for edge in topology.hyperedges_mut() {
            let target = edge.evaluate(&snapshot, threshold);
            edge.smooth(target);
            if edge.state > threshold {
                edge.usage += 1;
                let rate = edge.state * LEVI_FEEDBACK_RATE;
                for (i, &a) in edge.participants.iter().enumerate() {
                    for &b in &edge.participants[i + 1..] {
                        if a != b {
                            feedback.push((a, b, rate));
                        }
                    }
                }
            }
        }
        {
            let nodes = topology.nodes_mut();
            for (a, b, rate) in feedback {
                let (a, b) = (a as usize, b as usize);
                if a < nodes.len() && b < nodes.len() {
                    let (va, vb) = pair_mut(nodes, a, b);
                    pairwise_update(va, vb, rate);
                }
            }
        }

        // Phase 4: activation propagation over outgoing edges.
        self.propagate(topology, &snapshot)?;

        // Phase 5: Hebbian batch learning, scaled by hormonal gain.
        let gain = topology.hormones.learning_gain();
        {
            let (nodes, graph) = topology.nodes_and_graph_mut();
            self.engine.batch_update(nodes, graph, gain);
        }

        // Phase 6: trajectories.
        self.advance_trajectories(topology, dt);

        // Phase 7: stats.
        let total_state: f32 = (0..topology.hyperedge_count() as u32)
            .filter_map(|i| topology.hyperedge(i))
            .map(|e| e.state)
            .sum();
        let total_activation: f32 = topology.activation_snapshot().iter().sum();
        let emergence =
            if total_activation > 0.0 { total_state / total_activation } else { 0.0 };
        topology.advance_cycle(emergence);

        debug!(
            cycle = topology.cycles(),
            emergence,
            nodes = topology.node_count(),
            edges = topology.edge_count(),
            "cycle complete"
        );
        Ok(())
    }

    fn modulate(&self, topology: &mut Topology) {
        let stress = topology.hormones.stress;
        let satisfaction = topology.hormones.satisfaction;
        if stress <= 0.5 && satisfaction <= 0.7 {
            return;
        }
        for node in topology.nodes_mut() {
            if stress > 0.5 {
                let scale = 1.0 + stress * 0.2;
                node.emotional_mut().iter_mut().for_each(|x| *x *= scale);
            }
            if satisfaction > 0.7 {
                node.connections_mut().iter_mut().for_each(|x| *x *= 1.01);
            }
            node.normalize();
            node.project_ball();
        }
    }

    /// Each node pulls the weighted average activation of its outgoing
    /// targets through the backend's sparse×dense product. Incoming edges
    /// are not indexed; the outgoing aggregate stands in for them.
    fn propagate(&self, topology: &mut Topology, snapshot: &[f32]) -> Result<()> {
        let n = topology.node_count();
        if n == 0 || topology.edge_count() == 0 {
            return Ok(());
        }

        let mut dense = self.backend.alloc(DType::F32, &[n, 1])?;
        self.backend.write(&mut dense, snapshot)?;
        let mut out = self.backend.alloc(DType::F32, &[n, 1])?;
        self.backend.spmm(topology.graph(), &dense, &mut out)?;
        let weighted = self.backend.read(&out)?;

        let degrees: Vec<usize> =
            (0..n as u32).map(|i| topology.graph().live_out_degree(i)).collect();
        let nodes = topology.nodes_mut();
        for (i, node) in nodes.iter_mut().enumerate() {
            if degrees[i] == 0 {
                continue;
            }
            let incoming = weighted[i] / degrees[i] as f32;
            let blended = snapshot[i] * PROPAGATION_RETAIN + incoming * (1.0 - PROPAGATION_RETAIN);
            node.push_activation(blended.clamp(0.0, 1.0));
        }
        Ok(())
    }

    fn advance_trajectories(&self, topology: &mut Topology, dt: f32) {
        let mut updates: Vec<(u32, f32)> = Vec::new();
        let trajectories = topology.trajectories_mut();
        for t in trajectories.iter_mut() {
            updates.push((t.node, t.advance(dt)));
        }
        trajectories.retain(|t| !t.complete());
        for (node, value) in updates {
            if let Some(v) = topology.nodes_mut().get_mut(node as usize) {
                v.set_activation(value);
            }
        }
    }

    /// Periodic maintenance: soft-prune weak edges, reinforce well-used
    /// hyperedges.
    pub fn consolidate(&self, topology: &mut Topology) {
        let prune = self.config.prune_threshold;
        let mut pruned = 0usize;
        {
            let graph = topology.graph_mut();
            for e in 0..graph.edge_count() {
                let flags = graph.flags_at(e);
                if flags & EDGE_TEMPORARY == 0 && graph.weight_at(e).abs() < prune {
                    graph.set_flags_at(e, flags | EDGE_TEMPORARY);
                    pruned += 1;
                }
            }
        }

        let mut reinforced = 0usize;
        for edge in topology.hyperedges_mut() {
            if edge.usage > self.config.reinforce_after {
                edge.state = (edge.state * 1.1).min(1.0);
                edge.usage = 0;
                reinforced += 1;
            }
        }

        info!(cycle = topology.cycles(), pruned, reinforced, "consolidation pass");
    }

    /// Drain and apply queued commands. Failures are logged and dropped.
    fn apply_pending(&self, topology: &mut Topology) {
        loop {
            let command = { self.queue.lock().pop_front() };
            let Some(command) = command else { break };
            let outcome = match command {
                Command::Weave(ref identifier) => topology.weave(identifier).map(|_| ()),
                Command::Connect { src, dst, weight, flags } => {
                    topology.create_edge(src, dst, weight, flags)
                }
                Command::Bidirectional { a, b, weight } => {
                    topology.create_bidirectional(a, b, weight)
                }
                Command::Hyperedge { ref participants, processor } => {
                    topology.create_hyperedge(participants.clone(), processor).map(|_| ())
                }
                Command::Sensor { ref name, value } => {
                    topology.sensor_input(name, value);
                    Ok(())
                }
            };
            if let Err(error) = outcome {
                warn!(%error, "queued command dropped");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
