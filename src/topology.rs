//! The aggregate root: one owned, self-contained memory substrate.
//!
//! A `Topology` holds the node store, the sparse adjacency, the hyperedge
//! table, the hormonal context, scheduled trajectories and the experience
//! ring. All construction-time mutation goes through its methods; per-tick
//! evolution is driven externally by the kernel, which borrows the topology
//! mutably for each cycle. There is no process-wide singleton.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::warn;

use crate::experience::{Experience, ExperienceLog};
use crate::graph::{CsrGraph, EDGE_BIDIRECTIONAL};
use crate::learning::{pair_mut, pairwise_update};
use crate::model::vector::{cosine_similarity, identifier_hash};
use crate::model::{Curve, HormonalContext, Hyperedge, NodeVector, Processor, Trajectory};
use crate::{Error, Result};

/// Hard limits and thresholds for one topology instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologyConfig {
    pub max_nodes: usize,
    pub max_edges: usize,
    pub max_hyperedges: usize,
    /// Maximum participants per hyperedge.
    pub max_arity: usize,
    /// Activation level above which a node counts as active.
    pub activation_threshold: f32,
    pub experience_capacity: usize,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            max_nodes: 8192,
            max_edges: 262_144,
            max_hyperedges: 4096,
            max_arity: 16,
            activation_threshold: 0.1,
            experience_capacity: 256,
        }
    }
}

impl TopologyConfig {
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_max_edges(mut self, max_edges: usize) -> Self {
        self.max_edges = max_edges;
        self
    }

    pub fn with_max_hyperedges(mut self, max_hyperedges: usize) -> Self {
        self.max_hyperedges = max_hyperedges;
        self
    }

    pub fn with_activation_threshold(mut self, threshold: f32) -> Self {
        self.activation_threshold = threshold;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topology {
    config: TopologyConfig,
    nodes: Vec<NodeVector>,
    names: HashMap<String, u32>,
    graph: CsrGraph,
    hyperedges: Vec<Hyperedge>,
    pub hormones: HormonalContext,
    trajectories: Vec<Trajectory>,
    experiences: ExperienceLog,
    cycles: u64,
    emergence: f32,
}

impl Default for Topology {
    fn default() -> Self {
        Self::new(TopologyConfig::default())
    }
}

impl Topology {
    pub fn new(config: TopologyConfig) -> Self {
        let experiences = ExperienceLog::new(config.experience_capacity);
        Self {
            config,
            nodes: Vec::new(),
            names: HashMap::new(),
            graph: CsrGraph::new(),
            hyperedges: Vec::new(),
            hormones: HormonalContext::default(),
            trajectories: Vec::new(),
            experiences,
            cycles: 0,
            emergence: 0.0,
        }
    }

    // ========================================================================
    // Node store
    // ========================================================================

    /// Weave an identifier into the topology, deterministically seeding a
    /// fresh vector from its hash. Re-weaving an existing identifier
    /// returns the existing id without touching anything.
    pub fn weave(&mut self, identifier: &str) -> Result<u32> {
        if let Some(&id) = self.names.get(identifier) {
            return Ok(id);
        }
        if self.nodes.len() >= self.config.max_nodes {
            return Err(Error::CapacityExceeded { kind: "node", limit: self.config.max_nodes });
        }
        let id = self.nodes.len() as u32;
        self.nodes.push(NodeVector::seeded(identifier_hash(identifier), self.cycles));
        self.graph.add_node();
        self.names.insert(identifier.to_owned(), id);
        Ok(id)
    }

    pub fn node_id(&self, identifier: &str) -> Option<u32> {
        self.names.get(identifier).copied()
    }

    pub fn vector(&self, id: u32) -> Option<&NodeVector> {
        self.nodes.get(id as usize)
    }

    pub fn activation(&self, id: u32) -> f32 {
        self.nodes.get(id as usize).map(|n| n.activation()).unwrap_or(0.0)
    }

    /// Set a node's activation from outside the tick loop, shifting the
    /// activation history like any other stimulus.
    pub fn set_activation(&mut self, id: u32, value: f32) -> Result<()> {
        match self.nodes.get_mut(id as usize) {
            Some(node) => {
                node.push_activation(value);
                Ok(())
            }
            None => Err(Error::InvalidReference { kind: "node", id }),
        }
    }

    pub fn similarity(&self, a: u32, b: u32) -> Option<f32> {
        Some(cosine_similarity(self.vector(a)?, self.vector(b)?))
    }

    // ========================================================================
    // Edges
    // ========================================================================

    /// Insert or update a directed edge. Degree metadata is bumped on both
    /// endpoints only when the edge is novel.
    pub fn create_edge(&mut self, src: u32, dst: u32, weight: f32, flags: u8) -> Result<()> {
        for id in [src, dst] {
            if id as usize >= self.nodes.len() {
                return Err(Error::InvalidReference { kind: "node", id });
            }
        }
        if self.graph.edge_count() >= self.config.max_edges && self.graph.weight(src, dst).is_none()
        {
            return Err(Error::CapacityExceeded { kind: "edge", limit: self.config.max_edges });
        }
        let novel = self.graph.upsert(src, dst, weight, flags)?;
        if novel {
            self.nodes[src as usize].bump_degree();
            self.nodes[dst as usize].bump_degree();
        }
        Ok(())
    }

    /// Two directed edges plus a seed Hebbian pull so the pair starts
    /// converging immediately.
    pub fn create_bidirectional(&mut self, a: u32, b: u32, weight: f32) -> Result<()> {
        self.create_edge(a, b, weight, EDGE_BIDIRECTIONAL)?;
        self.create_edge(b, a, weight, EDGE_BIDIRECTIONAL)?;
        if a != b {
            let (va, vb) = pair_mut(&mut self.nodes, a as usize, b as usize);
            pairwise_update(va, vb, weight * 0.1);
        }
        Ok(())
    }

    // ========================================================================
    // Hyperedges
    // ========================================================================

    /// Create an n-ary relation. All checks run before any mutation.
    pub fn create_hyperedge(
        &mut self,
        participants: SmallVec<[u32; 8]>,
        processor: Processor,
    ) -> Result<u32> {
        if self.hyperedges.len() >= self.config.max_hyperedges {
            return Err(Error::CapacityExceeded {
                kind: "hyperedge",
                limit: self.config.max_hyperedges,
            });
        }
        if participants.len() > self.config.max_arity {
            return Err(Error::CapacityExceeded { kind: "arity", limit: self.config.max_arity });
        }
        for &id in &participants {
            if id as usize >= self.nodes.len() {
                return Err(Error::InvalidReference { kind: "node", id });
            }
        }
        let id = self.hyperedges.len() as u32;
        self.hyperedges.push(Hyperedge::new(participants, processor));
        Ok(id)
    }

    // ========================================================================
    // Trajectories
    // ========================================================================

    /// Schedule a node's activation to move toward `target` over `duration`.
    pub fn evolve_toward(
        &mut self,
        node: u32,
        target: f32,
        duration: f32,
        curve: Curve,
    ) -> Result<()> {
        if node as usize >= self.nodes.len() {
            return Err(Error::InvalidReference { kind: "node", id: node });
        }
        let start = self.activation(node);
        self.trajectories.push(Trajectory::new(node, start, target, duration, curve));
        Ok(())
    }

    // ========================================================================
    // Sensors & experience
    // ========================================================================

    /// Route a named sensor reading. Hormone names feed the hormonal
    /// context; anything else hashes to a node slot and stimulates it.
    /// A reading into an empty topology is dropped with a warning.
    pub fn sensor_input(&mut self, name: &str, value: f32) {
        let value = value.clamp(0.0, 1.0);
        match name {
            "drive" | "battery" => self.hormones.drive = value,
            "temperature" => self.hormones.temperature = value,
            "light" => self.hormones.light = value,
            "motion" => self.hormones.motion = value,
            "sound" => self.hormones.sound = value,
            other => {
                if self.nodes.is_empty() {
                    warn!(sensor = other, "sensor reading into empty topology dropped");
                    return;
                }
                let slot = identifier_hash(other) % self.nodes.len() as u32;
                self.nodes[slot as usize].push_activation(value);
            }
        }
    }

    /// Record the current moment: active node subset, sensory snapshot,
    /// caller-supplied valence.
    pub fn record_experience(&mut self, valence: f32) {
        let mut activated: SmallVec<[u32; 8]> = SmallVec::new();
        for (id, node) in self.nodes.iter().enumerate() {
            if node.activation() > self.config.activation_threshold {
                activated.push(id as u32);
                if activated.len() == activated.inline_size() {
                    break;
                }
            }
        }
        let h = &self.hormones;
        self.experiences.record(Experience {
            timestamp: chrono::Utc::now(),
            activated,
            sensory: [h.drive, h.temperature, h.light, h.motion, h.sound],
            valence,
        });
    }

    // ========================================================================
    // Bootstrap
    // ========================================================================

    /// Seed a minimal self-referential structure: four anchor concepts,
    /// their mutual links, and a resonance relation binding the present
    /// moment together.
    pub fn bootstrap_primordial(&mut self) -> Result<()> {
        let this = self.weave("self")?;
        let now = self.weave("now")?;
        let here = self.weave("here")?;
        let other = self.weave("other")?;

        self.set_activation(this, 0.8)?;
        self.set_activation(now, 0.9)?;
        self.set_activation(here, 0.7)?;
        self.set_activation(other, 0.2)?;

        self.create_bidirectional(this, now, 0.9)?;
        self.create_bidirectional(this, here, 0.9)?;
        self.create_bidirectional(this, other, 0.3)?;

        // Emotional seed: the self/other axis starts with opposite valence.
        if let Some(v) = self.nodes.get_mut(this as usize) {
            v.emotional_mut()[0] = 0.5;
            v.normalize();
        }
        if let Some(v) = self.nodes.get_mut(other as usize) {
            v.emotional_mut()[0] = -0.3;
            v.normalize();
        }

        self.create_hyperedge(SmallVec::from_slice(&[this, now, here]), Processor::Resonance)?;
        Ok(())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn hyperedge_count(&self) -> usize {
        self.hyperedges.len()
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Σ hyperedge state / Σ node activation, 0 when nothing is active.
    pub fn emergence_metric(&self) -> f32 {
        self.emergence
    }

    pub fn experiences(&self) -> &ExperienceLog {
        &self.experiences
    }

    pub fn graph(&self) -> &CsrGraph {
        &self.graph
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    pub fn hyperedge(&self, id: u32) -> Option<&Hyperedge> {
        self.hyperedges.get(id as usize)
    }

    pub fn trajectory_count(&self) -> usize {
        self.trajectories.len()
    }

    /// Activation snapshot of every node, in id order.
    pub fn activation_snapshot(&self) -> Vec<f32> {
        self.nodes.iter().map(|n| n.activation()).collect()
    }

    // ========================================================================
    // Kernel access (crate-internal)
    // ========================================================================

    pub(crate) fn nodes_mut(&mut self) -> &mut Vec<NodeVector> {
        &mut self.nodes
    }

    pub(crate) fn graph_mut(&mut self) -> &mut CsrGraph {
        &mut self.graph
    }

    pub(crate) fn hyperedges_mut(&mut self) -> &mut Vec<Hyperedge> {
        &mut self.hyperedges
    }

    pub(crate) fn trajectories_mut(&mut self) -> &mut Vec<Trajectory> {
        &mut self.trajectories
    }

    pub(crate) fn nodes_and_graph_mut(&mut self) -> (&mut Vec<NodeVector>, &mut CsrGraph) {
        (&mut self.nodes, &mut self.graph)
    }

    pub(crate) fn advance_cycle(&mut self, emergence: f32) {
        self.cycles += 1;
        self.emergence = emergence;
    }
}

// ============================================================================
// Tests
// ============================================================================
