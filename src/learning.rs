//! Co-activation learning: "fire together, wire together."
//!
//! The pairwise rule pulls two vectors toward each other at zone-specific
//! rates. The semantic zone converges fastest; the hyperbolic zone takes a
//! Riemannian-corrected step so distances respect the Poincaré metric; the
//! emotional zone converges only where the two fields agree in sign.

use crate::graph::CsrGraph;
use crate::model::vector::{zone, NodeVector};

/// Per-zone step multipliers relative to the caller-supplied rate.
const SEMANTIC_STEP: f32 = 0.1;
const HYPERBOLIC_STEP: f32 = 0.01;
const EMOTIONAL_STEP: f32 = 0.05;

/// Floor for the conformal-factor denominator. Radii are projected to
/// stay below the ball bound, but float drift can still graze 1.
const MIN_CONFORMAL_DENOM: f32 = 1e-3;

#[derive(Debug, Clone, Copy)]
pub struct LearningEngine {
    /// Base learning-rate constant for batch updates.
    pub base_rate: f32,
    /// Activation level above which a node participates in learning.
    pub activation_threshold: f32,
}

impl Default for LearningEngine {
    fn default() -> Self {
        Self { base_rate: 0.01, activation_threshold: 0.1 }
    }
}

/// Conformal factor of the Poincaré ball at radius `r`: λ = 2/(1−r²).
fn conformal(radius: f32) -> f32 {
    2.0 / (1.0 - radius * radius).max(MIN_CONFORMAL_DENOM)
}

/// Symmetric pairwise update between two node vectors.
///
/// Both vectors are renormalized to unit L2 afterwards; renormalization can
/// push the ball zone back over its bound, so the projection runs last.
pub fn pairwise_update(a: &mut NodeVector, b: &mut NodeVector, rate: f32) {
    // Semantic zone: plain symmetric pull.
    for (xa, xb) in a.semantic_mut().iter_mut().zip(b.semantic_mut().iter_mut()) {
        let gradient = rate * SEMANTIC_STEP * (*xb - *xa);
        *xa += gradient;
        *xb -= gradient;
    }

    // Hyperbolic zone: Riemannian-corrected step, opposite signs.
    let lambda_a = conformal(a.ball_radius());
    let lambda_b = conformal(b.ball_radius());
    for (xa, xb) in a.hyperbolic_mut().iter_mut().zip(b.hyperbolic_mut().iter_mut()) {
        let diff = *xb - *xa;
        *xa += rate * HYPERBOLIC_STEP * lambda_a * lambda_a * diff;
        *xb -= rate * HYPERBOLIC_STEP * lambda_b * lambda_b * diff;
    }
    a.project_ball();
    b.project_ball();

    // Emotional zone: convergence gated by the sign product, so
    // opposite-valence pairs do not converge.
    for (xa, xb) in a.emotional_mut().iter_mut().zip(b.emotional_mut().iter_mut()) {
        let resonance = *xa * *xb;
        let (va, vb) = (*xa, *xb);
        *xa += rate * EMOTIONAL_STEP * (vb - va) * resonance;
        *xb += rate * EMOTIONAL_STEP * (va - vb) * resonance;
    }

    a.normalize();
    b.normalize();
    a.project_ball();
    b.project_ball();
}

/// Borrow two distinct nodes mutably out of the store.
pub(crate) fn pair_mut(nodes: &mut [NodeVector], a: usize, b: usize) -> (&mut NodeVector, &mut NodeVector) {
    debug_assert_ne!(a, b);
    if a < b {
        let (left, right) = nodes.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = nodes.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

impl LearningEngine {
    /// Hebbian sweep over the whole graph.
    ///
    /// For every node above the activation threshold and every live outgoing
    /// edge whose target is also above threshold, apply a pairwise update
    /// scaled by the activation product, and strengthen the edge weight by
    /// the same amount (clamped into the representable range).
    ///
    /// Activations are snapshotted first so the sweep sees one consistent
    /// tick regardless of update order.
    pub fn batch_update(&self, nodes: &mut [NodeVector], graph: &mut CsrGraph, gain: f32) {
        let activations: Vec<f32> = nodes.iter().map(|n| n.activation()).collect();

        for src in 0..nodes.len() {
            let act_src = activations[src];
            if act_src <= self.activation_threshold {
                continue;
            }
            for e in graph.row_range(src as u32) {
                if graph.flags_at(e) & crate::graph::EDGE_TEMPORARY != 0 {
                    continue; // soft-pruned
                }
                let dst = graph.target_at(e) as usize;
                if dst == src || dst >= nodes.len() {
                    continue;
                }
                let act_dst = activations[dst];
                if act_dst <= self.activation_threshold {
                    continue;
                }

                let step = act_src * act_dst * self.base_rate * gain;
                let (va, vb) = pair_mut(nodes, src, dst);
                pairwise_update(va, vb, step);
                graph.set_weight_at(e, graph.weight_at(e) + step);
            }
        }
    }
}

fn zone_distance(a: &NodeVector, b: &NodeVector, range: std::ops::Range<usize>) -> f32 {
    a.zone(range.clone())
        .iter()
        .zip(b.zone(range).iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

/// Euclidean distance between two semantic zones.
pub fn semantic_distance(a: &NodeVector, b: &NodeVector) -> f32 {
    zone_distance(a, b, zone::SEMANTIC)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::vector::identifier_hash;
    use proptest::prelude::*;

    fn node(name: &str) -> NodeVector {
        NodeVector::seeded(identifier_hash(name), 0)
    }

    /// Semantic pull without the trailing renormalization, to observe the
    /// raw contraction.
    fn raw_semantic_after_update(rate: f32) -> (f32, f32) {
        let mut a = node("a");
        let mut b = node("b");
        let before = semantic_distance(&a, &b);
        for (xa, xb) in a.semantic_mut().iter_mut().zip(b.semantic_mut().iter_mut()) {
            let g = rate * SEMANTIC_STEP * (*xb - *xa);
            *xa += g;
            *xb -= g;
        }
        (before, semantic_distance(&a, &b))
    }

    #[test]
    fn test_semantic_distance_strictly_decreases() {
        let (before, after) = raw_semantic_after_update(0.5);
        assert!(after < before, "expected contraction: {after} >= {before}");
    }

    #[test]
    fn test_pairwise_preserves_unit_norm() {
        let mut a = node("left");
        let mut b = node("right");
        pairwise_update(&mut a, &mut b, 0.3);
        assert!((a.norm() - 1.0).abs() < 1e-4);
        assert!((b.norm() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_ball_invariant_survives_aggressive_updates() {
        let mut a = node("near");
        let mut b = node("far");
        for _ in 0..200 {
            pairwise_update(&mut a, &mut b, 1.0);
        }
        assert!(a.ball_radius() <= crate::model::BALL_RADIUS + 1e-4);
        assert!(b.ball_radius() <= crate::model::BALL_RADIUS + 1e-4);
    }

    #[test]
    fn test_zero_rate_is_identity_up_to_renorm() {
        let mut a = node("x");
        let mut b = node("y");
        let (a0, b0) = (a.clone(), b.clone());
        pairwise_update(&mut a, &mut b, 0.0);
        // seeded vectors are already unit norm, so nothing should move
        for (x, y) in a.components().iter().zip(a0.components().iter()) {
            assert!((x - y).abs() < 1e-5);
        }
        for (x, y) in b.components().iter().zip(b0.components().iter()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_batch_update_strengthens_coactive_edge() {
        let mut nodes = vec![node("a"), node("b"), node("c")];
        nodes[0].set_activation(0.9);
        nodes[1].set_activation(0.7);
        // c stays silent; its edge must not move
        let mut graph = CsrGraph::with_nodes(3);
        graph.upsert(0, 1, 0.5, 0).unwrap();
        graph.upsert(0, 2, 0.5, 0).unwrap();

        let engine = LearningEngine::default();
        engine.batch_update(&mut nodes, &mut graph, 1.0);

        let ab = graph.weight(0, 1).unwrap();
        let ac = graph.weight(0, 2).unwrap();
        assert!(ab > 0.5);
        assert!(ab <= 0.5 + 0.9 * 0.7 * engine.base_rate + 1e-6);
        assert_eq!(ac, 0.5);
    }

    #[test]
    fn test_batch_update_skips_soft_pruned_edges() {
        use crate::graph::EDGE_TEMPORARY;
        let mut nodes = vec![node("a"), node("b")];
        nodes[0].set_activation(0.9);
        nodes[1].set_activation(0.9);
        let mut graph = CsrGraph::with_nodes(2);
        graph.upsert(0, 1, 0.5, 0).unwrap();
        graph.set_flags_at(0, EDGE_TEMPORARY);

        LearningEngine::default().batch_update(&mut nodes, &mut graph, 1.0);
        assert_eq!(graph.weight(0, 1), Some(0.5));
    }

    #[test]
    fn test_pair_mut_both_orders() {
        let mut nodes = vec![node("a"), node("b"), node("c")];
        let (x, y) = pair_mut(&mut nodes, 2, 0);
        x.set_activation(0.3);
        y.set_activation(0.6);
        assert_eq!(nodes[2].activation(), 0.3);
        assert_eq!(nodes[0].activation(), 0.6);
    }

    proptest! {
        #[test]
        fn prop_pairwise_keeps_invariants(
            seed_a in 0u32..10_000,
            seed_b in 0u32..10_000,
            rate in 0.0f32..1.0,
        ) {
            let mut a = NodeVector::seeded(seed_a, 0);
            let mut b = NodeVector::seeded(seed_b, 0);
            pairwise_update(&mut a, &mut b, rate);
            prop_assert!(a.ball_radius() <= crate::model::BALL_RADIUS + 1e-4);
            prop_assert!(b.ball_radius() <= crate::model::BALL_RADIUS + 1e-4);
            prop_assert!((a.norm() - 1.0).abs() < 1e-3);
            prop_assert!((b.norm() - 1.0).abs() < 1e-3);
        }
    }
}
