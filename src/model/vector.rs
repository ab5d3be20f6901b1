//! Fixed-layout embedding vector — the memory unit of the topology.
//!
//! Every node is one 256-dimensional vector partitioned into zones:
//!
//! | Zone | Dims | Purpose |
//! |------|------|---------|
//! | identity | 0..4 | hash-derived unit quaternion |
//! | hyperbolic | 4..20 | Poincaré-ball position (norm < 0.99) |
//! | semantic | 20..84 | learned embedding |
//! | activation | 84..148 | activation history, slot 0 = current |
//! | connections | 148..212 | connection-weight cache |
//! | emotional | 212..244 | emotional field |
//! | metadata | 244..256 | creation cycle, degree, active flag |
//!
//! Two invariants hold after every learning mutation: the hyperbolic
//! sub-vector stays inside the open ball (radius ≤ [`BALL_RADIUS`]),
//! and the full vector is renormalized to unit L2.

use std::f32::consts::PI;
use std::ops::Range;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Total vector width.
pub const NODE_DIM: usize = 256;

/// Open-ball radius bound for the hyperbolic zone.
pub const BALL_RADIUS: f32 = 0.99;

const GOLDEN_RATIO: f32 = 1.618_034;

/// Zone boundaries within a [`NodeVector`].
pub mod zone {
    use std::ops::Range;

    pub const IDENTITY: Range<usize> = 0..4;
    pub const HYPERBOLIC: Range<usize> = 4..20;
    pub const SEMANTIC: Range<usize> = 20..84;
    pub const ACTIVATION: Range<usize> = 84..148;
    pub const CONNECTIONS: Range<usize> = 148..212;
    pub const EMOTIONAL: Range<usize> = 212..244;
    pub const METADATA: Range<usize> = 244..256;
}

// Metadata slots (offsets into zone::METADATA).
const META_CREATED: usize = 0;
const META_DEGREE: usize = 1;
const META_ACTIVE: usize = 2;

/// djb2 over the identifier bytes. Deterministic node seeding depends on it.
pub fn identifier_hash(identifier: &str) -> u32 {
    let mut hash: u32 = 5381;
    for byte in identifier.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(byte as u32);
    }
    hash
}

/// One node's full embedding vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeVector {
    #[serde(with = "component_array")]
    components: [f32; NODE_DIM],
}

impl NodeVector {
    /// All-zero vector. Mostly useful in tests.
    pub fn zeroed() -> Self {
        Self { components: [0.0; NODE_DIM] }
    }

    /// Deterministically seed a fresh vector from an identifier hash.
    ///
    /// Identity: four hash-derived values normalized into a unit quaternion.
    /// Hyperbolic: spiral parametrization — golden-ratio angular stepping,
    /// radius decaying geometrically per coordinate triplet, which spreads
    /// fresh nodes roughly evenly through the ball.
    /// Semantic: Box–Muller samples scaled by √(2/dim) so the zone starts
    /// with stable variance.
    /// Activation, connection and emotional zones start at zero.
    pub fn seeded(hash: u32, created_cycle: u64) -> Self {
        let mut v = Self::zeroed();
        let mut rng = SmallRng::seed_from_u64(hash as u64);

        // Identity quaternion.
        {
            let q = &mut v.components[zone::IDENTITY];
            for (i, slot) in q.iter_mut().enumerate() {
                let bits = hash.rotate_right(8 * i as u32);
                *slot = (bits % 2000) as f32 / 1000.0 - 1.0;
            }
            let norm = q.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm > 0.0 {
                q.iter_mut().for_each(|x| *x /= norm);
            } else {
                q[0] = 1.0;
            }
        }

        // Hyperbolic spiral placement.
        {
            let mut r = (hash % 1000) as f32 / 1000.0 * 0.9;
            let mut theta = (hash % 360) as f32 / 180.0 * PI;
            let mut phi = ((hash >> 16) % 180) as f32 / 180.0 * PI;

            let ball = &mut v.components[zone::HYPERBOLIC];
            let mut i = 0;
            while i + 3 <= ball.len() {
                ball[i] = r * phi.sin() * theta.cos();
                ball[i + 1] = r * phi.sin() * theta.sin();
                ball[i + 2] = r * phi.cos();
                r *= 0.95;
                theta += GOLDEN_RATIO;
                phi += PI / 8.0;
                i += 3;
            }
        }

        // Semantic embedding.
        {
            let sem = &mut v.components[zone::SEMANTIC];
            let scale = (2.0 / sem.len() as f32).sqrt();
            for slot in sem.iter_mut() {
                let u1: f32 = rng.r#gen::<f32>().max(f32::MIN_POSITIVE);
                let u2: f32 = rng.r#gen();
                let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
                *slot = z * scale;
            }
        }

        // Metadata. Creation cycle is squashed into [0,1) so late-woven
        // nodes do not dominate the norm.
        let meta = zone::METADATA.start;
        let c = created_cycle as f32;
        v.components[meta + META_CREATED] = c / (c + 1.0);
        v.components[meta + META_DEGREE] = 0.0;
        v.components[meta + META_ACTIVE] = 1.0;

        v.project_ball();
        v.normalize();
        v
    }

    // ========================================================================
    // Zone access
    // ========================================================================

    pub fn components(&self) -> &[f32; NODE_DIM] {
        &self.components
    }

    pub fn zone(&self, range: Range<usize>) -> &[f32] {
        &self.components[range]
    }

    pub fn semantic(&self) -> &[f32] {
        &self.components[zone::SEMANTIC]
    }

    pub fn semantic_mut(&mut self) -> &mut [f32] {
        &mut self.components[zone::SEMANTIC]
    }

    pub fn hyperbolic(&self) -> &[f32] {
        &self.components[zone::HYPERBOLIC]
    }

    pub fn hyperbolic_mut(&mut self) -> &mut [f32] {
        &mut self.components[zone::HYPERBOLIC]
    }

    pub fn emotional(&self) -> &[f32] {
        &self.components[zone::EMOTIONAL]
    }

    pub fn emotional_mut(&mut self) -> &mut [f32] {
        &mut self.components[zone::EMOTIONAL]
    }

    pub fn connections_mut(&mut self) -> &mut [f32] {
        &mut self.components[zone::CONNECTIONS]
    }

    // ========================================================================
    // Activation
    // ========================================================================

    /// Current activation (slot 0 of the activation history).
    pub fn activation(&self) -> f32 {
        self.components[zone::ACTIVATION.start]
    }

    /// Overwrite the current activation without disturbing history.
    pub fn set_activation(&mut self, value: f32) {
        self.components[zone::ACTIVATION.start] = value.clamp(0.0, 1.0);
    }

    /// Push a new activation, shifting the history window by one slot.
    pub fn push_activation(&mut self, value: f32) {
        let Range { start, end } = zone::ACTIVATION;
        self.components.copy_within(start..end - 1, start + 1);
        self.components[start] = value.clamp(0.0, 1.0);
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn degree(&self) -> f32 {
        self.components[zone::METADATA.start + META_DEGREE]
    }

    pub fn bump_degree(&mut self) {
        self.components[zone::METADATA.start + META_DEGREE] += 1.0;
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    pub fn norm(&self) -> f32 {
        self.components.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Renormalize the full vector to unit L2. Zero vectors are left alone.
    pub fn normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            self.components.iter_mut().for_each(|x| *x /= norm);
        }
    }

    /// Radius of the hyperbolic sub-vector.
    pub fn ball_radius(&self) -> f32 {
        self.hyperbolic().iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Uniformly rescale the hyperbolic zone back inside the open ball
    /// if its radius reached [`BALL_RADIUS`].
    pub fn project_ball(&mut self) {
        let radius = self.ball_radius();
        if radius >= BALL_RADIUS {
            let scale = BALL_RADIUS / radius;
            self.hyperbolic_mut().iter_mut().for_each(|x| *x *= scale);
        }
    }
}

/// Cosine similarity over the full vectors. 0 when either norm is 0.
pub fn cosine_similarity(a: &NodeVector, b: &NodeVector) -> f32 {
    let mut dot = 0.0;
    let mut na = 0.0;
    let mut nb = 0.0;
    for (x, y) in a.components.iter().zip(b.components.iter()) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na > 0.0 && nb > 0.0 {
        dot / (na.sqrt() * nb.sqrt())
    } else {
        0.0
    }
}

/// serde helpers for the fixed-size component array.
mod component_array {
    use super::NODE_DIM;
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[f32; NODE_DIM], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(v.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[f32; NODE_DIM], D::Error> {
        let v: Vec<f32> = Vec::deserialize(d)?;
        v.try_into()
            .map_err(|bad: Vec<f32>| D::Error::invalid_length(bad.len(), &"256 components"))
    }
}

// ============================================================================
// Tests
// ============================================================================
