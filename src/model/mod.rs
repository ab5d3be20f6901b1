//! Data model: the DTOs that cross every boundary in the kernel.

pub mod hormones;
pub mod hyperedge;
pub mod trajectory;
pub mod vector;

pub use hormones::HormonalContext;
pub use hyperedge::{Hyperedge, Processor};
pub use trajectory::{Curve, Trajectory};
pub use vector::{
    cosine_similarity, identifier_hash, zone, NodeVector, BALL_RADIUS, NODE_DIM,
};
