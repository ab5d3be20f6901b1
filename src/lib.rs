//! # tapestry — Associative-Memory Hypergraph Kernel
//!
//! A mutable hypergraph of fixed-width embedding vectors that learns by
//! co-activation. Nodes are 256-dimensional zoned vectors; directed
//! weighted edges live in a compressed sparse row layout; n-ary relations
//! carry their own aggregation logic and feed back into pairwise learning.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `TensorBackend` is the contract between the tick
//!    scheduler and any linear-algebra engine
//! 2. **One owned root**: a `Topology` is explicitly owned and passed
//!    `&mut` into every operation — no global state
//! 3. **Fail-fast construction, fail-soft evolution**: structural errors
//!    surface synchronously and leave state unchanged; per-cycle numeric
//!    edge cases resolve to a neutral value instead of erroring
//! 4. **Deterministic seeding**: weaving the same identifier always
//!    produces the same vector
//!
//! ## Quick Start
//!
//! ```rust
//! use tapestry::{Kernel, KernelConfig, Topology};
//!
//! # fn example() -> tapestry::Result<()> {
//! let mut topology = Topology::default();
//! let fire = topology.weave("fire")?;
//! let smoke = topology.weave("smoke")?;
//! topology.create_bidirectional(fire, smoke, 0.5)?;
//!
//! topology.set_activation(fire, 0.9)?;
//! topology.set_activation(smoke, 0.7)?;
//!
//! let kernel = Kernel::new(KernelConfig::default());
//! kernel.run(&mut topology, 100)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Tensor Backends
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | Cpu | (default) | Portable scalar reference, always present |
//! | Cuda | `cuda` | Dispatch stub, reports `BackendUnavailable` |
//! | Metal | `metal` | Dispatch stub, reports `BackendUnavailable` |

// ============================================================================
// Modules
// ============================================================================

pub mod backend;
pub mod experience;
pub mod graph;
pub mod kernel;
pub mod learning;
pub mod model;
pub mod snapshot;
pub mod topology;

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    cosine_similarity, identifier_hash, zone, Curve, HormonalContext, Hyperedge, NodeVector,
    Processor, Trajectory, BALL_RADIUS, NODE_DIM,
};

// ============================================================================
// Re-exports: Graph & learning
// ============================================================================

pub use graph::{CsrBuilder, CsrGraph};
pub use learning::{pairwise_update, LearningEngine};

// ============================================================================
// Re-exports: Topology & kernel
// ============================================================================

pub use kernel::{Command, CommandSender, Kernel, KernelConfig};
pub use topology::{Topology, TopologyConfig};

// ============================================================================
// Re-exports: Backends & persistence
// ============================================================================

pub use backend::{CpuBackend, DType, Device, TensorBackend};
pub use experience::{Experience, ExperienceLog};
pub use snapshot::{load_json, save_json, TopologySnapshot, SNAPSHOT_VERSION};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{kind} capacity exceeded (limit {limit})")]
    CapacityExceeded { kind: &'static str, limit: usize },

    #[error("invalid {kind} reference: {id}")]
    InvalidReference { kind: &'static str, id: u32 },

    #[error("backend unavailable on device {0:?}")]
    BackendUnavailable(backend::Device),

    #[error("allocation failure: {0}")]
    AllocationFailure(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("snapshot version {found} unsupported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
