//! # Tensor backend contract
//!
//! This is THE contract between the kernel and any linear-algebra engine.
//! A backend owns device-tagged buffers and executes the dense/sparse
//! primitives the tick loop needs.
//!
//! | Backend | Feature | Description |
//! |---------|---------|-------------|
//! | `CpuBackend` | (default) | Portable scalar reference, always present |
//! | `CudaBackend` | `cuda` | Dispatch stub — reports `BackendUnavailable` |
//! | `MetalBackend` | `metal` | Dispatch stub — reports `BackendUnavailable` |
//!
//! `BackendUnavailable` is terminal only for the failing call: it never
//! corrupts topology state, and callers are expected to retry on the CPU
//! backend.

pub mod cpu;
#[cfg(feature = "cuda")]
pub mod cuda;
#[cfg(feature = "metal")]
pub mod metal;

pub use cpu::{CpuBackend, CpuTensor};

use serde::{Deserialize, Serialize};

use crate::graph::CsrGraph;
use crate::Result;

/// Execution device tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    Cpu,
    Cuda,
    Metal,
}

/// Requested element storage width.
///
/// A width is a memory/performance tradeoff, not a correctness knob:
/// the CPU reference computes in f32 regardless of the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    F16,
    F32,
    F64,
}

/// The universal linear-algebra contract.
///
/// Every method that touches a device may fail with `BackendUnavailable`;
/// callers treat that as a normal, recoverable condition. No ordering is
/// implied between independent op handles beyond an explicit [`wait`]
/// (`TensorBackend::wait`).
pub trait TensorBackend: Send + Sync {
    /// Device- and dtype-tagged buffer handle.
    type Buf;
    /// Handle for an in-flight asynchronous op.
    type Op;

    fn device(&self) -> Device;

    /// Allocate a zero-filled buffer.
    fn alloc(&self, dtype: DType, dims: &[usize]) -> Result<Self::Buf>;

    fn fill(&self, buf: &mut Self::Buf, value: f32) -> Result<()>;

    fn copy(&self, dst: &mut Self::Buf, src: &Self::Buf) -> Result<()>;

    /// Upload host data into a buffer (length must match).
    fn write(&self, buf: &mut Self::Buf, host: &[f32]) -> Result<()>;

    /// Download buffer contents to the host.
    fn read(&self, buf: &Self::Buf) -> Result<Vec<f32>>;

    /// Dense GEMM: `C = alpha * op(A) @ op(B) + beta * C`.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        a: &Self::Buf,
        b: &Self::Buf,
        c: &mut Self::Buf,
        trans_a: bool,
        trans_b: bool,
        alpha: f32,
        beta: f32,
    ) -> Result<()>;

    /// Reduction-sum along one axis of a 2-D buffer.
    fn reduce_sum(&self, a: &Self::Buf, axis: usize) -> Result<Self::Buf>;

    /// Sparse(CSR) × dense product using the graph's effective weights
    /// (soft-pruned edges contribute 0).
    fn spmm(&self, graph: &CsrGraph, dense: &Self::Buf, out: &mut Self::Buf) -> Result<()>;

    /// Enqueue a GEMM and return a handle that can overlap with graph
    /// mutation on the caller's side.
    fn enqueue_gemm(&self, a: &Self::Buf, b: &Self::Buf, c: &mut Self::Buf) -> Result<Self::Op>;

    /// Block until the op behind the handle has completed.
    fn wait(&self, op: Self::Op) -> Result<()>;
}
