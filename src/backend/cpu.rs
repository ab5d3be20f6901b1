//! Portable scalar reference backend.
//!
//! Correctness baseline for every other backend: naive triple-loop GEMM,
//! row-major buffers, synchronous "async" ops that complete eagerly.

use crate::backend::{DType, Device, TensorBackend};
use crate::graph::CsrGraph;
use crate::{Error, Result};

/// Host-resident row-major buffer.
///
/// The dtype tag records the requested storage width; computation is f32.
#[derive(Debug, Clone)]
pub struct CpuTensor {
    dtype: DType,
    dims: Vec<usize>,
    data: Vec<f32>,
}

impl CpuTensor {
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    fn rows_cols(&self) -> Result<(usize, usize)> {
        match self.dims.as_slice() {
            &[r, c] => Ok((r, c)),
            other => Err(Error::Backend(format!("expected 2-D tensor, got {} dims", other.len()))),
        }
    }
}

/// Completed-op marker. CPU ops run eagerly, so waiting is free.
#[derive(Debug, Clone, Copy)]
pub struct CpuOp;

#[derive(Debug, Clone, Copy, Default)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        Self
    }
}

impl TensorBackend for CpuBackend {
    type Buf = CpuTensor;
    type Op = CpuOp;

    fn device(&self) -> Device {
        Device::Cpu
    }

    fn alloc(&self, dtype: DType, dims: &[usize]) -> Result<CpuTensor> {
        if dims.is_empty() || dims.iter().any(|&d| d == 0) {
            return Err(Error::AllocationFailure(format!("degenerate tensor shape {dims:?}")));
        }
        let elems: usize = dims.iter().product();
        Ok(CpuTensor { dtype, dims: dims.to_vec(), data: vec![0.0; elems] })
    }

    fn fill(&self, buf: &mut CpuTensor, value: f32) -> Result<()> {
        buf.data.fill(value);
        Ok(())
    }

    fn copy(&self, dst: &mut CpuTensor, src: &CpuTensor) -> Result<()> {
        if dst.data.len() != src.data.len() {
            return Err(Error::Backend(format!(
                "copy shape mismatch: {:?} vs {:?}",
                dst.dims, src.dims
            )));
        }
        dst.data.copy_from_slice(&src.data);
        Ok(())
    }

    fn write(&self, buf: &mut CpuTensor, host: &[f32]) -> Result<()> {
        if buf.data.len() != host.len() {
            return Err(Error::Backend(format!(
                "write length mismatch: buffer {} vs host {}",
                buf.data.len(),
                host.len()
            )));
        }
        buf.data.copy_from_slice(host);
        Ok(())
    }

    fn read(&self, buf: &CpuTensor) -> Result<Vec<f32>> {
        Ok(buf.data.clone())
    }

    fn gemm(
        &self,
        a: &CpuTensor,
        b: &CpuTensor,
        c: &mut CpuTensor,
        trans_a: bool,
        trans_b: bool,
        alpha: f32,
        beta: f32,
    ) -> Result<()> {
        let (ar, ac) = a.rows_cols()?;
        let (br, bc) = b.rows_cols()?;
        let (cr, cc) = c.rows_cols()?;
        let (m, k) = if trans_a { (ac, ar) } else { (ar, ac) };
        let (kb, n) = if trans_b { (bc, br) } else { (br, bc) };
        if k != kb || m != cr || n != cc {
            return Err(Error::Backend(format!(
                "gemm shape mismatch: ({m}x{k}) @ ({kb}x{n}) -> ({cr}x{cc})"
            )));
        }

        let at = |i: usize, l: usize| if trans_a { a.data[l * ac + i] } else { a.data[i * ac + l] };
        let bt = |l: usize, j: usize| if trans_b { b.data[j * bc + l] } else { b.data[l * bc + j] };

        for i in 0..m {
            for j in 0..n {
                let mut acc = 0.0f32;
                for l in 0..k {
                    acc += at(i, l) * bt(l, j);
                }
                c.data[i * cc + j] = alpha * acc + beta * c.data[i * cc + j];
            }
        }
        Ok(())
    }

    fn reduce_sum(&self, a: &CpuTensor, axis: usize) -> Result<CpuTensor> {
        let (rows, cols) = a.rows_cols()?;
        match axis {
            0 => {
                let mut out = self.alloc(a.dtype, &[1, cols])?;
                for i in 0..rows {
                    for j in 0..cols {
                        out.data[j] += a.data[i * cols + j];
                    }
                }
                Ok(out)
            }
            1 => {
                let mut out = self.alloc(a.dtype, &[rows, 1])?;
                for i in 0..rows {
                    out.data[i] = a.data[i * cols..(i + 1) * cols].iter().sum();
                }
                Ok(out)
            }
            other => Err(Error::Backend(format!("reduce axis {other} out of range"))),
        }
    }

    fn spmm(&self, graph: &CsrGraph, dense: &CpuTensor, out: &mut CpuTensor) -> Result<()> {
        let (dr, dc) = dense.rows_cols()?;
        let (or, oc) = out.rows_cols()?;
        let n = graph.node_count();
        if dr != n || or != n || dc != oc {
            return Err(Error::Backend(format!(
                "spmm shape mismatch: graph {n} nodes, dense {dr}x{dc}, out {or}x{oc}"
            )));
        }

        out.data.fill(0.0);
        for row in 0..n {
            for e in graph.row_range(row as u32) {
                let w = graph.effective_weight_at(e);
                if w == 0.0 {
                    continue;
                }
                let col = graph.target_at(e) as usize;
                for d in 0..dc {
                    out.data[row * dc + d] += w * dense.data[col * dc + d];
                }
            }
        }
        Ok(())
    }

    fn enqueue_gemm(&self, a: &CpuTensor, b: &CpuTensor, c: &mut CpuTensor) -> Result<CpuOp> {
        // Eager execution: the returned handle is already complete.
        self.gemm(a, b, c, false, false, 1.0, 0.0)?;
        Ok(CpuOp)
    }

    fn wait(&self, _op: CpuOp) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
