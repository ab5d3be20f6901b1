//! CUDA dispatch stub.
//!
//! Compiled in behind the `cuda` feature so downstream code can select the
//! device without conditional compilation at every call site. Until a real
//! driver binding lands, every operation reports `BackendUnavailable`.

use crate::backend::{DType, Device, TensorBackend};
use crate::graph::CsrGraph;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct CudaBackend;

impl CudaBackend {
    pub fn new() -> Self {
        Self
    }

    fn unavailable<T>() -> Result<T> {
        Err(Error::BackendUnavailable(Device::Cuda))
    }
}

impl TensorBackend for CudaBackend {
    type Buf = ();
    type Op = ();

    fn device(&self) -> Device {
        Device::Cuda
    }

    fn alloc(&self, _dtype: DType, _dims: &[usize]) -> Result<()> {
        Self::unavailable()
    }

    fn fill(&self, _buf: &mut (), _value: f32) -> Result<()> {
        Self::unavailable()
    }

    fn copy(&self, _dst: &mut (), _src: &()) -> Result<()> {
        Self::unavailable()
    }

    fn write(&self, _buf: &mut (), _host: &[f32]) -> Result<()> {
        Self::unavailable()
    }

    fn read(&self, _buf: &()) -> Result<Vec<f32>> {
        Self::unavailable()
    }

    fn gemm(
        &self,
        _a: &(),
        _b: &(),
        _c: &mut (),
        _trans_a: bool,
        _trans_b: bool,
        _alpha: f32,
        _beta: f32,
    ) -> Result<()> {
        Self::unavailable()
    }

    fn reduce_sum(&self, _a: &(), _axis: usize) -> Result<()> {
        Self::unavailable()
    }

    fn spmm(&self, _graph: &CsrGraph, _dense: &(), _out: &mut ()) -> Result<()> {
        Self::unavailable()
    }

    fn enqueue_gemm(&self, _a: &(), _b: &(), _c: &mut ()) -> Result<()> {
        Self::unavailable()
    }

    fn wait(&self, _op: ()) -> Result<()> {
        Self::unavailable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_op_reports_unavailable() {
        let be = CudaBackend::new();
        assert!(matches!(
            be.alloc(DType::F32, &[2, 2]),
            Err(Error::BackendUnavailable(Device::Cuda))
        ));
        assert!(be.read(&()).is_err());
        assert!(be.wait(()).is_err());
    }
}
