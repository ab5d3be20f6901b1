//! Scheduled activation interpolation.
//!
//! A trajectory moves one node's activation toward a target value over a
//! fixed duration. Completed trajectories are dropped by the scheduler;
//! the final tick lands exactly on the target.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Curve {
    Linear,
    Exponential,
    Sigmoid,
}

impl Curve {
    /// Map raw progress in [0,1] to shaped progress in [0,1].
    /// Exponential and sigmoid are normalized so shape(0)=0 and shape(1)=1.
    fn shape(self, p: f32) -> f32 {
        match self {
            Curve::Linear => p,
            Curve::Exponential => {
                let span = 1.0 - (-5.0f32).exp();
                (1.0 - (-5.0 * p).exp()) / span
            }
            Curve::Sigmoid => {
                let sig = |x: f32| 1.0 / (1.0 + (-x).exp());
                let lo = sig(-6.0);
                let hi = sig(6.0);
                (sig(12.0 * (p - 0.5)) - lo) / (hi - lo)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trajectory {
    pub node: u32,
    start: f32,
    pub target: f32,
    duration: f32,
    elapsed: f32,
    curve: Curve,
}

impl Trajectory {
    pub fn new(node: u32, start: f32, target: f32, duration: f32, curve: Curve) -> Self {
        Self {
            node,
            start,
            target,
            duration: duration.max(f32::EPSILON),
            elapsed: 0.0,
            curve,
        }
    }

    /// Advance by `dt` and return the interpolated activation value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed += dt;
        if self.complete() {
            return self.target;
        }
        let progress = (self.elapsed / self.duration).clamp(0.0, 1.0);
        self.start + (self.target - self.start) * self.curve.shape(progress)
    }

    pub fn complete(&self) -> bool {
        self.elapsed >= self.duration
    }
}
