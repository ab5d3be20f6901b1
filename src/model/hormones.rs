//! Global scalar modulators.
//!
//! Raw fields are fed by external signals via `Topology::sensor_input`;
//! derived fields are recomputed once per tick with fixed smoothing
//! formulas and clamped to [0,1]. The context feeds back multiplicatively
//! into the learning rate and two vector zones.

use serde::{Deserialize, Serialize};

fn clamp01(x: f32) -> f32 {
    x.clamp(0.0, 1.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HormonalContext {
    // Raw inputs, normalized to [0,1] by the caller.
    pub drive: f32,
    pub temperature: f32,
    pub light: f32,
    pub motion: f32,
    pub sound: f32,
    // Derived each tick.
    pub stress: f32,
    pub curiosity: f32,
    pub satisfaction: f32,
}

impl Default for HormonalContext {
    fn default() -> Self {
        Self {
            drive: 1.0,
            temperature: 0.5,
            light: 0.5,
            motion: 0.0,
            sound: 0.0,
            stress: 0.0,
            curiosity: 0.8,
            satisfaction: 0.5,
        }
    }
}

impl HormonalContext {
    /// Recompute derived hormones. Stress decays toward the drive deficit,
    /// curiosity is suppressed by stress and fed by light, satisfaction
    /// tracks motion around its midpoint.
    pub fn refresh(&mut self) {
        self.stress = clamp01(self.stress * 0.95 + (1.0 - self.drive) * 0.05);
        self.curiosity = clamp01(0.8 * (1.0 - self.stress) * (0.5 + self.light));
        self.satisfaction = clamp01(0.5 + (self.motion - 0.5) * 0.5);
    }

    /// Multiplicative gain applied to the base learning rate.
    pub fn learning_gain(&self) -> f32 {
        (0.5 + self.curiosity * 0.5) * (1.0 - self.stress * 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_stays_in_unit_interval() {
        let mut h = HormonalContext { drive: 0.0, light: 1.0, motion: 1.0, ..Default::default() };
        for _ in 0..1000 {
            h.refresh();
            for v in [h.stress, h.curiosity, h.satisfaction] {
                assert!((0.0..=1.0).contains(&v), "hormone out of range: {v}");
            }
        }
    }

    #[test]
    fn test_stress_builds_under_drive_deficit() {
        let mut h = HormonalContext { drive: 0.0, ..Default::default() };
        let before = h.stress;
        h.refresh();
        assert!(h.stress > before);
    }

    #[test]
    fn test_stress_decays_at_full_drive() {
        let mut h = HormonalContext { drive: 1.0, stress: 0.8, ..Default::default() };
        h.refresh();
        assert!(h.stress < 0.8);
    }

    #[test]
    fn test_learning_gain_neutral_default() {
        let h = HormonalContext::default();
        // curiosity 0.8, stress 0 => gain = 0.9
        assert!((h.learning_gain() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_stress_suppresses_gain() {
        let relaxed = HormonalContext::default();
        let stressed = HormonalContext { stress: 1.0, ..Default::default() };
        assert!(stressed.learning_gain() < relaxed.learning_gain());
    }
}
