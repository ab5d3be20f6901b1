//! N-ary relations over node sets, each with its own logic processor.
//!
//! A hyperedge is modeled Levi-style: the relation itself carries state,
//! aggregates participant activations once per tick, and feeds strong
//! states back into pairwise edge learning.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Aggregation policy of a hyperedge.
///
/// Closed set — `Xor`, `Inhibit`, `Sequence` and `Custom` are declared
/// extension points and currently fall back to plain averaging.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Processor {
    /// Average activation, but only while every participant is active.
    And,
    /// Max activation while any participant is active.
    Or,
    Xor,
    /// Average activation once at least `required` participants are active.
    Threshold { required: u32 },
    /// Average amplified by the active count, capped at 1.
    Resonance,
    Inhibit,
    Sequence,
    Custom,
}

impl Processor {
    /// Resonance idles at the neutral midpoint; everything else at 0.
    pub fn initial_state(self) -> f32 {
        match self {
            Processor::Resonance => 0.5,
            _ => 0.0,
        }
    }
}

/// Smoothing constant: state tracks its input with a ~10-tick time constant.
pub const STATE_SMOOTHING: f32 = 0.9;

/// One n-ary relation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hyperedge {
    pub participants: SmallVec<[u32; 8]>,
    pub processor: Processor,
    /// Smoothed processor output.
    pub state: f32,
    /// Ticks in which the smoothed state crossed the activation threshold.
    pub usage: u32,
}

impl Hyperedge {
    pub fn new(participants: SmallVec<[u32; 8]>, processor: Processor) -> Self {
        Self {
            participants,
            processor,
            state: processor.initial_state(),
            usage: 0,
        }
    }

    /// Apply the processor policy to the given activation snapshot.
    ///
    /// Empty participant sets and out-of-range ids resolve to 0 rather
    /// than erroring — per-cycle numerics fail soft.
    pub fn evaluate(&self, activations: &[f32], threshold: f32) -> f32 {
        if self.participants.is_empty() {
            return 0.0;
        }

        let mut sum = 0.0f32;
        let mut max = 0.0f32;
        let mut active = 0u32;
        for &id in &self.participants {
            let a = activations.get(id as usize).copied().unwrap_or(0.0);
            sum += a;
            max = max.max(a);
            if a > threshold {
                active += 1;
            }
        }
        let average = sum / self.participants.len() as f32;

        match self.processor {
            Processor::And => {
                if active as usize == self.participants.len() {
                    average
                } else {
                    0.0
                }
            }
            Processor::Or => {
                if active > 0 {
                    max
                } else {
                    0.0
                }
            }
            Processor::Threshold { required } => {
                if active >= required {
                    average
                } else {
                    0.0
                }
            }
            Processor::Resonance => (average * (1.0 + active as f32 * 0.1)).min(1.0),
            // Declared extension points: plain average until specialized.
            Processor::Xor | Processor::Inhibit | Processor::Sequence | Processor::Custom => {
                average
            }
        }
    }

    /// Fold a fresh evaluation into the smoothed state.
    pub fn smooth(&mut self, target: f32) {
        self.state = self.state * STATE_SMOOTHING + target * (1.0 - STATE_SMOOTHING);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    const THR: f32 = 0.1;

    fn edge(processor: Processor) -> Hyperedge {
        Hyperedge::new(smallvec![0, 1, 2], processor)
    }

    #[test]
    fn test_and_requires_all_active() {
        let e = edge(Processor::And);
        assert_eq!(e.evaluate(&[0.9, 0.8, 0.05], THR), 0.0);
        let avg = (0.9 + 0.8 + 0.7) / 3.0;
        assert!((e.evaluate(&[0.9, 0.8, 0.7], THR) - avg).abs() < 1e-6);
    }

    #[test]
    fn test_or_takes_max_when_any_active() {
        let e = edge(Processor::Or);
        assert_eq!(e.evaluate(&[0.0, 0.0, 0.0], THR), 0.0);
        assert!((e.evaluate(&[0.0, 0.6, 0.05], THR) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_threshold_counts_active_participants() {
        let e = edge(Processor::Threshold { required: 2 });
        assert_eq!(e.evaluate(&[0.9, 0.05, 0.05], THR), 0.0);
        assert!(e.evaluate(&[0.9, 0.5, 0.05], THR) > 0.0);
    }

    #[test]
    fn test_resonance_amplifies_and_caps() {
        let e = edge(Processor::Resonance);
        let out = e.evaluate(&[0.9, 0.9, 0.9], THR);
        assert!(out <= 1.0);
        assert!(out > 0.9); // amplified above the plain average
    }

    #[test]
    fn test_fallback_types_average() {
        for p in [Processor::Xor, Processor::Inhibit, Processor::Sequence, Processor::Custom] {
            let e = edge(p);
            let avg = (0.3 + 0.6 + 0.0) / 3.0;
            assert!((e.evaluate(&[0.3, 0.6, 0.0], THR) - avg).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_participants_fail_soft() {
        let e = Hyperedge::new(smallvec![], Processor::And);
        assert_eq!(e.evaluate(&[], THR), 0.0);
    }

    #[test]
    fn test_out_of_range_participant_reads_zero() {
        let e = Hyperedge::new(smallvec![0, 99], Processor::Or);
        assert!((e.evaluate(&[0.8], THR) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_smoothing_time_constant() {
        let mut e = edge(Processor::And);
        e.smooth(1.0);
        assert!((e.state - 0.1).abs() < 1e-6);
        e.smooth(0.0);
        assert!((e.state - 0.09).abs() < 1e-6);
    }

    #[test]
    fn test_initial_states() {
        assert_eq!(Processor::Resonance.initial_state(), 0.5);
        assert_eq!(Processor::And.initial_state(), 0.0);
        assert_eq!(Processor::Custom.initial_state(), 0.0);
    }
}
