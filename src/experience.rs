//! Fixed-capacity, append-only experience ring.
//!
//! Each entry captures which nodes were active, the sensory (hormonal)
//! snapshot at that moment, and an emotional valence. Once full, the
//! oldest entry is overwritten.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One recorded moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub timestamp: DateTime<Utc>,
    /// Node ids that were above the activation threshold, bounded.
    pub activated: SmallVec<[u32; 8]>,
    /// Raw sensory snapshot: drive, temperature, light, motion, sound.
    pub sensory: [f32; 5],
    pub valence: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceLog {
    entries: Vec<Experience>,
    capacity: usize,
    /// Next write position once the ring is full.
    head: usize,
    /// Total records ever written, including overwritten ones.
    total: u64,
}

impl ExperienceLog {
    pub fn new(capacity: usize) -> Self {
        Self { entries: Vec::new(), capacity: capacity.max(1), head: 0, total: 0 }
    }

    pub fn record(&mut self, experience: Experience) {
        if self.entries.len() < self.capacity {
            self.entries.push(experience);
        } else {
            self.entries[self.head] = experience;
            self.head = (self.head + 1) % self.capacity;
        }
        self.total += 1;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_recorded(&self) -> u64 {
        self.total
    }

    /// Most recent entry.
    pub fn latest(&self) -> Option<&Experience> {
        if self.entries.is_empty() {
            None
        } else if self.entries.len() < self.capacity {
            self.entries.last()
        } else {
            let last = (self.head + self.capacity - 1) % self.capacity;
            self.entries.get(last)
        }
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Experience> {
        let (wrapped, linear) = self.entries.split_at(self.head.min(self.entries.len()));
        linear.iter().chain(wrapped.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn exp(valence: f32) -> Experience {
        Experience {
            timestamp: Utc::now(),
            activated: smallvec![0],
            sensory: [1.0, 0.5, 0.5, 0.0, 0.0],
            valence,
        }
    }

    #[test]
    fn test_fills_to_capacity() {
        let mut log = ExperienceLog::new(4);
        for i in 0..4 {
            log.record(exp(i as f32));
        }
        assert_eq!(log.len(), 4);
        assert_eq!(log.latest().unwrap().valence, 3.0);
    }

    #[test]
    fn test_overwrites_oldest_when_full() {
        let mut log = ExperienceLog::new(3);
        for i in 0..5 {
            log.record(exp(i as f32));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.total_recorded(), 5);
        let valences: Vec<f32> = log.iter().map(|e| e.valence).collect();
        assert_eq!(valences, vec![2.0, 3.0, 4.0]);
        assert_eq!(log.latest().unwrap().valence, 4.0);
    }

    #[test]
    fn test_iter_order_before_wrap() {
        let mut log = ExperienceLog::new(8);
        for i in 0..3 {
            log.record(exp(i as f32));
        }
        let valences: Vec<f32> = log.iter().map(|e| e.valence).collect();
        assert_eq!(valences, vec![0.0, 1.0, 2.0]);
    }
}
