//! Versioned persistence envelope for a whole topology.
//!
//! The snapshot is plain serde over the in-memory structures wrapped in a
//! version tag, written as JSON. Loading a snapshot with an unknown
//! version fails up front rather than deserializing garbage.

use std::io::{Read, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::topology::Topology;
use crate::{Error, Result};

pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologySnapshot {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub topology: Topology,
}

impl Topology {
    /// Capture the full state under the current snapshot version.
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            version: SNAPSHOT_VERSION,
            created_at: Utc::now(),
            topology: self.clone(),
        }
    }

    /// Rebuild a topology from a snapshot, rejecting unknown versions.
    pub fn restore(snapshot: TopologySnapshot) -> Result<Self> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(Error::SnapshotVersion {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot.topology)
    }
}

pub fn save_json<W: Write>(topology: &Topology, writer: W) -> Result<()> {
    serde_json::to_writer(writer, &topology.snapshot())?;
    Ok(())
}

pub fn load_json<R: Read>(reader: R) -> Result<Topology> {
    let snapshot: TopologySnapshot = serde_json::from_reader(reader)?;
    Topology::restore(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_version_mismatch_rejected() {
        let t = Topology::default();
        let mut snap = t.snapshot();
        snap.version = 99;
        assert!(matches!(
            Topology::restore(snap),
            Err(Error::SnapshotVersion { found: 99, expected: SNAPSHOT_VERSION })
        ));
    }

    #[test]
    fn test_json_round_trip_preserves_counts() {
        let mut t = Topology::default();
        t.bootstrap_primordial().unwrap();
        let mut buffer = Vec::new();
        save_json(&t, &mut buffer).unwrap();
        let restored = load_json(buffer.as_slice()).unwrap();
        assert_eq!(restored.node_count(), t.node_count());
        assert_eq!(restored.edge_count(), t.edge_count());
        assert_eq!(restored.hyperedge_count(), t.hyperedge_count());
        assert_eq!(restored.node_id("self"), t.node_id("self"));
    }
}
