//! Directed, weighted sparse adjacency in compressed-row (CSR) form.
//!
//! The graph is write-heavy during construction and read-heavy while
//! ticking, so CSR is kept as the storage layout even though a novel
//! insert costs an amortized O(edges) suffix shift. For edge sets known
//! up front, [`CsrBuilder`] sorts once and freezes without any shifting.
//!
//! Edges are never physically removed. Consolidation soft-prunes by
//! setting [`EDGE_TEMPORARY`]; flagged edges drop out of propagation and
//! learning but keep their slot until a reclamation pass (not scheduled
//! by this crate) rebuilds the arrays.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// Edge flags.
pub const EDGE_BIDIRECTIONAL: u8 = 0x01;
pub const EDGE_TEMPORARY: u8 = 0x02;
pub const EDGE_EMOTIONAL: u8 = 0x04;
pub const EDGE_LEARNING: u8 = 0x08;
pub const EDGE_LEVI: u8 = 0x10;

/// Compressed sparse row adjacency.
///
/// Invariants: `row_ptr` is non-decreasing with `row_ptr.len() == nodes + 1`;
/// column indices within a row are unique (duplicate targets update in
/// place); weights stay clamped to [-1, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsrGraph {
    row_ptr: Vec<u32>,
    col_idx: Vec<u32>,
    weights: Vec<f32>,
    flags: Vec<u8>,
}

impl CsrGraph {
    pub fn new() -> Self {
        Self { row_ptr: vec![0], col_idx: Vec::new(), weights: Vec::new(), flags: Vec::new() }
    }

    pub fn with_nodes(nodes: usize) -> Self {
        Self { row_ptr: vec![0; nodes + 1], ..Self::new() }
    }

    /// Register one more (empty) row. Called when a node is woven.
    pub fn add_node(&mut self) {
        let last = *self.row_ptr.last().unwrap_or(&0);
        self.row_ptr.push(last);
    }

    pub fn node_count(&self) -> usize {
        self.row_ptr.len() - 1
    }

    pub fn edge_count(&self) -> usize {
        self.col_idx.len()
    }

    fn check_node(&self, id: u32) -> Result<()> {
        if (id as usize) < self.node_count() {
            Ok(())
        } else {
            Err(Error::InvalidReference { kind: "node", id })
        }
    }

    /// Insert or update the directed edge `src -> dst`.
    ///
    /// Returns `true` on a novel insert, `false` on an in-place update.
    /// An update also clears [`EDGE_TEMPORARY`]: re-creating a soft-pruned
    /// edge revives it. Fails without touching anything if either endpoint
    /// is out of range.
    pub fn upsert(&mut self, src: u32, dst: u32, weight: f32, flags: u8) -> Result<bool> {
        self.check_node(src)?;
        self.check_node(dst)?;
        let weight = weight.clamp(-1.0, 1.0);

        let row = self.row_range(src);
        for e in row.clone() {
            if self.col_idx[e] == dst {
                self.weights[e] = weight;
                self.flags[e] = flags & !EDGE_TEMPORARY;
                return Ok(false);
            }
        }

        // Novel edge: insert at the end of the row, shift the suffix,
        // bump every subsequent row pointer.
        let at = row.end;
        self.col_idx.insert(at, dst);
        self.weights.insert(at, weight);
        self.flags.insert(at, flags);
        for p in self.row_ptr[src as usize + 1..].iter_mut() {
            *p += 1;
        }
        Ok(true)
    }

    /// Edge-slot range for a node's outgoing edges.
    pub fn row_range(&self, src: u32) -> std::ops::Range<usize> {
        let s = src as usize;
        self.row_ptr[s] as usize..self.row_ptr[s + 1] as usize
    }

    pub fn target_at(&self, e: usize) -> u32 {
        self.col_idx[e]
    }

    pub fn weight_at(&self, e: usize) -> f32 {
        self.weights[e]
    }

    /// Weight as seen by propagation and learning: 0 for soft-pruned edges.
    pub fn effective_weight_at(&self, e: usize) -> f32 {
        if self.flags[e] & EDGE_TEMPORARY != 0 {
            0.0
        } else {
            self.weights[e]
        }
    }

    pub fn set_weight_at(&mut self, e: usize, weight: f32) {
        self.weights[e] = weight.clamp(-1.0, 1.0);
    }

    pub fn flags_at(&self, e: usize) -> u8 {
        self.flags[e]
    }

    pub fn set_flags_at(&mut self, e: usize, flags: u8) {
        self.flags[e] = flags;
    }

    /// Lookup weight of `src -> dst`, if the edge exists.
    pub fn weight(&self, src: u32, dst: u32) -> Option<f32> {
        self.row_range(src).find(|&e| self.col_idx[e] == dst).map(|e| self.weights[e])
    }

    /// Outgoing `(target, weight, flags)` triples of a node.
    pub fn outgoing(&self, src: u32) -> impl Iterator<Item = (u32, f32, u8)> + '_ {
        self.row_range(src).map(move |e| (self.col_idx[e], self.weights[e], self.flags[e]))
    }

    /// Out-degree ignoring soft-pruned edges.
    pub fn live_out_degree(&self, src: u32) -> usize {
        self.row_range(src).filter(|&e| self.flags[e] & EDGE_TEMPORARY == 0).count()
    }

    #[cfg(test)]
    pub(crate) fn row_ptr(&self) -> &[u32] {
        &self.row_ptr
    }
}

// ============================================================================
// Bulk construction
// ============================================================================

/// Accumulate edges, then build a frozen CSR in one pass.
///
/// Avoids the per-edge suffix shift of [`CsrGraph::upsert`] when the edge
/// set is known up front. Duplicate `(src, dst)` pairs keep the last write.
#[derive(Debug, Default)]
pub struct CsrBuilder {
    edges: Vec<(u32, u32, f32, u8)>,
}

impl CsrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn edge(&mut self, src: u32, dst: u32, weight: f32, flags: u8) -> &mut Self {
        self.edges.push((src, dst, weight.clamp(-1.0, 1.0), flags));
        self
    }

    pub fn build(mut self, nodes: usize) -> Result<CsrGraph> {
        for &(src, dst, ..) in &self.edges {
            if src as usize >= nodes {
                return Err(Error::InvalidReference { kind: "node", id: src });
            }
            if dst as usize >= nodes {
                return Err(Error::InvalidReference { kind: "node", id: dst });
            }
        }

        // Stable sort + last-wins dedup keeps row order deterministic.
        self.edges.sort_by_key(|&(src, dst, ..)| (src, dst));
        let mut deduped: Vec<(u32, u32, f32, u8)> = Vec::with_capacity(self.edges.len());
        for e in self.edges {
            match deduped.last_mut() {
                Some(last) if last.0 == e.0 && last.1 == e.1 => *last = e,
                _ => deduped.push(e),
            }
        }

        let mut graph = CsrGraph {
            row_ptr: Vec::with_capacity(nodes + 1),
            col_idx: Vec::with_capacity(deduped.len()),
            weights: Vec::with_capacity(deduped.len()),
            flags: Vec::with_capacity(deduped.len()),
        };
        graph.row_ptr.push(0);
        let mut cursor = 0usize;
        for row in 0..nodes as u32 {
            while cursor < deduped.len() && deduped[cursor].0 == row {
                let (_, dst, w, f) = deduped[cursor];
                graph.col_idx.push(dst);
                graph.weights.push(w);
                graph.flags.push(f);
                cursor += 1;
            }
            graph.row_ptr.push(graph.col_idx.len() as u32);
        }
        Ok(graph)
    }
}

// ============================================================================
// Tests
// ============================================================================
