//! In-memory CSR adjacency graph.
//!
//! This is the reference implementation of the `Graph` contract. It stores
//! the topology in compressed-sparse-row form: one offsets array plus one
//! targets array, with an optional parallel weights array and an optional
//! inverse (inbound) index.
//!
//! ## Limitations
//!
//! - **Immutable**: built once through `GraphBuilder`, never mutated.
//!   `concurrent_copy()` is therefore a cheap `Arc` clone.
//! - **Dense ids only**: node ids must fall in `0..node_count`.
//!
//! Use this implementation for testing computations and for embedding the
//! framework without a host graph store.

use std::sync::Arc;

use crate::{Error, Result};
use super::{Graph, NodeId, RelationshipVisitor, WeightedRelationshipVisitor};

// ============================================================================
// AdjacencyGraph
// ============================================================================

/// CSR-backed in-memory graph.
pub struct AdjacencyGraph {
    inner: Arc<CsrInner>,
}

struct CsrInner {
    node_count: usize,
    /// `offsets[n]..offsets[n + 1]` indexes `targets` for node `n`.
    offsets: Vec<usize>,
    targets: Vec<NodeId>,
    /// Parallel to `targets`; `None` when the graph is unweighted.
    weights: Option<Vec<f64>>,
    /// Inbound index, present only when built with `inverse_indexed(true)`.
    inverse: Option<Csr>,
}

struct Csr {
    offsets: Vec<usize>,
    targets: Vec<NodeId>,
}

impl AdjacencyGraph {
    /// Start building a graph with the given node count.
    pub fn builder(node_count: usize) -> GraphBuilder {
        GraphBuilder::new(node_count)
    }

    fn slice(&self, node: NodeId) -> &[NodeId] {
        let n = node as usize;
        &self.inner.targets[self.inner.offsets[n]..self.inner.offsets[n + 1]]
    }
}

impl Graph for AdjacencyGraph {
    fn node_count(&self) -> usize {
        self.inner.node_count
    }

    fn relationship_count(&self) -> usize {
        self.inner.targets.len()
    }

    fn degree(&self, node: NodeId) -> usize {
        let n = node as usize;
        self.inner.offsets[n + 1] - self.inner.offsets[n]
    }

    fn is_inverse_indexed(&self) -> bool {
        self.inner.inverse.is_some()
    }

    fn for_each_relationship(&self, node: NodeId, visitor: &mut RelationshipVisitor<'_>) {
        for &target in self.slice(node) {
            if !visitor(node, target) {
                return;
            }
        }
    }

    fn for_each_relationship_weighted(
        &self,
        node: NodeId,
        fallback_weight: f64,
        visitor: &mut WeightedRelationshipVisitor<'_>,
    ) {
        let n = node as usize;
        let range = self.inner.offsets[n]..self.inner.offsets[n + 1];
        match &self.inner.weights {
            Some(weights) => {
                for i in range {
                    if !visitor(node, self.inner.targets[i], weights[i]) {
                        return;
                    }
                }
            }
            None => {
                for i in range {
                    if !visitor(node, self.inner.targets[i], fallback_weight) {
                        return;
                    }
                }
            }
        }
    }

    fn for_each_inverse_relationship(&self, node: NodeId, visitor: &mut RelationshipVisitor<'_>) {
        let Some(inverse) = &self.inner.inverse else {
            debug_assert!(false, "inverse iteration on a graph without inverse index");
            return;
        };
        let n = node as usize;
        for &source in &inverse.targets[inverse.offsets[n]..inverse.offsets[n + 1]] {
            if !visitor(node, source) {
                return;
            }
        }
    }

    fn concurrent_copy(&self) -> Arc<dyn Graph> {
        Arc::new(AdjacencyGraph { inner: Arc::clone(&self.inner) })
    }
}

// ============================================================================
// GraphBuilder
// ============================================================================

/// Builder collecting relationships before CSR assembly.
pub struct GraphBuilder {
    node_count: usize,
    relationships: Vec<(NodeId, NodeId)>,
    weights: Vec<f64>,
    weighted: bool,
    inverse_indexed: bool,
}

impl GraphBuilder {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            relationships: Vec::new(),
            weights: Vec::new(),
            weighted: false,
            inverse_indexed: false,
        }
    }

    /// Add a directed, unweighted relationship.
    pub fn add_relationship(mut self, source: NodeId, target: NodeId) -> Self {
        self.relationships.push((source, target));
        self.weights.push(1.0);
        self
    }

    /// Add a directed relationship with a weight.
    pub fn add_weighted_relationship(mut self, source: NodeId, target: NodeId, weight: f64) -> Self {
        self.relationships.push((source, target));
        self.weights.push(weight);
        self.weighted = true;
        self
    }

    /// Also build the inbound-edge index required by bidirectional
    /// computations.
    pub fn inverse_indexed(mut self, enabled: bool) -> Self {
        self.inverse_indexed = enabled;
        self
    }

    /// Assemble the CSR arrays. Fails if any endpoint is out of range.
    pub fn build(self) -> Result<AdjacencyGraph> {
        let n = self.node_count;
        for &(source, target) in &self.relationships {
            if source as usize >= n || target as usize >= n {
                return Err(Error::Graph(format!(
                    "relationship ({source})-->({target}) outside node id space 0..{n}"
                )));
            }
        }

        let (offsets, order) = sort_by_source(n, &self.relationships, |r| r.0);
        let targets: Vec<NodeId> = order.iter().map(|&i| self.relationships[i].1).collect();
        let weights = self
            .weighted
            .then(|| order.iter().map(|&i| self.weights[i]).collect());

        let inverse = self.inverse_indexed.then(|| {
            let (offsets, order) = sort_by_source(n, &self.relationships, |r| r.1);
            let targets = order.iter().map(|&i| self.relationships[i].0).collect();
            Csr { offsets, targets }
        });

        Ok(AdjacencyGraph {
            inner: Arc::new(CsrInner { node_count: n, offsets, targets, weights, inverse }),
        })
    }
}

/// Counting-sort relationships by a key node, returning CSR offsets and the
/// permutation of relationship indices in CSR order. Stable, so per-source
/// insertion order survives into iteration order.
fn sort_by_source(
    node_count: usize,
    relationships: &[(NodeId, NodeId)],
    key: impl Fn(&(NodeId, NodeId)) -> NodeId,
) -> (Vec<usize>, Vec<usize>) {
    let mut offsets = vec![0usize; node_count + 1];
    for rel in relationships {
        offsets[key(rel) as usize + 1] += 1;
    }
    for i in 1..offsets.len() {
        offsets[i] += offsets[i - 1];
    }

    let mut cursor = offsets.clone();
    let mut order = vec![0usize; relationships.len()];
    for (i, rel) in relationships.iter().enumerate() {
        let slot = &mut cursor[key(rel) as usize];
        order[*slot] = i;
        *slot += 1;
    }
    (offsets, order)
}

// ============================================================================
// Tests
// ============================================================================
