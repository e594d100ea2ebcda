//! # Graph Contract
//!
//! This is THE contract between the Pregel framework and whatever holds the
//! topology. The framework never loads or persists a graph — it only iterates
//! one through this trait.
//!
//! ## Implementations
//!
//! | Implementation | Module | Description |
//! |----------------|--------|-------------|
//! | `AdjacencyGraph` | `adjacency` | CSR in-memory reference implementation |

pub mod adjacency;

use std::sync::Arc;

pub use adjacency::{AdjacencyGraph, GraphBuilder};

/// Dense node identifier in `0..node_count`.
pub type NodeId = u64;

/// Visitor for unweighted relationship iteration.
///
/// Returns `false` to stop iterating the current node's relationships early.
pub type RelationshipVisitor<'a> = dyn FnMut(NodeId, NodeId) -> bool + 'a;

/// Visitor for weighted relationship iteration.
pub type WeightedRelationshipVisitor<'a> = dyn FnMut(NodeId, NodeId, f64) -> bool + 'a;

/// Read-only topology contract consumed by the framework.
///
/// Node ids are stable and dense for the lifetime of a computation. All
/// methods may be called concurrently — iteration state must live in the
/// visitor, never in the graph handle. Callers that iterate from multiple
/// threads take a `concurrent_copy()` per thread.
pub trait Graph: Send + Sync {
    /// Total number of nodes. NodeValue and VoteBits are sized to this.
    fn node_count(&self) -> usize;

    /// Total number of relationships.
    fn relationship_count(&self) -> usize;

    /// Outgoing degree of `node`.
    fn degree(&self, node: NodeId) -> usize;

    /// Whether a precomputed inbound-edge index exists.
    ///
    /// Bidirectional computations require this; its absence is a fatal
    /// configuration error raised before any superstep runs.
    fn is_inverse_indexed(&self) -> bool;

    /// Visit each outgoing relationship of `node` as `(source, target)`.
    fn for_each_relationship(&self, node: NodeId, visitor: &mut RelationshipVisitor<'_>);

    /// Visit each outgoing relationship of `node` as `(source, target, weight)`.
    ///
    /// Relationships without a stored weight report `fallback_weight`.
    fn for_each_relationship_weighted(
        &self,
        node: NodeId,
        fallback_weight: f64,
        visitor: &mut WeightedRelationshipVisitor<'_>,
    );

    /// Visit each inbound relationship of `node` as `(target, source)`.
    ///
    /// Only valid when `is_inverse_indexed()` is true; the framework checks
    /// that once, at construction.
    fn for_each_inverse_relationship(&self, node: NodeId, visitor: &mut RelationshipVisitor<'_>);

    /// An independent traversal handle that is safe to use from another
    /// thread. Each parallel compute task takes its own copy.
    fn concurrent_copy(&self) -> Arc<dyn Graph>;
}
