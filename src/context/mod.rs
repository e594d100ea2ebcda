//! Contexts handed to the computation's hooks.
//!
//! `InitContext` and `ComputeContext` are node-centric: one instance per
//! partition task, repointed at each node before the hook runs.
//! `MasterComputeContext` is global and single-threaded.

use std::sync::Arc;

use crate::config::PregelConfig;
use crate::graph::{Graph, NodeId};
use crate::messenger::Messenger;
use crate::node_value::NodeValue;
use crate::vote_bits::VoteBits;
use crate::Result;

// ============================================================================
// InitContext
// ============================================================================

/// Per-node setup context for the first superstep. Topology reads and
/// node-value writes, no messaging.
pub struct InitContext<'a> {
    node_id: NodeId,
    config: &'a PregelConfig,
    graph: Arc<dyn Graph>,
    node_value: &'a NodeValue,
}

impl<'a> InitContext<'a> {
    pub(crate) fn new(
        config: &'a PregelConfig,
        graph: Arc<dyn Graph>,
        node_value: &'a NodeValue,
    ) -> Self {
        Self { node_id: 0, config, graph, node_value }
    }

    pub(crate) fn set_node_id(&mut self, node_id: NodeId) {
        self.node_id = node_id;
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn config(&self) -> &PregelConfig {
        self.config
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn degree(&self) -> usize {
        self.graph.degree(self.node_id)
    }

    pub fn set_long(&mut self, property_key: &str, value: i64) -> Result<()> {
        self.node_value.set_long(property_key, self.node_id, value)
    }

    pub fn set_double(&mut self, property_key: &str, value: f64) -> Result<()> {
        self.node_value.set_double(property_key, self.node_id, value)
    }

    pub fn set_long_array(&mut self, property_key: &str, value: Vec<i64>) -> Result<()> {
        self.node_value.set_long_array(property_key, self.node_id, value)
    }

    pub fn set_double_array(&mut self, property_key: &str, value: Vec<f64>) -> Result<()> {
        self.node_value.set_double_array(property_key, self.node_id, value)
    }
}

// ============================================================================
// ComputeContext
// ============================================================================

/// Per-node context for `compute`: node-value read/write, messaging,
/// vote-to-halt, neighbor iteration.
pub struct ComputeContext<'a> {
    node_id: NodeId,
    superstep: usize,
    config: &'a PregelConfig,
    graph: Arc<dyn Graph>,
    node_value: &'a NodeValue,
    vote_bits: &'a VoteBits,
    messenger: &'a Messenger,
}

impl<'a> ComputeContext<'a> {
    pub(crate) fn new(
        superstep: usize,
        config: &'a PregelConfig,
        graph: Arc<dyn Graph>,
        node_value: &'a NodeValue,
        vote_bits: &'a VoteBits,
        messenger: &'a Messenger,
    ) -> Self {
        Self { node_id: 0, superstep, config, graph, node_value, vote_bits, messenger }
    }

    pub(crate) fn set_node_id(&mut self, node_id: NodeId) {
        self.node_id = node_id;
    }

    // ========================================================================
    // Run state
    // ========================================================================

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn superstep(&self) -> usize {
        self.superstep
    }

    pub fn is_initial_superstep(&self) -> bool {
        self.superstep == 0
    }

    pub fn config(&self) -> &PregelConfig {
        self.config
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn degree(&self) -> usize {
        self.graph.degree(self.node_id)
    }

    // ========================================================================
    // Node values (own node only)
    // ========================================================================

    pub fn long_value(&self, property_key: &str) -> Result<i64> {
        self.node_value.long_value(property_key, self.node_id)
    }

    pub fn double_value(&self, property_key: &str) -> Result<f64> {
        self.node_value.double_value(property_key, self.node_id)
    }

    pub fn long_array_value(&self, property_key: &str) -> Result<Vec<i64>> {
        self.node_value.long_array_value(property_key, self.node_id)
    }

    pub fn double_array_value(&self, property_key: &str) -> Result<Vec<f64>> {
        self.node_value.double_array_value(property_key, self.node_id)
    }

    pub fn set_long(&mut self, property_key: &str, value: i64) -> Result<()> {
        self.node_value.set_long(property_key, self.node_id, value)
    }

    pub fn set_double(&mut self, property_key: &str, value: f64) -> Result<()> {
        self.node_value.set_double(property_key, self.node_id, value)
    }

    pub fn set_long_array(&mut self, property_key: &str, value: Vec<i64>) -> Result<()> {
        self.node_value.set_long_array(property_key, self.node_id, value)
    }

    pub fn set_double_array(&mut self, property_key: &str, value: Vec<f64>) -> Result<()> {
        self.node_value.set_double_array(property_key, self.node_id, value)
    }

    // ========================================================================
    // Messaging
    // ========================================================================

    /// Send `message` to any target node. Also reactivates the target if it
    /// had voted to halt.
    pub fn send_to(&mut self, target: NodeId, message: f64) {
        self.messenger.send_to(self.node_id, target, message);
        self.vote_bits.reactivate(target);
    }

    /// Send `message` along every outgoing relationship.
    pub fn send_to_neighbors(&mut self, message: f64) {
        let graph = Arc::clone(&self.graph);
        let source = self.node_id;
        graph.for_each_relationship(source, &mut |_, target| {
            self.send_to(target, message);
            true
        });
    }

    // ========================================================================
    // Topology
    // ========================================================================

    /// Visit each outgoing neighbor.
    pub fn for_each_neighbor(&self, mut visitor: impl FnMut(NodeId)) {
        self.graph.for_each_relationship(self.node_id, &mut |_, target| {
            visitor(target);
            true
        });
    }

    /// Visit each outgoing neighbor with the relationship weight
    /// (`fallback_weight` when the graph stores none).
    pub fn for_each_neighbor_weighted(
        &self,
        fallback_weight: f64,
        mut visitor: impl FnMut(NodeId, f64),
    ) {
        self.graph
            .for_each_relationship_weighted(self.node_id, fallback_weight, &mut |_, target, w| {
                visitor(target, w);
                true
            });
    }

    /// Visit each inbound neighbor. Only available to bidirectional
    /// computations; the executor verified the inverse index at construction.
    pub fn for_each_inverse_neighbor(&self, mut visitor: impl FnMut(NodeId)) {
        self.graph.for_each_inverse_relationship(self.node_id, &mut |_, source| {
            visitor(source);
            true
        });
    }

    // ========================================================================
    // Convergence
    // ========================================================================

    /// Declare this node done unless a message reactivates it.
    pub fn vote_to_halt(&mut self) {
        self.vote_bits.vote_to_halt(self.node_id);
    }
}

// ============================================================================
// MasterComputeContext
// ============================================================================

/// Global single-threaded context between supersteps. May read and write any
/// node's values.
pub struct MasterComputeContext<'a> {
    superstep: usize,
    config: &'a PregelConfig,
    graph: &'a Arc<dyn Graph>,
    node_value: &'a NodeValue,
}

impl<'a> MasterComputeContext<'a> {
    pub(crate) fn new(
        superstep: usize,
        config: &'a PregelConfig,
        graph: &'a Arc<dyn Graph>,
        node_value: &'a NodeValue,
    ) -> Self {
        Self { superstep, config, graph, node_value }
    }

    pub fn superstep(&self) -> usize {
        self.superstep
    }

    pub fn is_initial_superstep(&self) -> bool {
        self.superstep == 0
    }

    pub fn config(&self) -> &PregelConfig {
        self.config
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Visit every node id.
    pub fn for_each_node(&self, mut visitor: impl FnMut(NodeId)) {
        for node in 0..self.graph.node_count() as u64 {
            visitor(node);
        }
    }

    pub fn long_value(&self, property_key: &str, node: NodeId) -> Result<i64> {
        self.node_value.long_value(property_key, node)
    }

    pub fn double_value(&self, property_key: &str, node: NodeId) -> Result<f64> {
        self.node_value.double_value(property_key, node)
    }

    pub fn set_long(&mut self, property_key: &str, node: NodeId, value: i64) -> Result<()> {
        self.node_value.set_long(property_key, node, value)
    }

    pub fn set_double(&mut self, property_key: &str, node: NodeId, value: f64) -> Result<()> {
        self.node_value.set_double(property_key, node, value)
    }
}
