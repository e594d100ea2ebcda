//! Per-superstep parallel execution of the computation kernel.

use std::sync::Arc;

use rayon::prelude::*;

use crate::computation::PregelComputation;
use crate::config::{Partitioning, PregelConfig};
use crate::context::{ComputeContext, InitContext};
use crate::graph::Graph;
use crate::messenger::Messenger;
use crate::node_value::NodeValue;
use crate::partition::{range_partitions, Partition, MIN_BATCH_SIZE};
use crate::vote_bits::VoteBits;
use crate::Result;

/// Runs `compute` over every active node of one superstep.
///
/// The step itself is shared across worker tasks; all mutable run state
/// (node values, vote bits, message buffers) supports the concurrent access
/// patterns it sees. Each partition task takes its own concurrent graph
/// copy and node-centric contexts.
pub(crate) struct ComputeStep<'a, C: PregelComputation> {
    computation: &'a C,
    config: &'a PregelConfig,
    graph: &'a Arc<dyn Graph>,
    node_value: &'a NodeValue,
    vote_bits: &'a VoteBits,
    messenger: &'a Messenger,
    iteration: usize,
}

impl<'a, C: PregelComputation> ComputeStep<'a, C> {
    pub(crate) fn new(
        computation: &'a C,
        config: &'a PregelConfig,
        graph: &'a Arc<dyn Graph>,
        node_value: &'a NodeValue,
        vote_bits: &'a VoteBits,
        messenger: &'a Messenger,
        iteration: usize,
    ) -> Self {
        Self { computation, config, graph, node_value, vote_bits, messenger, iteration }
    }

    /// Run the superstep's parallel phase. Must be called on the run's
    /// thread pool. Returns the first computation error, which aborts
    /// remaining unstarted work.
    pub(crate) fn run(&self) -> Result<()> {
        let node_count = self.graph.node_count();
        match self.config.partitioning {
            Partitioning::Range => range_partitions(node_count, self.config.concurrency)
                .into_par_iter()
                .try_for_each(|partition| self.run_partition(partition)),
            Partitioning::Auto => self.run_fork_join(Partition::new(0, node_count)),
        }
    }

    /// Halve the range until it fits one batch, letting idle workers steal
    /// the halves. This is what keeps skewed-degree graphs balanced.
    fn run_fork_join(&self, partition: Partition) -> Result<()> {
        if partition.node_count <= MIN_BATCH_SIZE {
            return self.run_partition(partition);
        }
        let (left, right) = partition.split();
        let (left_result, right_result) =
            rayon::join(|| self.run_fork_join(left), || self.run_fork_join(right));
        left_result.and(right_result)
    }

    fn run_partition(&self, partition: Partition) -> Result<()> {
        let graph = self.graph.concurrent_copy();
        let mut init_ctx = InitContext::new(self.config, Arc::clone(&graph), self.node_value);
        let mut ctx = ComputeContext::new(
            self.iteration,
            self.config,
            graph,
            self.node_value,
            self.vote_bits,
            self.messenger,
        );

        for node in partition.iter() {
            let mut messages = self.messenger.messages_for(node);
            if self.vote_bits.has_voted(node) && messages.is_empty() {
                continue;
            }
            // Running a node makes it active again until it votes anew.
            self.vote_bits.reactivate(node);

            if self.iteration == 0 {
                init_ctx.set_node_id(node);
                self.computation.init(&mut init_ctx)?;
            }
            ctx.set_node_id(node);
            self.computation.compute(&mut ctx, &mut messages)?;
        }
        Ok(())
    }
}
