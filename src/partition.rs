//! Node-id range partitioning.

use crate::graph::NodeId;

/// Smallest range the recursive partitioner will hand to one task.
pub const MIN_BATCH_SIZE: usize = 64;

/// A contiguous node-id range assigned to one worker task for one superstep.
/// Carries no state beyond its bounds; recomputed each run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub start_node: NodeId,
    pub node_count: usize,
}

impl Partition {
    pub fn new(start_node: NodeId, node_count: usize) -> Self {
        Self { start_node, node_count }
    }

    pub fn iter(&self) -> std::ops::Range<NodeId> {
        self.start_node..self.start_node + self.node_count as u64
    }

    /// Split into two halves for fork-join work stealing.
    pub fn split(&self) -> (Partition, Partition) {
        let left = self.node_count / 2;
        (
            Partition::new(self.start_node, left),
            Partition::new(self.start_node + left as u64, self.node_count - left),
        )
    }
}

/// Split `0..node_count` into at most `concurrency` contiguous ranges of
/// near-equal size.
pub fn range_partitions(node_count: usize, concurrency: usize) -> Vec<Partition> {
    if node_count == 0 {
        return Vec::new();
    }
    let batch = node_count.div_ceil(concurrency);
    let mut partitions = Vec::with_capacity(concurrency);
    let mut start = 0usize;
    while start < node_count {
        let len = batch.min(node_count - start);
        partitions.push(Partition::new(start as u64, len));
        start += len;
    }
    partitions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_node_space_without_overlap() {
        let partitions = range_partitions(10, 3);
        assert_eq!(partitions.len(), 3);
        let total: usize = partitions.iter().map(|p| p.node_count).sum();
        assert_eq!(total, 10);
        for pair in partitions.windows(2) {
            assert_eq!(pair[0].start_node + pair[0].node_count as u64, pair[1].start_node);
        }
    }

    #[test]
    fn fewer_nodes_than_workers() {
        let partitions = range_partitions(2, 8);
        assert_eq!(partitions.len(), 2);
        assert!(partitions.iter().all(|p| p.node_count == 1));
    }

    #[test]
    fn empty_graph_yields_no_partitions() {
        assert!(range_partitions(0, 4).is_empty());
    }

    #[test]
    fn split_preserves_range() {
        let (a, b) = Partition::new(10, 7).split();
        assert_eq!(a, Partition::new(10, 3));
        assert_eq!(b, Partition::new(13, 4));
    }
}
