//! Ahead-of-time memory budgeting.
//!
//! Host products call this before a run to decide whether the computation
//! fits the configured heap. Estimates are ranges: scalar channels and vote
//! bits are exact, array channels and queue buffers depend on data the
//! framework cannot see up front (array lengths, message volume), so those
//! contribute a heuristic upper bound of one element / one message per
//! relationship.

use std::ops::Add;

use parking_lot::{Mutex, RwLock};

use crate::config::PregelConfig;
use crate::messenger::MessageQueue;
use crate::schema::{PregelSchema, ValueType};
use crate::vote_bits::AtomicBitSet;

/// Fixed per-partition task bookkeeping (range bounds, contexts, graph
/// handle).
const PARTITION_TASK_BYTES: u64 = 64;

const MESSAGE_BYTES: u64 = std::mem::size_of::<f64>() as u64;

// ============================================================================
// MemoryRange
// ============================================================================

/// An inclusive min..max byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub min: u64,
    pub max: u64,
}

impl MemoryRange {
    pub fn of(bytes: u64) -> Self {
        Self { min: bytes, max: bytes }
    }

    pub fn of_range(min: u64, max: u64) -> Self {
        debug_assert!(min <= max);
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self::of(0)
    }

    pub fn times(self, factor: u64) -> Self {
        Self { min: self.min * factor, max: self.max * factor }
    }
}

impl Add for MemoryRange {
    type Output = MemoryRange;

    fn add(self, rhs: MemoryRange) -> MemoryRange {
        MemoryRange { min: self.min + rhs.min, max: self.max + rhs.max }
    }
}

// ============================================================================
// Estimation
// ============================================================================

/// Estimate the peak memory of one run.
///
/// `has_reducer` mirrors the messenger selection rule: a declared reducer
/// picks the reducing strategy, otherwise `config.is_asynchronous` chooses
/// between the queues.
pub fn memory_estimation(
    schema: &PregelSchema,
    config: &PregelConfig,
    has_reducer: bool,
    node_count: u64,
    relationship_count: u64,
) -> MemoryRange {
    vote_bits_estimate(node_count)
        + partition_estimate(config)
        + node_value_estimate(schema, node_count, relationship_count)
        + messenger_estimate(config, has_reducer, node_count, relationship_count)
}

fn vote_bits_estimate(node_count: u64) -> MemoryRange {
    MemoryRange::of(AtomicBitSet::size_of(node_count as usize))
}

fn partition_estimate(config: &PregelConfig) -> MemoryRange {
    MemoryRange::of(PARTITION_TASK_BYTES).times(config.concurrency as u64)
}

fn node_value_estimate(
    schema: &PregelSchema,
    node_count: u64,
    relationship_count: u64,
) -> MemoryRange {
    let mut total = MemoryRange::empty();
    for element in schema.elements() {
        total = total
            + match element.value_type {
                ValueType::Long | ValueType::Double => MemoryRange::of(8 * node_count),
                ValueType::LongArray => {
                    let slots = std::mem::size_of::<RwLock<Box<[i64]>>>() as u64 * node_count;
                    MemoryRange::of_range(slots, slots + 8 * relationship_count)
                }
                ValueType::DoubleArray => {
                    let slots = std::mem::size_of::<RwLock<Box<[f64]>>>() as u64 * node_count;
                    MemoryRange::of_range(slots, slots + 8 * relationship_count)
                }
            };
    }
    total
}

fn messenger_estimate(
    config: &PregelConfig,
    has_reducer: bool,
    node_count: u64,
    relationship_count: u64,
) -> MemoryRange {
    if has_reducer {
        // Two accumulator buffers, O(node_count) regardless of volume.
        let accumulators = 8 * node_count;
        let present = AtomicBitSet::size_of(node_count as usize);
        let senders = if config.track_sender { 8 * node_count } else { 0 };
        return MemoryRange::of(accumulators + present + senders).times(2);
    }

    let queue_slots =
        MemoryRange::of(std::mem::size_of::<Mutex<MessageQueue>>() as u64 * node_count);
    let in_flight = MemoryRange::of_range(0, MESSAGE_BYTES * relationship_count);
    let per_buffer = queue_slots + in_flight;
    if config.is_asynchronous {
        per_buffer
    } else {
        per_buffer.times(2)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PregelSchema;

    fn scalar_schema() -> PregelSchema {
        PregelSchema::builder().add("value", ValueType::Double).build()
    }

    #[test]
    fn range_arithmetic() {
        let range = MemoryRange::of_range(10, 20) + MemoryRange::of(5);
        assert_eq!(range, MemoryRange::of_range(15, 25));
        assert_eq!(range.times(2), MemoryRange::of_range(30, 50));
    }

    #[test]
    fn scalar_channels_are_exact() {
        let estimate = node_value_estimate(&scalar_schema(), 1000, 5000);
        assert_eq!(estimate, MemoryRange::of(8_000));
    }

    #[test]
    fn array_channels_have_slack() {
        let schema = PregelSchema::builder().add("emb", ValueType::DoubleArray).build();
        let estimate = node_value_estimate(&schema, 10, 100);
        assert!(estimate.min < estimate.max);
        assert_eq!(estimate.max - estimate.min, 800);
    }

    #[test]
    fn reducing_is_independent_of_message_volume() {
        let config = PregelConfig::new(1);
        let small = memory_estimation(&scalar_schema(), &config, true, 1000, 10);
        let large = memory_estimation(&scalar_schema(), &config, true, 1000, 1_000_000);
        assert_eq!(small, large);
    }

    #[test]
    fn queue_max_grows_with_relationships() {
        let config = PregelConfig::new(1);
        let small = memory_estimation(&scalar_schema(), &config, false, 1000, 10);
        let large = memory_estimation(&scalar_schema(), &config, false, 1000, 1_000_000);
        assert_eq!(small.min, large.min);
        assert!(small.max < large.max);
    }

    #[test]
    fn sync_doubles_the_async_buffers() {
        let sync_config = PregelConfig::new(1);
        let async_config = PregelConfig::new(1).with_asynchronous(true);
        let sync = messenger_estimate(&sync_config, false, 100, 0);
        let asynchronous = messenger_estimate(&async_config, false, 100, 0);
        assert_eq!(sync.min, 2 * asynchronous.min);
    }

    #[test]
    fn vote_bits_are_one_bit_per_node_word_aligned() {
        assert_eq!(vote_bits_estimate(64), MemoryRange::of(8));
        assert_eq!(vote_bits_estimate(65), MemoryRange::of(16));
    }
}
