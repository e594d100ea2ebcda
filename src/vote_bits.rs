//! Per-node convergence flags.
//!
//! `AtomicBitSet` is the lock-free primitive; `VoteBits` gives it the
//! vote-to-halt vocabulary. The reducing messenger reuses `AtomicBitSet`
//! for its message-present flags.

use std::sync::atomic::{AtomicU64, Ordering};

const WORD_BITS: usize = u64::BITS as usize;

// ============================================================================
// AtomicBitSet
// ============================================================================

/// Fixed-size bitset with lock-free concurrent set/clear/get.
pub struct AtomicBitSet {
    words: Box<[AtomicU64]>,
    len: usize,
}

impl AtomicBitSet {
    /// All bits start cleared.
    pub fn new(len: usize) -> Self {
        let word_count = len.div_ceil(WORD_BITS);
        let words = (0..word_count).map(|_| AtomicU64::new(0)).collect();
        Self { words, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        let word = self.words[index / WORD_BITS].load(Ordering::Acquire);
        word & (1 << (index % WORD_BITS)) != 0
    }

    pub fn set(&self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / WORD_BITS].fetch_or(1 << (index % WORD_BITS), Ordering::AcqRel);
    }

    pub fn clear(&self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / WORD_BITS].fetch_and(!(1 << (index % WORD_BITS)), Ordering::AcqRel);
    }

    /// Clear every bit. Not atomic as a whole; callers only use it between
    /// supersteps when no concurrent updates run.
    pub fn clear_all(&self) {
        for word in self.words.iter() {
            word.store(0, Ordering::Release);
        }
    }

    /// True iff every bit in `0..len` is set.
    pub fn all_set(&self) -> bool {
        if self.len == 0 {
            return true;
        }
        let full_words = self.len / WORD_BITS;
        for word in &self.words[..full_words] {
            if word.load(Ordering::Acquire) != u64::MAX {
                return false;
            }
        }
        let tail = self.len % WORD_BITS;
        if tail != 0 {
            let mask = (1u64 << tail) - 1;
            if self.words[full_words].load(Ordering::Acquire) & mask != mask {
                return false;
            }
        }
        true
    }

    /// Number of set bits.
    pub fn cardinality(&self) -> usize {
        self.words
            .iter()
            .map(|w| w.load(Ordering::Acquire).count_ones() as usize)
            .sum()
    }

    /// Estimated heap size in bytes for `len` bits.
    pub fn size_of(len: usize) -> u64 {
        (len.div_ceil(WORD_BITS) * std::mem::size_of::<u64>()) as u64
    }
}

// ============================================================================
// VoteBits
// ============================================================================

/// One bit per node: set means the node voted to halt.
///
/// Cleared (all active) at run start; a node's bit is set by `vote_to_halt`
/// and cleared again when a message is sent to it (reactivation).
pub struct VoteBits {
    bits: AtomicBitSet,
}

impl VoteBits {
    pub fn new(node_count: usize) -> Self {
        Self { bits: AtomicBitSet::new(node_count) }
    }

    pub fn vote_to_halt(&self, node: u64) {
        self.bits.set(node as usize);
    }

    pub fn reactivate(&self, node: u64) {
        self.bits.clear(node as usize);
    }

    pub fn has_voted(&self, node: u64) -> bool {
        self.bits.get(node as usize)
    }

    pub fn all_halted(&self) -> bool {
        self.bits.all_set()
    }

    /// Back to all-active, for run start.
    pub fn reset(&self) {
        self.bits.clear_all();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn set_get_clear() {
        let bits = AtomicBitSet::new(100);
        assert!(!bits.get(63));
        bits.set(63);
        bits.set(64);
        assert!(bits.get(63));
        assert!(bits.get(64));
        bits.clear(63);
        assert!(!bits.get(63));
        assert!(bits.get(64));
    }

    #[test]
    fn all_set_with_partial_tail_word() {
        let bits = AtomicBitSet::new(70);
        for i in 0..70 {
            bits.set(i);
        }
        assert!(bits.all_set());
        bits.clear(69);
        assert!(!bits.all_set());
    }

    #[test]
    fn empty_bitset_is_all_set() {
        assert!(AtomicBitSet::new(0).all_set());
    }

    #[test]
    fn concurrent_sets_do_not_lose_bits() {
        let bits = std::sync::Arc::new(AtomicBitSet::new(4096));
        std::thread::scope(|scope| {
            for t in 0..8 {
                let bits = std::sync::Arc::clone(&bits);
                scope.spawn(move || {
                    for i in (t..4096).step_by(8) {
                        bits.set(i);
                    }
                });
            }
        });
        assert!(bits.all_set());
        assert_eq!(bits.cardinality(), 4096);
    }

    #[test]
    fn vote_bits_lifecycle() {
        let votes = VoteBits::new(3);
        assert!(!votes.all_halted());
        votes.vote_to_halt(0);
        votes.vote_to_halt(1);
        votes.vote_to_halt(2);
        assert!(votes.all_halted());
        votes.reactivate(1);
        assert!(!votes.has_voted(1));
        assert!(!votes.all_halted());
        votes.reset();
        assert!(!votes.has_voted(0));
    }

    proptest! {
        #[test]
        fn cardinality_matches_distinct_sets(
            indices in prop::collection::vec(0usize..512, 0..128),
        ) {
            let bits = AtomicBitSet::new(512);
            for &i in &indices {
                bits.set(i);
            }
            let mut distinct = indices.clone();
            distinct.sort_unstable();
            distinct.dedup();
            prop_assert_eq!(bits.cardinality(), distinct.len());
            for i in distinct {
                prop_assert!(bits.get(i));
            }
        }
    }
}
