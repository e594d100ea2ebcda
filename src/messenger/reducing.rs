//! Reducing messenger.
//!
//! No per-message storage: every send folds into one accumulator per target
//! through a computation-supplied associative and commutative reducer, so
//! memory stays O(node_count) regardless of message volume. Per-message
//! provenance is lost unless sender tracking is enabled, and even then only
//! the sender of the surviving message is recorded, best effort under
//! concurrent sends.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::graph::NodeId;
use crate::vote_bits::AtomicBitSet;
use super::Messages;

// ============================================================================
// MessageReducer
// ============================================================================

/// Folds two messages into one. Must be associative and commutative, and
/// `reduce(identity(), m)` must equal `m`.
pub trait MessageReducer: Send + Sync {
    fn identity(&self) -> f64;
    fn reduce(&self, current: f64, message: f64) -> f64;
}

pub struct SumReducer;

impl MessageReducer for SumReducer {
    fn identity(&self) -> f64 {
        0.0
    }
    fn reduce(&self, current: f64, message: f64) -> f64 {
        current + message
    }
}

pub struct MinReducer;

impl MessageReducer for MinReducer {
    fn identity(&self) -> f64 {
        f64::INFINITY
    }
    fn reduce(&self, current: f64, message: f64) -> f64 {
        current.min(message)
    }
}

pub struct MaxReducer;

impl MessageReducer for MaxReducer {
    fn identity(&self) -> f64 {
        f64::NEG_INFINITY
    }
    fn reduce(&self, current: f64, message: f64) -> f64 {
        current.max(message)
    }
}

/// Counts messages; the payload is ignored.
pub struct CountReducer;

impl MessageReducer for CountReducer {
    fn identity(&self) -> f64 {
        0.0
    }
    fn reduce(&self, current: f64, _message: f64) -> f64 {
        current + 1.0
    }
}

// ============================================================================
// ReducingMessenger
// ============================================================================

struct ReduceBuffer {
    /// Accumulators as f64 bit patterns, filled with the reducer identity.
    values: Box<[AtomicU64]>,
    /// Distinguishes "no message" from an accumulator that happens to equal
    /// the identity.
    present: AtomicBitSet,
    /// Sender of the surviving message, when tracking is on.
    senders: Option<Box<[AtomicU64]>>,
}

impl ReduceBuffer {
    fn new(node_count: usize, identity: f64, track_sender: bool) -> Self {
        let bits = identity.to_bits();
        Self {
            values: (0..node_count).map(|_| AtomicU64::new(bits)).collect(),
            present: AtomicBitSet::new(node_count),
            senders: track_sender.then(|| (0..node_count).map(|_| AtomicU64::new(0)).collect()),
        }
    }

    fn reset(&self, identity: f64) {
        let bits = identity.to_bits();
        for value in self.values.iter() {
            value.store(bits, Ordering::Relaxed);
        }
        self.present.clear_all();
    }
}

/// Double-buffered accumulator arrays: sends fold into the write buffer,
/// reads come from the read buffer, swapped each `init_iteration` — so the
/// S+1 visibility guarantee matches the sync queue.
pub struct ReducingMessenger {
    read: ReduceBuffer,
    write: ReduceBuffer,
    reducer: Box<dyn MessageReducer>,
    sent: AtomicBool,
}

impl ReducingMessenger {
    pub fn new(node_count: usize, reducer: Box<dyn MessageReducer>, track_sender: bool) -> Self {
        let identity = reducer.identity();
        Self {
            read: ReduceBuffer::new(node_count, identity, track_sender),
            write: ReduceBuffer::new(node_count, identity, track_sender),
            reducer,
            sent: AtomicBool::new(false),
        }
    }

    pub fn init_iteration(&mut self, _iteration: usize) {
        std::mem::swap(&mut self.read, &mut self.write);
        self.write.reset(self.reducer.identity());
        self.sent.store(false, Ordering::Relaxed);
    }

    pub fn send_to(&self, source: NodeId, target: NodeId, message: f64) {
        let cell = &self.write.values[target as usize];
        let mut current = cell.load(Ordering::Relaxed);
        let message_won = loop {
            let merged = self.reducer.reduce(f64::from_bits(current), message);
            match cell.compare_exchange_weak(
                current,
                merged.to_bits(),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break merged == message,
                Err(observed) => current = observed,
            }
        };
        if message_won {
            if let Some(senders) = &self.write.senders {
                senders[target as usize].store(source, Ordering::Relaxed);
            }
        }
        self.write.present.set(target as usize);
        self.sent.store(true, Ordering::Relaxed);
    }

    pub fn messages_for(&self, node: NodeId) -> Messages<'_> {
        let index = node as usize;
        if !self.read.present.get(index) {
            return Messages::reduced(None, None);
        }
        let value = f64::from_bits(self.read.values[index].load(Ordering::Relaxed));
        let sender = self
            .read
            .senders
            .as_ref()
            .map(|senders| senders[index].load(Ordering::Relaxed));
        Messages::reduced(Some(value), sender)
    }

    pub fn sent_any(&self) -> bool {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn release(&mut self) {
        self.read = ReduceBuffer::new(0, 0.0, false);
        self.write = ReduceBuffer::new(0, 0.0, false);
    }
}

// ============================================================================
// Tests
// ============================================================================
