//! Queue-based messengers.
//!
//! Both keep one FIFO queue per target node. The sync variant double-buffers
//! so a send in superstep S becomes visible exactly once, in S+1. The async
//! variant has a single buffer that is drained at read time, so a send can be
//! observed in the superstep it was sent in — opt-in, for computations
//! explicitly tolerant of non-deterministic per-superstep semantics.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::graph::NodeId;
use super::{MessageQueue, Messages};

// ============================================================================
// SyncQueueMessenger
// ============================================================================

/// Double-buffered per-node FIFO queues.
///
/// Sends go to the write buffer, reads come from the read buffer, and
/// `init_iteration` swaps them. Per-sender order is preserved because each
/// sender appends under the target's queue lock.
pub struct SyncQueueMessenger {
    read: Vec<Mutex<MessageQueue>>,
    write: Vec<Mutex<MessageQueue>>,
    sent: AtomicBool,
}

impl SyncQueueMessenger {
    pub fn new(node_count: usize) -> Self {
        Self {
            read: new_queues(node_count),
            write: new_queues(node_count),
            sent: AtomicBool::new(false),
        }
    }

    pub fn init_iteration(&mut self, _iteration: usize) {
        std::mem::swap(&mut self.read, &mut self.write);
        // The new write buffers hold the messages consumed last superstep.
        for queue in &mut self.write {
            queue.get_mut().clear();
        }
        self.sent.store(false, Ordering::Relaxed);
    }

    pub fn send_to(&self, target: NodeId, message: f64) {
        self.write[target as usize].lock().push(message);
        self.sent.store(true, Ordering::Relaxed);
    }

    pub fn messages_for(&self, node: NodeId) -> Messages<'_> {
        Messages::queue(self.read[node as usize].lock())
    }

    pub fn sent_any(&self) -> bool {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn release(&mut self) {
        self.read = Vec::new();
        self.write = Vec::new();
    }
}

// ============================================================================
// AsyncQueueMessenger
// ============================================================================

/// Single-buffered per-node FIFO queues.
///
/// `messages_for` drains whatever has arrived so far; anything sent to a node
/// after it was processed stays queued for the next superstep (the send also
/// reactivates the target, so the message is never stranded).
pub struct AsyncQueueMessenger {
    queues: Vec<Mutex<MessageQueue>>,
    sent: AtomicBool,
}

impl AsyncQueueMessenger {
    pub fn new(node_count: usize) -> Self {
        Self { queues: new_queues(node_count), sent: AtomicBool::new(false) }
    }

    pub fn init_iteration(&mut self, _iteration: usize) {
        // Queues carry over: undrained messages stay deliverable.
        self.sent.store(false, Ordering::Relaxed);
    }

    pub fn send_to(&self, target: NodeId, message: f64) {
        self.queues[target as usize].lock().push(message);
        self.sent.store(true, Ordering::Relaxed);
    }

    pub fn messages_for(&self, node: NodeId) -> Messages<'_> {
        let buffer = std::mem::take(&mut *self.queues[node as usize].lock());
        Messages::drained(buffer)
    }

    pub fn sent_any(&self) -> bool {
        self.sent.load(Ordering::Relaxed)
    }

    pub fn release(&mut self) {
        self.queues = Vec::new();
    }
}

fn new_queues(node_count: usize) -> Vec<Mutex<MessageQueue>> {
    (0..node_count).map(|_| Mutex::new(MessageQueue::new())).collect()
}

// ============================================================================
// Tests
// ============================================================================
