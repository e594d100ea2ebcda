//! # Inter-superstep message delivery
//!
//! Three interchangeable strategies with different memory/ordering
//! tradeoffs:
//!
//! | Strategy | Module | Visibility | Memory |
//! |----------|--------|------------|--------|
//! | `SyncQueueMessenger` | `queue` | S+1, exactly once | in-flight messages |
//! | `AsyncQueueMessenger` | `queue` | possibly same superstep | in-flight messages |
//! | `ReducingMessenger` | `reducing` | S+1, folded | O(node_count) |
//!
//! Selection is config-driven: a computation-declared reducer picks the
//! reducing strategy; otherwise `is_asynchronous` chooses between the two
//! queues. The strategy is fixed for a whole run, so it is a tagged variant
//! rather than a trait object.

pub mod queue;
pub mod reducing;

use parking_lot::MutexGuard;
use smallvec::SmallVec;

use crate::config::PregelConfig;
use crate::graph::NodeId;

pub use queue::{AsyncQueueMessenger, SyncQueueMessenger};
pub use reducing::{
    CountReducer, MaxReducer, MessageReducer, MinReducer, ReducingMessenger, SumReducer,
};

/// Inline capacity of per-node message queues. Most nodes see only a few
/// messages per superstep, so those stay off the heap.
pub(crate) const QUEUE_INLINE_MESSAGES: usize = 4;

pub(crate) type MessageQueue = SmallVec<[f64; QUEUE_INLINE_MESSAGES]>;

// ============================================================================
// Messenger
// ============================================================================

/// Message delivery for one run, polymorphic over the three strategies.
pub enum Messenger {
    SyncQueue(SyncQueueMessenger),
    AsyncQueue(AsyncQueueMessenger),
    Reducing(ReducingMessenger),
}

impl Messenger {
    /// Pick the strategy for this run.
    pub fn for_config(
        node_count: usize,
        config: &PregelConfig,
        reducer: Option<Box<dyn MessageReducer>>,
    ) -> Self {
        match reducer {
            Some(reducer) => Messenger::Reducing(ReducingMessenger::new(
                node_count,
                reducer,
                config.track_sender,
            )),
            None if config.is_asynchronous => {
                Messenger::AsyncQueue(AsyncQueueMessenger::new(node_count))
            }
            None => Messenger::SyncQueue(SyncQueueMessenger::new(node_count)),
        }
    }

    /// Prepare the inbox for `iteration` while keeping the previous
    /// superstep's messages readable. Runs between supersteps, never
    /// concurrently with sends.
    pub fn init_iteration(&mut self, iteration: usize) {
        match self {
            Messenger::SyncQueue(m) => m.init_iteration(iteration),
            Messenger::AsyncQueue(m) => m.init_iteration(iteration),
            Messenger::Reducing(m) => m.init_iteration(iteration),
        }
    }

    /// Deliver `message` from `source` to `target`. Callable concurrently
    /// from any compute task, for any target.
    pub fn send_to(&self, source: NodeId, target: NodeId, message: f64) {
        match self {
            Messenger::SyncQueue(m) => m.send_to(target, message),
            Messenger::AsyncQueue(m) => m.send_to(target, message),
            Messenger::Reducing(m) => m.send_to(source, target, message),
        }
    }

    /// The current superstep's inbound messages for `node`: lazy, finite,
    /// single pass.
    pub fn messages_for(&self, node: NodeId) -> Messages<'_> {
        match self {
            Messenger::SyncQueue(m) => m.messages_for(node),
            Messenger::AsyncQueue(m) => m.messages_for(node),
            Messenger::Reducing(m) => m.messages_for(node),
        }
    }

    /// Whether any message was sent since the last `init_iteration`. Feeds
    /// the global convergence check.
    pub fn sent_any(&self) -> bool {
        match self {
            Messenger::SyncQueue(m) => m.sent_any(),
            Messenger::AsyncQueue(m) => m.sent_any(),
            Messenger::Reducing(m) => m.sent_any(),
        }
    }

    /// Drop all message buffers. The messenger is unusable afterwards.
    pub fn release(&mut self) {
        match self {
            Messenger::SyncQueue(m) => m.release(),
            Messenger::AsyncQueue(m) => m.release(),
            Messenger::Reducing(m) => m.release(),
        }
    }
}

// ============================================================================
// Messages
// ============================================================================

/// Single-pass iterator over one node's inbound messages.
pub struct Messages<'a> {
    inner: MessagesInner<'a>,
}

enum MessagesInner<'a> {
    /// Sync queue: reads under the node's queue lock. Senders target the
    /// other buffer, so the lock is uncontended during compute.
    Queue { guard: MutexGuard<'a, MessageQueue>, next: usize },
    /// Async queue: snapshot drained out of the shared buffer at read time.
    Drained { buffer: MessageQueue, next: usize },
    /// Reducing: at most one folded value.
    Reduced { value: Option<f64>, sender: Option<NodeId> },
}

impl<'a> Messages<'a> {
    pub(crate) fn queue(guard: MutexGuard<'a, MessageQueue>) -> Self {
        Self { inner: MessagesInner::Queue { guard, next: 0 } }
    }

    pub(crate) fn drained(buffer: MessageQueue) -> Self {
        Self { inner: MessagesInner::Drained { buffer, next: 0 } }
    }

    pub(crate) fn reduced(value: Option<f64>, sender: Option<NodeId>) -> Self {
        Self { inner: MessagesInner::Reduced { value, sender } }
    }

    /// True when no (further) message is available.
    pub fn is_empty(&self) -> bool {
        match &self.inner {
            MessagesInner::Queue { guard, next } => guard.len() <= *next,
            MessagesInner::Drained { buffer, next } => buffer.len() <= *next,
            MessagesInner::Reduced { value, .. } => value.is_none(),
        }
    }

    /// The node that contributed the surviving message, when the reducing
    /// messenger runs with sender tracking. `None` for queue strategies.
    pub fn sender(&self) -> Option<NodeId> {
        match &self.inner {
            MessagesInner::Reduced { sender, .. } => *sender,
            _ => None,
        }
    }
}

impl Iterator for Messages<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        match &mut self.inner {
            MessagesInner::Queue { guard, next } => {
                let value = guard.get(*next).copied();
                *next += 1;
                value
            }
            MessagesInner::Drained { buffer, next } => {
                let value = buffer.get(*next).copied();
                *next += 1;
                value
            }
            MessagesInner::Reduced { value, .. } => value.take(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PregelConfig;

    #[test]
    fn strategy_selection() {
        let sync = Messenger::for_config(4, &PregelConfig::new(1), None);
        assert!(matches!(sync, Messenger::SyncQueue(_)));

        let config = PregelConfig::new(1).with_asynchronous(true);
        let asynchronous = Messenger::for_config(4, &config, None);
        assert!(matches!(asynchronous, Messenger::AsyncQueue(_)));

        let reducing = Messenger::for_config(4, &PregelConfig::new(1), Some(Box::new(SumReducer)));
        assert!(matches!(reducing, Messenger::Reducing(_)));
    }

    #[test]
    fn reducer_takes_precedence_over_async_flag() {
        let config = PregelConfig::new(1).with_asynchronous(true);
        let messenger = Messenger::for_config(4, &config, Some(Box::new(MinReducer)));
        assert!(matches!(messenger, Messenger::Reducing(_)));
    }

    #[test]
    fn reduced_messages_yield_once() {
        let mut messages = Messages::reduced(Some(2.5), None);
        assert!(!messages.is_empty());
        assert_eq!(messages.next(), Some(2.5));
        assert_eq!(messages.next(), None);
        assert!(messages.is_empty());
    }
}
