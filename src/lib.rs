//! # pregel-rs — Vertex-Centric BSP Graph Computation
//!
//! A Pregel-style bulk-synchronous-parallel framework for graph algorithms:
//! partitioned parallel execution, superstep barriers, interchangeable
//! message-passing strategies, per-node vote-to-halt convergence,
//! cooperative cancellation, and ahead-of-time memory budgeting.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `Graph` is the contract to the host's topology;
//!    `PregelComputation` is the contract an algorithm implements
//! 2. **Run-scoped state**: NodeValue, VoteBits, and the Messenger are
//!    created at run start and released at run end — never singletons
//! 3. **Capabilities over hierarchy**: a declared reducer or bidirectional
//!    marker is probed at construction, not expressed by subclassing
//! 4. **Cooperative control**: cancellation is a shared flag observed at
//!    superstep boundaries; a `compute` call is never preempted
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use pregel_rs::{
//!     AdjacencyGraph, ComputeContext, Messages, Pregel, PregelComputation,
//!     PregelConfig, PregelSchema, Result, ValueType,
//! };
//!
//! struct DegreeCount;
//!
//! impl PregelComputation for DegreeCount {
//!     fn schema(&self, _config: &PregelConfig) -> PregelSchema {
//!         PregelSchema::builder().add("degree", ValueType::Long).build()
//!     }
//!
//!     fn compute(
//!         &self,
//!         ctx: &mut ComputeContext<'_>,
//!         _messages: &mut Messages<'_>,
//!     ) -> Result<()> {
//!         let degree = ctx.degree() as i64;
//!         ctx.set_long("degree", degree)?;
//!         ctx.vote_to_halt();
//!         Ok(())
//!     }
//! }
//!
//! # fn main() -> Result<()> {
//! let graph = Arc::new(
//!     AdjacencyGraph::builder(3)
//!         .add_relationship(0, 1)
//!         .add_relationship(0, 2)
//!         .build()?,
//! );
//!
//! let result = Pregel::new(graph, PregelConfig::new(5), DegreeCount)?.run()?;
//!
//! assert!(result.did_converge);
//! assert_eq!(result.node_values.longs("degree")?, vec![2, 0, 0]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Message-Passing Strategies
//!
//! | Strategy | Selected by | Visibility | Memory |
//! |----------|-------------|------------|--------|
//! | Sync queue | default | S+1, exactly once | in-flight messages |
//! | Async queue | `isAsynchronous` | possibly same superstep | in-flight messages |
//! | Reducing | declared reducer | S+1, folded | O(node count) |

// ============================================================================
// Modules
// ============================================================================

pub mod graph;
pub mod schema;
pub mod config;
pub mod computation;
pub mod node_value;
pub mod vote_bits;
pub mod partition;
pub mod messenger;
pub mod context;
pub mod executor;
pub mod mem;

mod compute;

// ============================================================================
// Re-exports: Graph contract
// ============================================================================

pub use graph::{AdjacencyGraph, Graph, GraphBuilder, NodeId};

// ============================================================================
// Re-exports: Computation surface
// ============================================================================

pub use computation::PregelComputation;
pub use config::{Partitioning, PregelConfig};
pub use context::{ComputeContext, InitContext, MasterComputeContext};
pub use schema::{DefaultValue, PregelSchema, ValueType, Visibility};

// ============================================================================
// Re-exports: Runtime
// ============================================================================

pub use executor::{Pregel, PregelResult, Termination};
pub use mem::{memory_estimation, MemoryRange};
pub use messenger::{
    CountReducer, MaxReducer, MessageReducer, Messages, Messenger, MinReducer, SumReducer,
};
pub use node_value::NodeValue;
pub use partition::Partition;
pub use vote_bits::{AtomicBitSet, VoteBits};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, detected at construction, before any superstep.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid topology input (e.g. a relationship endpoint outside the node
    /// id space).
    #[error("Graph error: {0}")]
    Graph(String),

    /// Failure raised by a computation's `init`/`compute`/`master_compute`.
    /// Aborts the run; never retried.
    #[error("Computation error: {0}")]
    Computation(String),

    /// Access to a node-value channel the schema never declared.
    #[error("Unknown node property: {0}")]
    UnknownProperty(String),

    /// Typed access to a channel of a different declared type.
    #[error("Property type error for '{property}': expected {expected}, got {got}")]
    PropertyType {
        property: String,
        expected: &'static str,
        got: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
