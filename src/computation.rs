//! The contract a concrete algorithm implements.

use crate::config::PregelConfig;
use crate::context::{ComputeContext, InitContext, MasterComputeContext};
use crate::messenger::{MessageReducer, Messages};
use crate::schema::PregelSchema;
use crate::Result;

/// A vertex-centric computation.
///
/// The framework calls `schema` once before the run, `init` once per node in
/// the first superstep, `compute` once per active node per superstep, and
/// `master_compute` single-threaded after each superstep's parallel phase.
///
/// Optional capabilities are probed at construction instead of expressed as
/// a class hierarchy: a declared `reducer` selects the reducing messenger,
/// and `is_bidirectional` requests reverse-neighbor iteration (which
/// requires an inverse-indexed graph — checked before any superstep runs).
pub trait PregelComputation: Send + Sync {
    /// Declare the node-value channels this computation reads and writes.
    fn schema(&self, config: &PregelConfig) -> PregelSchema;

    /// Per-node setup, invoked in the first superstep before `compute`.
    fn init(&self, ctx: &mut InitContext<'_>) -> Result<()> {
        let _ = ctx;
        Ok(())
    }

    /// The per-node kernel. Runs exactly once per active node per superstep.
    fn compute(&self, ctx: &mut ComputeContext<'_>, messages: &mut Messages<'_>) -> Result<()>;

    /// Global hook after each superstep. Returning `Ok(true)` forces
    /// convergence regardless of per-node votes.
    fn master_compute(&self, ctx: &mut MasterComputeContext<'_>) -> Result<bool> {
        let _ = ctx;
        Ok(false)
    }

    /// Associative, commutative message combiner. Declaring one switches the
    /// run to the reducing messenger.
    fn reducer(&self) -> Option<Box<dyn MessageReducer>> {
        None
    }

    /// Whether `compute` iterates reverse neighbors.
    fn is_bidirectional(&self) -> bool {
        false
    }
}
