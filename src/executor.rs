//! The superstep loop: state machine, cancellation, result assembly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::compute::ComputeStep;
use crate::computation::PregelComputation;
use crate::config::PregelConfig;
use crate::context::MasterComputeContext;
use crate::graph::Graph;
use crate::messenger::Messenger;
use crate::node_value::NodeValue;
use crate::vote_bits::VoteBits;
use crate::{Error, Result};

// ============================================================================
// Result surface
// ============================================================================

/// Why the run stopped. Cancellation is a terminal state of its own, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// All nodes halted with no pending message, or master-compute forced
    /// convergence.
    Converged,
    /// The iteration bound was reached first.
    MaxIterations,
    /// The cooperative cancellation flag was observed at a superstep
    /// boundary.
    Cancelled,
}

/// Produced exactly once per run.
pub struct PregelResult {
    pub node_values: NodeValue,
    pub did_converge: bool,
    pub ran_iterations: usize,
    pub termination: Termination,
}

// ============================================================================
// Pregel executor
// ============================================================================

/// Owns one run: per-run state (NodeValue, VoteBits, Messenger, worker pool)
/// is created here and released when the run exits, on every exit path.
///
/// State machine:
/// `INIT -> (superstep <-> master-compute) -> Converged | MaxIterations | Cancelled`
pub struct Pregel<C: PregelComputation> {
    graph: Arc<dyn Graph>,
    config: PregelConfig,
    computation: C,
    node_value: NodeValue,
    vote_bits: VoteBits,
    messenger: Messenger,
    pool: rayon::ThreadPool,
    cancel: Arc<AtomicBool>,
}

impl<C: PregelComputation> Pregel<C> {
    /// Validate the configuration against graph and computation capabilities,
    /// then allocate all per-run state. Every configuration error surfaces
    /// here, before any superstep runs.
    pub fn new(graph: Arc<dyn Graph>, config: PregelConfig, computation: C) -> Result<Self> {
        config.validate()?;

        let reducer = computation.reducer();
        if computation.is_bidirectional() {
            if reducer.is_some() {
                return Err(Error::Configuration(
                    "a computation cannot combine a message reducer with bidirectional access"
                        .into(),
                ));
            }
            if !graph.is_inverse_indexed() {
                return Err(Error::Configuration(
                    "bidirectional access requires a graph with an inverse index".into(),
                ));
            }
        }
        if config.track_sender && reducer.is_none() {
            return Err(Error::Configuration(
                "trackSender requires the computation to declare a reducer".into(),
            ));
        }

        let node_count = graph.node_count();
        let schema = computation.schema(&config);
        let node_value = NodeValue::of(&schema, node_count)?;
        let vote_bits = VoteBits::new(node_count);
        let messenger = Messenger::for_config(node_count, &config, reducer);

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("pregel-worker-{i}"))
            .build()
            .map_err(|e| Error::Configuration(format!("failed to build worker pool: {e}")))?;

        Ok(Self {
            graph,
            config,
            computation,
            node_value,
            vote_bits,
            messenger,
            pool,
            cancel: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared cooperative cancellation flag. Setting it stops the run at the
    /// next superstep boundary; a `compute` invocation in flight is never
    /// preempted.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Drive supersteps until convergence, the iteration bound, or
    /// cancellation.
    ///
    /// On a computation error the run aborts immediately: node-value
    /// mutations already applied in the failing superstep are kept, the
    /// failure is logged, and the error is returned. No retry.
    pub fn run(mut self) -> Result<PregelResult> {
        self.vote_bits.reset();

        let mut iteration = 0;
        let mut termination = Termination::MaxIterations;

        while iteration < self.config.max_iterations {
            if self.cancel.load(Ordering::Relaxed) {
                debug!(superstep = iteration, "cancellation observed, stopping");
                termination = Termination::Cancelled;
                break;
            }

            debug!(superstep = iteration, "running superstep");
            self.messenger.init_iteration(iteration);

            let step = ComputeStep::new(
                &self.computation,
                &self.config,
                &self.graph,
                &self.node_value,
                &self.vote_bits,
                &self.messenger,
                iteration,
            );
            if let Err(e) = self.pool.install(|| step.run()) {
                error!(superstep = iteration, error = %e, "computation failed, aborting run");
                self.messenger.release();
                return Err(e);
            }

            let mut master_ctx = MasterComputeContext::new(
                iteration,
                &self.config,
                &self.graph,
                &self.node_value,
            );
            let master_converged = match self.computation.master_compute(&mut master_ctx) {
                Ok(converged) => converged,
                Err(e) => {
                    error!(superstep = iteration, error = %e, "master compute failed, aborting run");
                    self.messenger.release();
                    return Err(e);
                }
            };

            iteration += 1;

            if master_converged || (self.vote_bits.all_halted() && !self.messenger.sent_any()) {
                termination = Termination::Converged;
                break;
            }
        }

        self.messenger.release();
        let did_converge = termination == Termination::Converged;
        info!(ran_iterations = iteration, did_converge, "run finished");

        Ok(PregelResult {
            node_values: self.node_value,
            did_converge,
            ran_iterations: iteration,
            termination,
        })
    }
}
