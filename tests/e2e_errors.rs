//! Configuration errors surface before any superstep; computation errors
//! abort the run without retry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pregel_rs::{
    AdjacencyGraph, ComputeContext, Error, Graph, MasterComputeContext, MessageReducer, Messages,
    Pregel, PregelComputation, PregelConfig, PregelSchema, Result, SumReducer, ValueType,
};

fn two_cycle(inverse_indexed: bool) -> Arc<dyn Graph> {
    Arc::new(
        AdjacencyGraph::builder(2)
            .add_relationship(0, 1)
            .add_relationship(1, 0)
            .inverse_indexed(inverse_indexed)
            .build()
            .unwrap(),
    )
}

// ============================================================================
// Capability probes
// ============================================================================

struct Bidirectional {
    with_reducer: bool,
}

impl PregelComputation for Bidirectional {
    fn schema(&self, _config: &PregelConfig) -> PregelSchema {
        PregelSchema::builder().add("in_degree", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>, _messages: &mut Messages<'_>) -> Result<()> {
        let mut in_degree = 0;
        ctx.for_each_inverse_neighbor(|_| in_degree += 1);
        ctx.set_long("in_degree", in_degree)?;
        ctx.vote_to_halt();
        Ok(())
    }

    fn reducer(&self) -> Option<Box<dyn MessageReducer>> {
        self.with_reducer.then(|| Box::new(SumReducer) as Box<dyn MessageReducer>)
    }

    fn is_bidirectional(&self) -> bool {
        true
    }
}

#[test]
fn bidirectional_without_inverse_index_is_a_configuration_error() {
    let result = Pregel::new(
        two_cycle(false),
        PregelConfig::new(5),
        Bidirectional { with_reducer: false },
    );
    assert!(matches!(result.err(), Some(Error::Configuration(_))));
}

#[test]
fn bidirectional_with_reducer_is_rejected() {
    let result = Pregel::new(
        two_cycle(true),
        PregelConfig::new(5),
        Bidirectional { with_reducer: true },
    );
    assert!(matches!(result.err(), Some(Error::Configuration(_))));
}

#[test]
fn bidirectional_on_an_inverse_indexed_graph_works() {
    let graph: Arc<dyn Graph> = Arc::new(
        AdjacencyGraph::builder(3)
            .add_relationship(0, 2)
            .add_relationship(1, 2)
            .inverse_indexed(true)
            .build()
            .unwrap(),
    );
    let result = Pregel::new(graph, PregelConfig::new(5), Bidirectional { with_reducer: false })
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(result.node_values.longs("in_degree").unwrap(), vec![0, 0, 2]);
}

struct Trivial;

impl PregelComputation for Trivial {
    fn schema(&self, _config: &PregelConfig) -> PregelSchema {
        PregelSchema::builder().add("unused", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>, _messages: &mut Messages<'_>) -> Result<()> {
        ctx.vote_to_halt();
        Ok(())
    }
}

#[test]
fn track_sender_without_reducer_is_rejected() {
    let config = PregelConfig::new(5).with_track_sender(true);
    let result = Pregel::new(two_cycle(false), config, Trivial);
    assert!(matches!(result.err(), Some(Error::Configuration(_))));
}

#[test]
fn zero_concurrency_is_rejected() {
    let config = PregelConfig::new(5).with_concurrency(0);
    let result = Pregel::new(two_cycle(false), config, Trivial);
    assert!(matches!(result.err(), Some(Error::Configuration(_))));
}

// ============================================================================
// Computation errors abort the run
// ============================================================================

struct FailsAt {
    superstep: usize,
    masters_ran: Arc<AtomicUsize>,
}

impl PregelComputation for FailsAt {
    fn schema(&self, _config: &PregelConfig) -> PregelSchema {
        PregelSchema::builder().add("unused", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>, _messages: &mut Messages<'_>) -> Result<()> {
        if ctx.superstep() == self.superstep {
            return Err(Error::Computation("deliberate failure".into()));
        }
        Ok(())
    }

    fn master_compute(&self, _ctx: &mut MasterComputeContext<'_>) -> Result<bool> {
        self.masters_ran.fetch_add(1, Ordering::SeqCst);
        Ok(false)
    }
}

#[test]
fn compute_error_aborts_without_retry() {
    let masters_ran = Arc::new(AtomicUsize::new(0));
    let computation = FailsAt { superstep: 2, masters_ran: Arc::clone(&masters_ran) };
    let result = Pregel::new(two_cycle(false), PregelConfig::new(10), computation)
        .unwrap()
        .run();

    assert!(matches!(result.err(), Some(Error::Computation(_))));
    // Supersteps 0 and 1 completed their master phase; the failing superstep
    // never reached it and nothing ran again.
    assert_eq!(masters_ran.load(Ordering::SeqCst), 2);
}

struct MasterFails;

impl PregelComputation for MasterFails {
    fn schema(&self, _config: &PregelConfig) -> PregelSchema {
        PregelSchema::builder().add("unused", ValueType::Long).build()
    }

    fn compute(&self, _ctx: &mut ComputeContext<'_>, _messages: &mut Messages<'_>) -> Result<()> {
        Ok(())
    }

    fn master_compute(&self, _ctx: &mut MasterComputeContext<'_>) -> Result<bool> {
        Err(Error::Computation("master failure".into()))
    }
}

#[test]
fn master_compute_error_aborts_the_run() {
    let result = Pregel::new(two_cycle(false), PregelConfig::new(10), MasterFails)
        .unwrap()
        .run();
    assert!(matches!(result.err(), Some(Error::Computation(_))));
}

// ============================================================================
// Schema misuse from inside compute
// ============================================================================

struct WrongProperty;

impl PregelComputation for WrongProperty {
    fn schema(&self, _config: &PregelConfig) -> PregelSchema {
        PregelSchema::builder().add("value", ValueType::Long).build()
    }

    fn compute(&self, ctx: &mut ComputeContext<'_>, _messages: &mut Messages<'_>) -> Result<()> {
        ctx.set_long("undeclared", 1)
    }
}

#[test]
fn undeclared_property_access_fails_the_run() {
    let result = Pregel::new(two_cycle(false), PregelConfig::new(5), WrongProperty)
        .unwrap()
        .run();
    assert!(matches!(result.err(), Some(Error::UnknownProperty(_))));
}
