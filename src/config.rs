//! Run configuration.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================================
// Partitioning
// ============================================================================

/// How the node-id space is split across worker tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Partitioning {
    /// `concurrency` contiguous ranges, fixed up front. Best for graphs with
    /// uniform degree distribution.
    Range,
    /// Ranges halved recursively down to a batch threshold so idle workers
    /// can steal. Best for skewed degree distributions.
    Auto,
}

impl Default for Partitioning {
    fn default() -> Self {
        Partitioning::Range
    }
}

// ============================================================================
// PregelConfig
// ============================================================================

/// Configuration for one computation run.
///
/// `max_iterations` is the only required field; everything else has the
/// conventional default. Deserializable so host products can pass
/// user-supplied option maps straight through.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PregelConfig {
    /// Hard bound on the number of supersteps.
    pub max_iterations: usize,

    /// Number of worker threads running compute-step tasks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Select the async-queue messenger when no reducer is declared.
    ///
    /// Opt-in: messages may become visible in the superstep they were sent
    /// in, so per-superstep semantics are non-deterministic.
    #[serde(default)]
    pub is_asynchronous: bool,

    #[serde(default)]
    pub partitioning: Partitioning,

    /// With a reducing messenger, also record which neighbor contributed the
    /// surviving message. Best effort under concurrent sends.
    #[serde(default)]
    pub track_sender: bool,
}

fn default_concurrency() -> usize {
    4
}

impl PregelConfig {
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            concurrency: default_concurrency(),
            is_asynchronous: false,
            partitioning: Partitioning::default(),
            track_sender: false,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_asynchronous(mut self, asynchronous: bool) -> Self {
        self.is_asynchronous = asynchronous;
        self
    }

    pub fn with_partitioning(mut self, partitioning: Partitioning) -> Self {
        self.partitioning = partitioning;
        self
    }

    pub fn with_track_sender(mut self, track_sender: bool) -> Self {
        self.track_sender = track_sender;
        self
    }

    /// Validate the options that don't depend on graph or computation.
    /// The cross-cutting checks (reducer, bidirectional) live in the
    /// executor's constructor.
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Configuration("concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = PregelConfig::new(10);
        assert_eq!(config.concurrency, 4);
        assert!(!config.is_asynchronous);
        assert_eq!(config.partitioning, Partitioning::Range);
        assert!(!config.track_sender);
    }

    #[test]
    fn zero_concurrency_rejected() {
        let config = PregelConfig::new(10).with_concurrency(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn deserializes_from_option_map() {
        let config: PregelConfig = serde_json::from_str(
            r#"{"maxIterations": 20, "partitioning": "AUTO", "isAsynchronous": true}"#,
        )
        .unwrap();

        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.partitioning, Partitioning::Auto);
        assert!(config.is_asynchronous);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn serde_round_trip() {
        let config = PregelConfig::new(5)
            .with_concurrency(8)
            .with_partitioning(Partitioning::Auto);
        let json = serde_json::to_string(&config).unwrap();
        let back: PregelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.max_iterations, back.max_iterations);
        assert_eq!(config.concurrency, back.concurrency);
        assert_eq!(config.partitioning, back.partitioning);
    }
}
