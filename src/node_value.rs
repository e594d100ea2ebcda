//! Dense, schema-typed, per-node storage.
//!
//! One instance lives for exactly one run. Scalar channels are atomic cells
//! so any thread may read while the owning compute task writes; array
//! channels are per-node `RwLock`-guarded slices. Cross-node writes are
//! forbidden by contract — only message sends cross node boundaries — so the
//! owning task never contends on its own cells.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use hashbrown::HashMap;
use parking_lot::RwLock;

use crate::graph::NodeId;
use crate::schema::{DefaultValue, PregelSchema, ValueType};
use crate::{Error, Result};

// ============================================================================
// Channel storage
// ============================================================================

enum Channel {
    Long(Box<[AtomicI64]>),
    /// f64 bit patterns.
    Double(Box<[AtomicU64]>),
    LongArray(Box<[RwLock<Box<[i64]>>]>),
    DoubleArray(Box<[RwLock<Box<[f64]>>]>),
}

impl Channel {
    fn value_type(&self) -> ValueType {
        match self {
            Channel::Long(_) => ValueType::Long,
            Channel::Double(_) => ValueType::Double,
            Channel::LongArray(_) => ValueType::LongArray,
            Channel::DoubleArray(_) => ValueType::DoubleArray,
        }
    }
}

// ============================================================================
// NodeValue
// ============================================================================

/// Per-node values for every channel the computation declared.
pub struct NodeValue {
    schema: PregelSchema,
    channels: HashMap<String, Channel>,
    node_count: usize,
}

impl NodeValue {
    /// Allocate storage for `node_count` nodes, filled with each channel's
    /// declared default (0 / 0.0 / empty array when none is declared).
    pub fn of(schema: &PregelSchema, node_count: usize) -> Result<Self> {
        let mut channels = HashMap::with_capacity(schema.elements().len());
        for element in schema.elements() {
            let channel = match element.value_type {
                ValueType::Long => {
                    let default = match element.default_value {
                        Some(DefaultValue::Long(v)) => v,
                        Some(DefaultValue::Double(_)) => {
                            return Err(type_mismatch(&element.property_key, ValueType::Long, ValueType::Double));
                        }
                        None => 0,
                    };
                    Channel::Long((0..node_count).map(|_| AtomicI64::new(default)).collect())
                }
                ValueType::Double => {
                    let default = match element.default_value {
                        Some(DefaultValue::Double(v)) => v,
                        Some(DefaultValue::Long(_)) => {
                            return Err(type_mismatch(&element.property_key, ValueType::Double, ValueType::Long));
                        }
                        None => 0.0,
                    };
                    let bits = default.to_bits();
                    Channel::Double((0..node_count).map(|_| AtomicU64::new(bits)).collect())
                }
                ValueType::LongArray => Channel::LongArray(
                    (0..node_count).map(|_| RwLock::new(Box::default())).collect(),
                ),
                ValueType::DoubleArray => Channel::DoubleArray(
                    (0..node_count).map(|_| RwLock::new(Box::default())).collect(),
                ),
            };
            channels.insert(element.property_key.clone(), channel);
        }
        Ok(Self { schema: schema.clone(), channels, node_count })
    }

    pub fn schema(&self) -> &PregelSchema {
        &self.schema
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub fn long_value(&self, property_key: &str, node: NodeId) -> Result<i64> {
        match self.channel(property_key)? {
            Channel::Long(cells) => Ok(cells[node as usize].load(Ordering::Relaxed)),
            other => Err(type_mismatch(property_key, ValueType::Long, other.value_type())),
        }
    }

    pub fn double_value(&self, property_key: &str, node: NodeId) -> Result<f64> {
        match self.channel(property_key)? {
            Channel::Double(cells) => {
                Ok(f64::from_bits(cells[node as usize].load(Ordering::Relaxed)))
            }
            other => Err(type_mismatch(property_key, ValueType::Double, other.value_type())),
        }
    }

    pub fn long_array_value(&self, property_key: &str, node: NodeId) -> Result<Vec<i64>> {
        match self.channel(property_key)? {
            Channel::LongArray(cells) => Ok(cells[node as usize].read().to_vec()),
            other => Err(type_mismatch(property_key, ValueType::LongArray, other.value_type())),
        }
    }

    pub fn double_array_value(&self, property_key: &str, node: NodeId) -> Result<Vec<f64>> {
        match self.channel(property_key)? {
            Channel::DoubleArray(cells) => Ok(cells[node as usize].read().to_vec()),
            other => Err(type_mismatch(property_key, ValueType::DoubleArray, other.value_type())),
        }
    }

    // ========================================================================
    // Writes
    // ========================================================================

    pub fn set_long(&self, property_key: &str, node: NodeId, value: i64) -> Result<()> {
        match self.channel(property_key)? {
            Channel::Long(cells) => {
                cells[node as usize].store(value, Ordering::Relaxed);
                Ok(())
            }
            other => Err(type_mismatch(property_key, ValueType::Long, other.value_type())),
        }
    }

    pub fn set_double(&self, property_key: &str, node: NodeId, value: f64) -> Result<()> {
        match self.channel(property_key)? {
            Channel::Double(cells) => {
                cells[node as usize].store(value.to_bits(), Ordering::Relaxed);
                Ok(())
            }
            other => Err(type_mismatch(property_key, ValueType::Double, other.value_type())),
        }
    }

    pub fn set_long_array(&self, property_key: &str, node: NodeId, value: Vec<i64>) -> Result<()> {
        match self.channel(property_key)? {
            Channel::LongArray(cells) => {
                *cells[node as usize].write() = value.into_boxed_slice();
                Ok(())
            }
            other => Err(type_mismatch(property_key, ValueType::LongArray, other.value_type())),
        }
    }

    pub fn set_double_array(&self, property_key: &str, node: NodeId, value: Vec<f64>) -> Result<()> {
        match self.channel(property_key)? {
            Channel::DoubleArray(cells) => {
                *cells[node as usize].write() = value.into_boxed_slice();
                Ok(())
            }
            other => Err(type_mismatch(property_key, ValueType::DoubleArray, other.value_type())),
        }
    }

    // ========================================================================
    // Bulk snapshots (result consumption)
    // ========================================================================

    /// Snapshot a Long channel across all nodes.
    pub fn longs(&self, property_key: &str) -> Result<Vec<i64>> {
        match self.channel(property_key)? {
            Channel::Long(cells) => Ok(cells.iter().map(|c| c.load(Ordering::Relaxed)).collect()),
            other => Err(type_mismatch(property_key, ValueType::Long, other.value_type())),
        }
    }

    /// Snapshot a Double channel across all nodes.
    pub fn doubles(&self, property_key: &str) -> Result<Vec<f64>> {
        match self.channel(property_key)? {
            Channel::Double(cells) => Ok(cells
                .iter()
                .map(|c| f64::from_bits(c.load(Ordering::Relaxed)))
                .collect()),
            other => Err(type_mismatch(property_key, ValueType::Double, other.value_type())),
        }
    }

    fn channel(&self, property_key: &str) -> Result<&Channel> {
        self.channels
            .get(property_key)
            .ok_or_else(|| Error::UnknownProperty(property_key.to_string()))
    }
}

fn type_mismatch(property_key: &str, expected: ValueType, got: ValueType) -> Error {
    Error::PropertyType {
        property: property_key.to_string(),
        expected: expected.name(),
        got: got.name(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PregelSchema;

    fn schema() -> PregelSchema {
        PregelSchema::builder()
            .add("count", ValueType::Long)
            .add_with_default("dist", ValueType::Double, DefaultValue::Double(f64::MAX))
            .add("path", ValueType::LongArray)
            .build()
    }

    #[test]
    fn defaults_applied() {
        let values = NodeValue::of(&schema(), 4).unwrap();
        assert_eq!(values.long_value("count", 2).unwrap(), 0);
        assert_eq!(values.double_value("dist", 0).unwrap(), f64::MAX);
        assert!(values.long_array_value("path", 3).unwrap().is_empty());
    }

    #[test]
    fn set_and_get() {
        let values = NodeValue::of(&schema(), 2).unwrap();
        values.set_long("count", 1, 42).unwrap();
        values.set_double("dist", 0, 1.5).unwrap();
        values.set_long_array("path", 1, vec![3, 2, 1]).unwrap();

        assert_eq!(values.long_value("count", 1).unwrap(), 42);
        assert_eq!(values.double_value("dist", 0).unwrap(), 1.5);
        assert_eq!(values.long_array_value("path", 1).unwrap(), vec![3, 2, 1]);
    }

    #[test]
    fn unknown_property() {
        let values = NodeValue::of(&schema(), 1).unwrap();
        assert!(matches!(
            values.long_value("nope", 0),
            Err(Error::UnknownProperty(_))
        ));
    }

    #[test]
    fn type_mismatch_reported() {
        let values = NodeValue::of(&schema(), 1).unwrap();
        let err = values.double_value("count", 0).unwrap_err();
        assert!(matches!(err, Error::PropertyType { .. }));
    }

    #[test]
    fn mismatched_default_rejected() {
        let schema = PregelSchema::builder()
            .add_with_default("count", ValueType::Long, DefaultValue::Double(0.5))
            .build();
        assert!(NodeValue::of(&schema, 1).is_err());
    }

    #[test]
    fn bulk_snapshot() {
        let values = NodeValue::of(&schema(), 3).unwrap();
        for node in 0..3 {
            values.set_long("count", node, node as i64 * 10).unwrap();
        }
        assert_eq!(values.longs("count").unwrap(), vec![0, 10, 20]);
    }

    /// Two tasks writing to disjoint nodes never tear each other's values.
    #[test]
    fn concurrent_writes_to_distinct_nodes() {
        let schema = PregelSchema::builder().add("v", ValueType::Long).build();
        let values = std::sync::Arc::new(NodeValue::of(&schema, 1024).unwrap());

        std::thread::scope(|scope| {
            for t in 0..4u64 {
                let values = std::sync::Arc::clone(&values);
                scope.spawn(move || {
                    // Distinctive 64-bit patterns per thread; a torn write
                    // would produce a value belonging to neither thread.
                    let pattern = 0x0101_0101_0101_0101i64 * (t as i64 + 1);
                    for node in (t..1024).step_by(4) {
                        for _ in 0..100 {
                            values.set_long("v", node, pattern).unwrap();
                        }
                    }
                });
            }
        });

        for node in 0..1024u64 {
            let expected = 0x0101_0101_0101_0101i64 * ((node % 4) as i64 + 1);
            assert_eq!(values.long_value("v", node).unwrap(), expected);
        }
    }
}
