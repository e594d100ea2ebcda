//! Computation schema: the typed node-value channels a computation declares
//! before its run starts.

use serde::{Deserialize, Serialize};

// ============================================================================
// Value types
// ============================================================================

/// Type of a single node-value channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Long,
    Double,
    LongArray,
    DoubleArray,
}

impl ValueType {
    pub fn name(&self) -> &'static str {
        match self {
            ValueType::Long => "Long",
            ValueType::Double => "Double",
            ValueType::LongArray => "LongArray",
            ValueType::DoubleArray => "DoubleArray",
        }
    }
}

/// Initial value a channel is filled with before superstep 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Long(i64),
    Double(f64),
}

// ============================================================================
// Visibility
// ============================================================================

/// Whether a channel is part of the result surface or working storage.
///
/// Private channels exist for the computation's own bookkeeping; result
/// consumers should skip them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Private,
}

// ============================================================================
// Schema
// ============================================================================

/// One declared channel.
#[derive(Debug, Clone)]
pub struct Element {
    pub property_key: String,
    pub value_type: ValueType,
    pub visibility: Visibility,
    pub default_value: Option<DefaultValue>,
}

/// The full set of channels for one computation run.
#[derive(Debug, Clone, Default)]
pub struct PregelSchema {
    elements: Vec<Element>,
}

impl PregelSchema {
    pub fn builder() -> PregelSchemaBuilder {
        PregelSchemaBuilder::default()
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn element(&self, property_key: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.property_key == property_key)
    }
}

/// Builder for `PregelSchema`. Re-adding a key overwrites the earlier
/// declaration.
#[derive(Debug, Default)]
pub struct PregelSchemaBuilder {
    elements: Vec<Element>,
}

impl PregelSchemaBuilder {
    /// Declare a public channel.
    pub fn add(self, property_key: impl Into<String>, value_type: ValueType) -> Self {
        self.add_with(property_key, value_type, Visibility::Public, None)
    }

    /// Declare a private (working-storage) channel.
    pub fn add_private(self, property_key: impl Into<String>, value_type: ValueType) -> Self {
        self.add_with(property_key, value_type, Visibility::Private, None)
    }

    /// Declare a public channel with an initial fill value.
    pub fn add_with_default(
        self,
        property_key: impl Into<String>,
        value_type: ValueType,
        default_value: DefaultValue,
    ) -> Self {
        self.add_with(property_key, value_type, Visibility::Public, Some(default_value))
    }

    fn add_with(
        mut self,
        property_key: impl Into<String>,
        value_type: ValueType,
        visibility: Visibility,
        default_value: Option<DefaultValue>,
    ) -> Self {
        let property_key = property_key.into();
        self.elements.retain(|e| e.property_key != property_key);
        self.elements.push(Element { property_key, value_type, visibility, default_value });
        self
    }

    pub fn build(self) -> PregelSchema {
        PregelSchema { elements: self.elements }
    }
}

// ============================================================================
// Tests
// ============================================================================
