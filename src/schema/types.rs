//! Core schema type definitions for plan documents.
//!
//! A schema is a tree of attribute definitions. The format is deliberately
//! small: a type, whether the attribute is an array, whether it is required,
//! and, for complex attributes, the nested definitions.

use serde::{Deserialize, Serialize};

/// A plan schema definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Unique schema identifier
    pub id: String,
    /// Human-readable schema name
    pub name: String,
    /// Schema description
    #[serde(default)]
    pub description: String,
    /// Top-level attribute definitions
    pub attributes: Vec<AttributeDefinition>,
}

/// Definition of a single attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDefinition {
    /// Attribute name as it appears in the document
    pub name: String,
    /// Data type of the attribute (of each element, when multi-valued)
    #[serde(rename = "type")]
    pub data_type: AttributeType,
    /// Whether the attribute is an array
    #[serde(default)]
    pub multi_valued: bool,
    /// Whether the attribute must be present and non-null
    #[serde(default)]
    pub required: bool,
    /// Nested definitions for complex types
    #[serde(default)]
    pub sub_attributes: Vec<AttributeDefinition>,
}

impl Default for AttributeDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            data_type: AttributeType::String,
            multi_valued: false,
            required: false,
            sub_attributes: Vec::new(),
        }
    }
}

/// Attribute data types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    /// String value
    #[default]
    String,
    /// Boolean value
    Boolean,
    /// Any JSON number
    Decimal,
    /// Whole number representable as a signed 64-bit integer
    Integer,
    /// Object with sub-attributes
    Complex,
}

impl AttributeType {
    /// Name used in violation messages.
    pub fn expected_name(self) -> &'static str {
        match self {
            AttributeType::String => "string",
            AttributeType::Boolean => "boolean",
            AttributeType::Decimal => "number",
            AttributeType::Integer => "integer",
            AttributeType::Complex => "object",
        }
    }
}
