//! Tool input schemas.
//!
//! Backends only understand a small JSON-Schema subset for tool parameters:
//! a flat object of string (optionally enum) properties. [`InputSchema`]
//! models exactly that subset so a tool cannot publish anything richer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameters accepted by a tool, as published to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub required: Vec<String>,
    pub properties: BTreeMap<String, PropertySchema>,
}

/// A single parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: String,
    pub description: String,
    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl InputSchema {
    /// An object schema with no properties.
    pub fn object() -> Self {
        Self {
            schema_type: "object".to_string(),
            required: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Add a string property the model must always supply.
    pub fn required_string(mut self, name: &str, description: &str) -> Self {
        self.required.push(name.to_string());
        self.optional_string(name, description)
    }

    /// Add a string property the model may omit.
    pub fn optional_string(mut self, name: &str, description: &str) -> Self {
        self.properties.insert(
            name.to_string(),
            PropertySchema {
                property_type: "string".to_string(),
                description: description.to_string(),
                enum_values: Vec::new(),
            },
        );
        self
    }

    /// Add a required string property restricted to `values`.
    pub fn required_enum(mut self, name: &str, description: &str, values: &[&str]) -> Self {
        self.required.push(name.to_string());
        self.properties.insert(
            name.to_string(),
            PropertySchema {
                property_type: "string".to_string(),
                description: description.to_string(),
                enum_values: values.iter().map(|v| v.to_string()).collect(),
            },
        );
        self
    }
}
