//! Resource Registry - Load resource definitions from JSON
//!
//! This module loads all Corral resource definitions from embedded JSON
//! files and provides lookup functions for the rest of the client. A
//! definition is the single source of truth for a resource kind: its
//! collection path, known field set, table columns, sortable fields, and
//! the allow-list of attributes accepted at creation.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::Error;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[
    include_str!("../resources/nodes.json"),
    include_str!("../resources/chassis.json"),
];

/// Column definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDef {
    pub header: String,
    pub json_path: String,
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    /// Singular display name, e.g. "Node"
    pub display_name: String,
    /// Collection path segment, e.g. "nodes"
    pub collection: String,
    /// Field carrying the server-assigned identity
    pub id_field: String,
    /// Field carrying the human-facing name
    pub name_field: String,
    /// Every field the server may return for this kind
    pub fields: Vec<String>,
    /// Columns for plain list output
    pub default_columns: Vec<ColumnDef>,
    /// Columns for detail list / show output
    pub detail_columns: Vec<ColumnDef>,
    /// Fields the server accepts as sort keys
    pub sort_fields: Vec<String>,
    /// Attributes accepted when creating a resource; anything else is
    /// dropped before the request is built
    pub creation_attributes: Vec<String>,
}

impl ResourceDef {
    /// Whether `field` is part of this kind's known field set
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    /// Reject any requested field that is not in the known field set
    pub fn check_fields(&self, requested: &[String]) -> Result<(), Error> {
        let unknown: Vec<&str> = requested
            .iter()
            .filter(|f| !self.has_field(f))
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidAttribute(format!(
                "unknown {} field(s): {}",
                self.display_name.to_lowercase(),
                unknown.join(", ")
            )))
        }
    }

    /// Reject a sort key the server does not support
    pub fn check_sort_key(&self, sort_key: &str) -> Result<(), Error> {
        if self.sort_fields.iter().any(|f| f == sort_key) {
            Ok(())
        } else {
            Err(Error::InvalidAttribute(format!(
                "'{}' is not a sortable {} field",
                sort_key,
                self.display_name.to_lowercase()
            )))
        }
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceConfig {
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig {
            resources: HashMap::new(),
        };

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get a resource definition by key
pub fn get_resource(key: &str) -> Option<&'static ResourceDef> {
    get_registry().resources.get(key)
}

/// Get all resource keys
pub fn get_all_resource_keys() -> Vec<&'static str> {
    get_registry()
        .resources
        .keys()
        .map(|s| s.as_str())
        .collect()
}
