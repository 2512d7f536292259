//! Resource abstraction layer
//!
//! This module provides a data-driven approach to managing Corral
//! resources. Resource definitions are loaded from JSON files at compile
//! time, allowing new resource kinds to be added without code changes.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource definitions from embedded JSON
//! - [`manager`] - The CRUD+list façade, with transparent pagination
//! - [`patch`] - Builds partial-update documents from CLI tokens
//!
//! # Resource Definitions
//!
//! Resources are defined in JSON files under `src/resources/`:
//! - `nodes.json` - Field devices registered with the service
//! - `chassis.json` - Physical enclosures grouping nodes

pub mod manager;
pub mod patch;
pub mod registry;

pub use manager::{
    extract_json_value, FilterSet, ListOpts, Resource, ResourceManager, SortDir, UpdateMethod,
};
pub use patch::{build_patch, PatchEntry, PatchOp};
pub use registry::{get_all_resource_keys, get_registry, get_resource, ColumnDef, ResourceDef};
