//! Resource Manager
//!
//! Generic CRUD+list façade over one Corral collection. Hides pagination
//! and patch encoding from callers; validation that can fail locally
//! (unknown fields, illegal flag combinations) happens before any request
//! is sent.

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use super::patch::PatchEntry;
use super::registry::{get_resource, ResourceDef};
use crate::api::client::Client;
use crate::error::Error;

/// One remote entity as a field-name → value mapping.
///
/// Built from a single JSON object returned by the server; never mutated
/// in place. Updates produce a new `Resource` from a new response.
#[derive(Debug, Clone)]
pub struct Resource {
    fields: Map<String, Value>,
}

impl Resource {
    /// Wrap one response object; anything but a JSON object is a
    /// contract violation
    pub fn from_json(value: Value, def: &ResourceDef) -> Result<Self, Error> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(Error::Protocol(format!(
                "expected a {} object, got: {}",
                def.display_name.to_lowercase(),
                other
            ))),
        }
    }

    /// Read one field
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field view of the whole resource
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Human-readable rendering of a dot-notation path
    pub fn display(&self, path: &str) -> String {
        extract_json_value(&Value::Object(self.fields.clone()), path)
    }
}

/// Extract a value from JSON using a dot-notation path
pub fn extract_json_value(item: &Value, path: &str) -> String {
    let parts: Vec<&str> = path.split('.').collect();
    let mut current = item;

    for part in parts {
        // Handle array index
        if let Ok(idx) = part.parse::<usize>() {
            current = match current.get(idx) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        } else {
            current = match current.get(part) {
                Some(v) => v,
                None => return "-".to_string(),
            };
        }
    }

    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "-".to_string(),
        compound => serde_json::to_string(compound).unwrap_or_else(|_| "-".to_string()),
    }
}

/// Sort direction for list requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl fmt::Display for SortDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDir::Asc => write!(f, "asc"),
            SortDir::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDir {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDir::Asc),
            "desc" => Ok(SortDir::Desc),
            other => Err(Error::InvalidAttribute(format!(
                "sort direction must be 'asc' or 'desc', got '{other}'"
            ))),
        }
    }
}

/// Ordered query constraints for one request.
///
/// One slot per key: setting a key that is already present overwrites it,
/// so a filter set never carries duplicates.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    pairs: Vec<(&'static str, String)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a constraint; last write per key wins
    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        let value = value.into();
        if let Some(pair) = self.pairs.iter_mut().find(|(k, _)| *k == key) {
            pair.1 = value;
        } else {
            self.pairs.push((key, value));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Assemble the query string, percent-encoding values
    pub fn to_query(&self) -> String {
        self.pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Options for a list request
#[derive(Debug, Clone, Default)]
pub struct ListOpts {
    /// Identifier of the last item of a previous page; results continue
    /// after it
    pub marker: Option<String>,
    /// None: one request at the server's default cap. Some(0): fetch the
    /// whole collection. Some(n): at most n items total.
    pub limit: Option<u32>,
    /// Ask for the detailed representation
    pub detail: bool,
    pub sort_key: Option<String>,
    pub sort_dir: Option<SortDir>,
    /// Subset of fields to fetch; mutually exclusive with `detail`
    pub fields: Option<Vec<String>>,
    /// Restrict to one project
    pub project: Option<String>,
}

/// HTTP method used for partial updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMethod {
    #[default]
    Patch,
    Put,
}

/// CRUD+list façade for one resource collection
pub struct ResourceManager<'a> {
    client: &'a Client,
    def: &'static ResourceDef,
    /// Static lowercase kind name for error messages
    kind: &'static str,
}

impl<'a> ResourceManager<'a> {
    /// Create a manager for a registered resource kind
    pub fn new(client: &'a Client, key: &str) -> Result<Self, Error> {
        let def = get_resource(key)
            .ok_or_else(|| Error::InvalidAttribute(format!("unknown resource kind '{key}'")))?;

        // The registry is static, so the display name can be borrowed for
        // the lifetime of the program
        let kind: &'static str = match key {
            "nodes" => "node",
            "chassis" => "chassis",
            _ => "resource",
        };

        Ok(Self { client, def, kind })
    }

    /// Definition backing this manager
    pub fn def(&self) -> &'static ResourceDef {
        self.def
    }

    /// Fetch a single resource by name or UUID
    pub async fn get(&self, id: &str, fields: Option<&[String]>) -> Result<Resource, Error> {
        self.check_id(id)?;
        if let Some(fields) = fields {
            self.def.check_fields(fields)?;
        }

        let mut path = self.resource_path(id);
        if let Some(fields) = fields {
            let mut filters = FilterSet::new();
            filters.set("fields", fields.join(","));
            path = format!("{}?{}", path, filters.to_query());
        }

        let body = self
            .client
            .get(&path)
            .await
            .map_err(|f| f.into_error(self.kind, id))?;

        Resource::from_json(body, self.def)
    }

    /// List resources, paginating transparently when a limit is given
    pub async fn list(&self, opts: &ListOpts) -> Result<Vec<Resource>, Error> {
        if opts.detail && opts.fields.is_some() {
            return Err(Error::InvalidAttribute(
                "can't fetch a subset of fields with 'detail' set".to_string(),
            ));
        }
        if let Some(fields) = &opts.fields {
            self.def.check_fields(fields)?;
        }
        if let Some(sort_key) = &opts.sort_key {
            self.def.check_sort_key(sort_key)?;
        }

        match opts.limit {
            // Let the server apply its own default cap in one request
            None => self.fetch_page(&self.list_path(opts, None, opts.marker.as_deref())).await,
            Some(limit) => self.list_paginated(opts, limit).await,
        }
    }

    /// Create a resource from the given attribute mapping.
    ///
    /// Keys outside the kind's creation allow-list are dropped before the
    /// request body is built; this narrowing is deliberate, not an error.
    pub async fn create(&self, fields: Map<String, Value>) -> Result<Resource, Error> {
        let name = fields
            .get(&self.def.name_field)
            .and_then(Value::as_str)
            .unwrap_or(&self.def.collection)
            .to_string();

        let body: Map<String, Value> = fields
            .into_iter()
            .filter(|(key, _)| self.def.creation_attributes.iter().any(|a| a == key))
            .collect();

        let value = self
            .client
            .post(&self.def.collection, Some(&Value::Object(body)))
            .await
            .map_err(|f| f.into_error(self.kind, &name))?;

        Resource::from_json(value, self.def)
    }

    /// Apply a non-empty patch document to a resource
    pub async fn update(
        &self,
        id: &str,
        patch: &[PatchEntry],
        method: UpdateMethod,
    ) -> Result<Resource, Error> {
        self.check_id(id)?;
        if patch.is_empty() {
            return Err(Error::InvalidAttribute("empty patch document".to_string()));
        }

        let path = self.resource_path(id);
        let body = serde_json::to_value(patch)
            .map_err(|e| Error::Protocol(format!("unserializable patch: {e}")))?;

        let value = match method {
            UpdateMethod::Patch => self.client.patch(&path, &body).await,
            UpdateMethod::Put => self.client.put(&path, &body).await,
        }
        .map_err(|f| f.into_error(self.kind, id))?;

        Resource::from_json(value, self.def)
    }

    /// Delete a resource. Not idempotent: deleting an already-deleted
    /// identifier fails with NotFound.
    pub async fn delete(&self, id: &str) -> Result<(), Error> {
        self.check_id(id)?;

        self.client
            .delete(&self.resource_path(id))
            .await
            .map_err(|f| f.into_error(self.kind, id))?;

        Ok(())
    }

    /// Drive a state sub-resource, e.g. `state/power`
    pub async fn set_state(&self, id: &str, subpath: &str, body: Value) -> Result<(), Error> {
        self.check_id(id)?;

        let path = format!("{}/{}", self.resource_path(id), subpath);
        self.client
            .put(&path, &body)
            .await
            .map_err(|f| f.into_error(self.kind, id))?;

        Ok(())
    }

    fn check_id(&self, id: &str) -> Result<(), Error> {
        if id.trim().is_empty() {
            return Err(Error::InvalidAttribute(format!(
                "{} identifier must not be empty",
                self.kind
            )));
        }
        Ok(())
    }

    fn resource_path(&self, id: &str) -> String {
        format!("{}/{}", self.def.collection, urlencoding::encode(id))
    }

    /// Build the list request path: `detail` segment XOR plain collection,
    /// plus the assembled filter query
    fn list_path(&self, opts: &ListOpts, page_limit: Option<u32>, marker: Option<&str>) -> String {
        let mut filters = FilterSet::new();
        if let Some(marker) = marker {
            filters.set("marker", marker);
        }
        if let Some(limit) = page_limit {
            filters.set("limit", limit.to_string());
        }
        if let Some(sort_key) = &opts.sort_key {
            filters.set("sort_key", sort_key.clone());
        }
        if let Some(sort_dir) = opts.sort_dir {
            filters.set("sort_dir", sort_dir.to_string());
        }
        if let Some(fields) = &opts.fields {
            filters.set("fields", fields.join(","));
        }
        if let Some(project) = &opts.project {
            filters.set("project_id", project.clone());
        }

        let mut path = self.def.collection.clone();
        if opts.detail {
            path.push_str("/detail");
        }
        if !filters.is_empty() {
            path.push('?');
            path.push_str(&filters.to_query());
        }
        path
    }

    /// Issue one list request and unwrap the collection-keyed page
    async fn fetch_page(&self, path: &str) -> Result<Vec<Resource>, Error> {
        let body = self
            .client
            .get(path)
            .await
            .map_err(|f| f.into_error(self.kind, &self.def.collection))?;

        let items = body
            .get(&self.def.collection)
            .and_then(Value::as_array)
            .ok_or_else(|| {
                Error::Protocol(format!(
                    "list response missing '{}' array",
                    self.def.collection
                ))
            })?;

        items
            .iter()
            .map(|item| Resource::from_json(item.clone(), self.def))
            .collect()
    }

    /// Follow the marker cursor until the limit is satisfied or the
    /// collection is exhausted.
    ///
    /// `limit == 0` means the whole collection. Each page's marker is the
    /// id of the last item of the previous page; a marker that fails to
    /// advance (or revisits an earlier page) is a server contract
    /// violation and aborts the listing.
    async fn list_paginated(&self, opts: &ListOpts, limit: u32) -> Result<Vec<Resource>, Error> {
        let mut out: Vec<Resource> = Vec::new();
        let mut marker = opts.marker.clone();
        let mut seen_markers: HashSet<String> = marker.iter().cloned().collect();

        loop {
            let page_limit = if limit == 0 {
                None
            } else {
                Some(limit - out.len() as u32)
            };

            let path = self.list_path(opts, page_limit, marker.as_deref());
            let page = self.fetch_page(&path).await?;

            if page.is_empty() {
                break;
            }

            let next_marker = page
                .last()
                .and_then(|r| r.get(&self.def.id_field))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    Error::Protocol(format!(
                        "page item missing '{}' field, cannot paginate",
                        self.def.id_field
                    ))
                })?;

            if !seen_markers.insert(next_marker.clone()) {
                return Err(Error::Protocol(format!(
                    "pagination marker '{next_marker}' did not advance"
                )));
            }

            out.extend(page);

            if limit > 0 && out.len() as u32 >= limit {
                out.truncate(limit as usize);
                break;
            }

            marker = Some(next_marker);
        }

        Ok(out)
    }
}
