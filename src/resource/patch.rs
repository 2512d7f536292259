//! Patch document construction
//!
//! Turns CLI-style `path=value` tokens into the JSON array of
//! `{op, path, value?}` objects the update endpoint expects. Values are
//! passed through as strings; the client never guesses JSON types from
//! CLI input.

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::registry::ResourceDef;
use crate::error::Error;

/// Partial-update operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOp::Add => write!(f, "add"),
            PatchOp::Replace => write!(f, "replace"),
            PatchOp::Remove => write!(f, "remove"),
        }
    }
}

impl FromStr for PatchOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(PatchOp::Add),
            "replace" => Ok(PatchOp::Replace),
            "remove" => Ok(PatchOp::Remove),
            other => Err(Error::InvalidAttribute(format!(
                "unknown operation '{other}', expected add, replace, or remove"
            ))),
        }
    }
}

/// One entry of a patch document
///
/// `remove` entries carry no value field at all, which is why `value` is
/// skipped when absent rather than serialized as null.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchEntry {
    pub op: PatchOp,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Build a patch document from CLI attribute tokens.
///
/// For `add`/`replace` each token is split on the first `=` into path and
/// value; for `remove` the token is the path alone. The first path
/// segment must be a known field of the resource kind.
pub fn build_patch(
    op: PatchOp,
    tokens: &[String],
    def: &ResourceDef,
) -> Result<Vec<PatchEntry>, Error> {
    tokens
        .iter()
        .map(|token| build_entry(op, token, def))
        .collect()
}

fn build_entry(op: PatchOp, token: &str, def: &ResourceDef) -> Result<PatchEntry, Error> {
    match op {
        PatchOp::Add | PatchOp::Replace => {
            let Some((path, value)) = token.split_once('=') else {
                return Err(Error::InvalidAttribute(format!(
                    "attribute '{token}' must be of the form path=value"
                )));
            };
            Ok(PatchEntry {
                op,
                path: check_path(path, def)?,
                value: Some(Value::String(value.to_string())),
            })
        }
        PatchOp::Remove => {
            if token.contains('=') {
                return Err(Error::InvalidAttribute(format!(
                    "remove takes a path only, got '{token}'"
                )));
            }
            Ok(PatchEntry {
                op,
                path: check_path(token, def)?,
                value: None,
            })
        }
    }
}

/// Validate the path root against the known field set and normalize to a
/// leading-slash JSON pointer
fn check_path(path: &str, def: &ResourceDef) -> Result<String, Error> {
    let trimmed = path.trim_start_matches('/');
    let root = trimmed.split('/').next().unwrap_or_default();

    if root.is_empty() {
        return Err(Error::InvalidAttribute("empty attribute path".to_string()));
    }
    if !def.has_field(root) {
        return Err(Error::InvalidAttribute(format!(
            "'{}' is not a known {} attribute",
            root,
            def.display_name.to_lowercase()
        )));
    }

    Ok(format!("/{trimmed}"))
}
