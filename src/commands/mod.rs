//! CLI command layer
//!
//! Maps subcommands and flags to resource-manager calls and renders the
//! results. Commands never talk HTTP directly; everything goes through
//! [`crate::resource::ResourceManager`].

pub mod chassis;
pub mod node;

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{Map, Value};

use crate::api::client::Client;
use crate::config::Config;
use crate::error::Error;
use crate::resource::{ListOpts, SortDir};

/// Top-level subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage nodes registered with the Corral service
    #[command(subcommand)]
    Node(node::NodeCommand),
    /// Manage chassis
    #[command(subcommand)]
    Chassis(chassis::ChassisCommand),
}

/// Run the selected subcommand
pub async fn dispatch(command: Command, client: &Client, config: &Config) -> Result<()> {
    match command {
        Command::Node(cmd) => node::run(cmd, client, config).await,
        Command::Chassis(cmd) => chassis::run(cmd, client, config).await,
    }
}

/// List flags shared by every collection
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Maximum number of items to return, 0 for the whole collection.
    /// Default is the cap imposed by the Corral service.
    #[arg(long)]
    pub limit: Option<u32>,

    /// UUID of the last item of a previous page; results continue after it
    #[arg(long)]
    pub marker: Option<String>,

    /// Field used for sorting
    #[arg(long)]
    pub sort_key: Option<String>,

    /// Sort direction: "asc" (the default) or "desc"
    #[arg(long, value_parser = ["asc", "desc"])]
    pub sort_dir: Option<String>,

    /// Comma-separated subset of fields to fetch. Can not be used with
    /// --detail.
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Show detailed information
    #[arg(long)]
    pub detail: bool,

    /// Only items belonging to this project
    #[arg(long)]
    pub project: Option<String>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    /// Translate CLI flags into manager list options.
    ///
    /// Falls back to the configured project scope when --project is not
    /// given.
    pub fn to_opts(&self, config: &Config) -> Result<ListOpts, Error> {
        let sort_dir = match &self.sort_dir {
            Some(s) => Some(s.parse::<SortDir>()?),
            None => None,
        };

        Ok(ListOpts {
            marker: self.marker.clone(),
            limit: self.limit,
            detail: self.detail,
            sort_key: self.sort_key.clone(),
            sort_dir,
            fields: self.fields.clone(),
            project: self.project.clone().or_else(|| config.effective_project()),
        })
    }
}

/// Turn repeated `key=value` tokens into a JSON object
///
/// Used for the `-e/--extra` metadata flags.
pub fn extra_to_object(tokens: &[String]) -> Result<Map<String, Value>, Error> {
    let mut map = Map::new();
    for token in tokens {
        let Some((key, value)) = token.split_once('=') else {
            return Err(Error::InvalidAttribute(format!(
                "extra attribute '{token}' must be of the form key=value"
            )));
        };
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
    Ok(map)
}
