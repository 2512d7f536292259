//! Chassis commands
//!
//! A chassis is a physical enclosure grouping nodes; these commands
//! mirror the node surface minus power control.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};
use std::io::Write;

use super::{extra_to_object, ListArgs};
use crate::api::client::Client;
use crate::config::Config;
use crate::output;
use crate::resource::{build_patch, PatchOp, ResourceManager, UpdateMethod};

/// Registry key for the chassis collection
const KIND: &str = "chassis";

/// Chassis subcommands
#[derive(Debug, Subcommand)]
pub enum ChassisCommand {
    /// List the chassis registered with the Corral service
    List(ListArgs),
    /// Show detailed information about a chassis
    Show(ShowArgs),
    /// Register a new chassis
    Create(CreateArgs),
    /// Update information about a registered chassis
    Update(UpdateArgs),
    /// Unregister a chassis
    Delete(DeleteArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// UUID of the chassis
    pub chassis: String,

    /// Comma-separated subset of chassis fields to fetch
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Free-text description of the chassis
    #[arg(long)]
    pub description: Option<String>,

    /// Record arbitrary key/value metadata. Can be specified multiple
    /// times.
    #[arg(short, long = "extra", value_name = "key=value")]
    pub extra: Vec<String>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// UUID of the chassis
    pub chassis: String,

    /// Operation: 'add', 'replace', or 'remove'
    #[arg(value_parser = ["add", "replace", "remove"])]
    pub op: String,

    /// Attributes to add, replace, or remove, as path=value. For
    /// 'remove', only the path is given.
    #[arg(required = true, value_name = "path=value")]
    pub attributes: Vec<String>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// UUID of the chassis
    pub chassis: String,
}

/// Execute a chassis subcommand
pub async fn run(command: ChassisCommand, client: &Client, config: &Config) -> Result<()> {
    let manager = ResourceManager::new(client, KIND)?;
    let mut stdout = std::io::stdout();

    match command {
        ChassisCommand::List(args) => {
            let opts = args.to_opts(config)?;
            let chassis = manager.list(&opts).await?;

            if args.json {
                output::write_json(&mut stdout, &output::resources_to_json(&chassis))?;
            } else {
                let def = manager.def();
                let columns = if args.detail {
                    def.detail_columns.clone()
                } else if let Some(fields) = &args.fields {
                    output::columns_for_fields(def, fields)
                } else {
                    def.default_columns.clone()
                };
                output::write_list(&mut stdout, &chassis, &columns)?;
            }
        }
        ChassisCommand::Show(args) => {
            let chassis = manager.get(&args.chassis, args.fields.as_deref()).await?;

            if args.json {
                output::write_json(&mut stdout, &output::resource_to_json(&chassis))?;
            } else {
                let def = manager.def();
                let columns = match &args.fields {
                    Some(fields) => output::columns_for_fields(def, fields),
                    None => def.detail_columns.clone(),
                };
                output::write_dict(&mut stdout, &chassis, &columns)?;
            }
        }
        ChassisCommand::Create(args) => {
            let fields = creation_fields(&args)?;
            let chassis = manager.create(fields).await?;

            if args.json {
                output::write_json(&mut stdout, &output::resource_to_json(&chassis))?;
            } else {
                output::write_dict(&mut stdout, &chassis, &manager.def().detail_columns)?;
            }
        }
        ChassisCommand::Update(args) => {
            let op: PatchOp = args.op.parse()?;
            let patch = build_patch(op, &args.attributes, manager.def())?;
            let chassis = manager
                .update(&args.chassis, &patch, UpdateMethod::Patch)
                .await?;

            if args.json {
                output::write_json(&mut stdout, &output::resource_to_json(&chassis))?;
            } else {
                output::write_dict(&mut stdout, &chassis, &manager.def().detail_columns)?;
            }
        }
        ChassisCommand::Delete(args) => {
            manager.delete(&args.chassis).await?;
            writeln!(stdout, "Deleted chassis {}", args.chassis)?;
        }
    }

    Ok(())
}

/// Build the creation attribute mapping from CLI arguments
pub fn creation_fields(args: &CreateArgs) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    if let Some(description) = &args.description {
        fields.insert("description".to_string(), json!(description));
    }
    if !args.extra.is_empty() {
        let extra = extra_to_object(&args.extra)?;
        fields.insert("extra".to_string(), Value::Object(extra));
    }
    Ok(fields)
}
