//! Node commands
//!
//! Registration, listing, partial updates, unregistration, and power
//! control for field devices.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};
use std::io::Write;
use std::time::Instant;

use super::{extra_to_object, ListArgs};
use crate::api::client::Client;
use crate::config::Config;
use crate::output;
use crate::resource::{build_patch, PatchOp, ResourceManager, UpdateMethod};

/// Registry key for the node collection
const KIND: &str = "nodes";

/// Power targets accepted by the service. The wire label is what the
/// state endpoint expects; the settled label is what `power_state`
/// reports once the transition completes.
struct PowerTarget {
    name: &'static str,
    label: &'static str,
    settled: &'static str,
}

const POWER_TARGETS: &[PowerTarget] = &[
    PowerTarget { name: "on", label: "power on", settled: "power on" },
    PowerTarget { name: "off", label: "power off", settled: "power off" },
    PowerTarget { name: "reboot", label: "rebooting", settled: "power on" },
    PowerTarget { name: "soft-off", label: "soft power off", settled: "power off" },
    PowerTarget { name: "soft-reboot", label: "soft rebooting", settled: "power on" },
];

/// Node subcommands
#[derive(Debug, Subcommand)]
pub enum NodeCommand {
    /// List the nodes registered with the Corral service
    List(ListArgs),
    /// Show detailed information about a node
    Show(ShowArgs),
    /// Register a new node
    Create(CreateArgs),
    /// Update information about a registered node
    Update(UpdateArgs),
    /// Unregister node(s); reports an error for any node that could not
    /// be removed
    Delete(DeleteArgs),
    /// Change the power state of a node
    Power(PowerArgs),
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Name or UUID of the node
    pub node: String,

    /// Comma-separated subset of node fields to fetch
    #[arg(long, value_delimiter = ',')]
    pub fields: Option<Vec<String>>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// Name of the node
    pub name: String,
    /// Pairing code of the node
    pub code: String,
    /// Type of the node
    pub r#type: String,
    /// Latitude of the node
    pub latitude: String,
    /// Longitude of the node
    pub longitude: String,
    /// Altitude of the node
    pub altitude: String,

    /// Register a mobile node
    #[arg(short, long)]
    pub mobile: bool,

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
    /// Name or UUID of the node
    pub node: String,

    /// Operation: 'add', 'replace', or 'remove'
    #[arg(value_parser = ["add", "replace", "remove"])]
    pub op: String,

    /// Attributes to add, replace, or remove, as path=value. For
    /// 'remove', only the path is given. Nested attributes use slashes,
    /// e.g. 'extra/rack=b2'.
    #[arg(required = true, value_name = "path=value")]
    pub attributes: Vec<String>,

    /// Print raw JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Name or UUID of the node(s)
    #[arg(required = true)]
    pub nodes: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PowerArgs {
    /// Name or UUID of the node
    pub node: String,

    /// Target power state
    #[arg(value_parser = ["on", "off", "reboot", "soft-off", "soft-reboot"])]
    pub target: String,

    /// Block until the node reports the target state
    #[arg(long)]
    pub wait: bool,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,
}

/// Execute a node subcommand
pub async fn run(command: NodeCommand, client: &Client, config: &Config) -> Result<()> {
    let manager = ResourceManager::new(client, KIND)?;
    let mut stdout = std::io::stdout();

    match command {
        NodeCommand::List(args) => {
            let opts = args.to_opts(config)?;
            let nodes = manager.list(&opts).await?;

            if args.json {
                output::write_json(&mut stdout, &output::resources_to_json(&nodes))?;
            } else {
                let def = manager.def();
                let columns = if args.detail {
                    def.detail_columns.clone()
                } else if let Some(fields) = &args.fields {
                    output::columns_for_fields(def, fields)
                } else {
                    def.default_columns.clone()
                };
                output::write_list(&mut stdout, &nodes, &columns)?;
            }
        }
        NodeCommand::Show(args) => {
            let node = manager.get(&args.node, args.fields.as_deref()).await?;

            if args.json {
                output::write_json(&mut stdout, &output::resource_to_json(&node))?;
            } else {
                let def = manager.def();
                let columns = match &args.fields {
                    Some(fields) => output::columns_for_fields(def, fields),
                    None => def.detail_columns.clone(),
                };
                output::write_dict(&mut stdout, &node, &columns)?;
            }
        }
        NodeCommand::Create(args) => {
            let fields = creation_fields(&args)?;
            let node = manager.create(fields).await?;

            if args.json {
                output::write_json(&mut stdout, &output::resource_to_json(&node))?;
            } else {
                output::write_dict(&mut stdout, &node, &manager.def().detail_columns)?;
            }
        }
        NodeCommand::Update(args) => {
            let op: PatchOp = args.op.parse()?;
            let patch = build_patch(op, &args.attributes, manager.def())?;
            let node = manager.update(&args.node, &patch, UpdateMethod::Patch).await?;

            if args.json {
                output::write_json(&mut stdout, &output::resource_to_json(&node))?;
            } else {
                output::write_dict(&mut stdout, &node, &manager.def().detail_columns)?;
            }
        }
        NodeCommand::Delete(args) => {
            let (deleted, failures) = delete_many(&manager, &args.nodes).await;
            for node in &deleted {
                writeln!(stdout, "Deleted node {}", node)?;
            }
            if !failures.is_empty() {
                bail!(failures.join("\n"));
            }
        }
        NodeCommand::Power(args) => {
            let target = power_target(&args.target)?;
            manager
                .set_state(&args.node, "state/power", json!({ "target": target.label }))
                .await?;
            writeln!(stdout, "Node {} power state set to '{}'", args.node, target.label)?;

            if args.wait {
                wait_for_power_state(&manager, &args.node, target, config, args.timeout).await?;
                writeln!(stdout, "Node {} reached '{}'", args.node, target.settled)?;
            }
        }
    }

    Ok(())
}

/// Build the creation attribute mapping from CLI arguments.
///
/// Location is a single-element array of coordinates, matching the
/// service's wire shape.
pub fn creation_fields(args: &CreateArgs) -> Result<Map<String, Value>> {
    let mut fields = Map::new();
    fields.insert("name".to_string(), json!(args.name));
    fields.insert("code".to_string(), json!(args.code));
    fields.insert("type".to_string(), json!(args.r#type));
    fields.insert("mobile".to_string(), json!(args.mobile));
    fields.insert(
        "location".to_string(),
        json!([{
            "latitude": args.latitude,
            "longitude": args.longitude,
            "altitude": args.altitude,
        }]),
    );

    if !args.extra.is_empty() {
        let extra = extra_to_object(&args.extra)?;
        fields.insert("extra".to_string(), Value::Object(extra));
    }

    Ok(fields)
}

/// Delete nodes one by one, collecting failures instead of aborting.
///
/// Returns the successfully deleted identifiers and one message per
/// failure.
pub async fn delete_many(
    manager: &ResourceManager<'_>,
    ids: &[String],
) -> (Vec<String>, Vec<String>) {
    let mut deleted = Vec::new();
    let mut failures = Vec::new();

    for id in ids {
        match manager.delete(id).await {
            Ok(()) => deleted.push(id.clone()),
            Err(e) => failures.push(format!("Failed to delete node {}: {}", id, e)),
        }
    }

    (deleted, failures)
}

fn power_target(name: &str) -> Result<&'static PowerTarget> {
    POWER_TARGETS
        .iter()
        .find(|t| t.name == name)
        .ok_or_else(|| anyhow::anyhow!("unknown power target '{name}'"))
}

/// Poll the node until its power state settles or the timeout elapses
async fn wait_for_power_state(
    manager: &ResourceManager<'_>,
    id: &str,
    target: &PowerTarget,
    config: &Config,
    timeout_secs: u64,
) -> Result<()> {
    let deadline = Instant::now() + std::time::Duration::from_secs(timeout_secs);
    let fields = vec!["power_state".to_string()];

    loop {
        let node = manager.get(id, Some(&fields)).await?;
        if node.get("power_state").and_then(Value::as_str) == Some(target.settled) {
            return Ok(());
        }
        if Instant::now() >= deadline {
            bail!(
                "node {} did not reach '{}' within {}s",
                id,
                target.settled,
                timeout_secs
            );
        }
        tokio::time::sleep(config.poll_interval()).await;
    }
}
