//! envctl - inspect and edit workspace environment documents
//!
//! Reads a raw environment document (JSON), picks the translator for its
//! recipe type and applies one edit through it.
//!
//! ## Commands
//!
//! - `machines`: List the machines of an environment
//! - `capabilities`: Show what the translator allows per machine
//! - `set-memory`: Set a machine's memory limit
//! - `set-dev`: Mark or unmark a machine as developer machine
//! - `rename` / `delete`: Rename or remove a machine, where the format allows it

mod telemetry;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use env_manager::{
    manager_with_agents, DevAgents, EnvironmentManager, EnvironmentManagerMachine,
    MachineSource, RawEnvironment, ServerConfig,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "envctl")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inspect and edit workspace environment documents", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true, env = "ENVCTL_LOG_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List machines with their dev flag, memory limit, agents, servers and source
    Machines {
        /// Environment document (JSON), `-` for stdin
        document: PathBuf,

        /// Write output to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the translator's capabilities for each machine
    Capabilities {
        /// Environment document (JSON), `-` for stdin
        document: PathBuf,
    },

    /// Set a machine's memory limit and print the updated document
    SetMemory {
        /// Environment document (JSON), `-` for stdin
        document: PathBuf,

        /// Machine to edit
        #[arg(short, long)]
        machine: String,

        /// Memory limit in bytes
        #[arg(short, long)]
        bytes: i64,

        /// Write the updated document to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Mark or unmark a machine as developer machine and print the updated document
    SetDev {
        /// Environment document (JSON), `-` for stdin
        document: PathBuf,

        /// Machine to edit
        #[arg(short, long)]
        machine: String,

        /// Whether the machine runs the workspace agent
        #[arg(short, long, action = clap::ArgAction::Set, default_value_t = true)]
        enabled: bool,

        /// Write the updated document to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Rename a machine
    Rename {
        /// Environment document (JSON), `-` for stdin
        document: PathBuf,

        /// Current machine name
        old_name: String,

        /// New machine name
        new_name: String,

        /// Write the updated document to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Remove a machine
    Delete {
        /// Environment document (JSON), `-` for stdin
        document: PathBuf,

        /// Machine to remove
        name: String,

        /// Write the updated document to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    telemetry::init_tracing(cli.json, level);

    match cli.command {
        Commands::Machines { document, output } => cmd_machines(&document, output.as_deref()),
        Commands::Capabilities { document } => cmd_capabilities(&document, None),
        Commands::SetMemory {
            document,
            machine,
            bytes,
            output,
        } => cmd_set_memory(&document, &machine, bytes, output.as_deref()),
        Commands::SetDev {
            document,
            machine,
            enabled,
            output,
        } => cmd_set_dev(&document, &machine, enabled, output.as_deref()),
        Commands::Rename {
            document,
            old_name,
            new_name,
            output,
        } => cmd_rename(&document, &old_name, &new_name, output.as_deref()),
        Commands::Delete {
            document,
            name,
            output,
        } => cmd_delete(&document, &name, output.as_deref()),
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MachineView {
    name: String,
    dev: bool,
    memory_limit_bytes: i64,
    agents: Vec<String>,
    servers: BTreeMap<String, ServerConfig>,
    source: MachineSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    env_variables: Option<BTreeMap<String, String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CapabilitiesView {
    recipe_type: String,
    editor_mode: String,
    machines: Vec<MachineCapabilities>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MachineCapabilities {
    name: String,
    can_rename_machine: bool,
    can_delete_machine: bool,
    can_add_machine: bool,
    can_edit_env_variables: bool,
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_machines(document: &Path, output: Option<&Path>) -> Result<()> {
    let environment = read_environment(document)?;
    let manager = select_manager(&environment)?;

    let views: Vec<MachineView> = manager
        .get_machines(&environment)
        .iter()
        .map(|machine| MachineView {
            name: machine.name.clone(),
            dev: manager.is_dev(machine),
            memory_limit_bytes: manager.get_memory_limit(machine),
            agents: manager.get_agents(machine).to_vec(),
            servers: manager.get_servers(machine).clone(),
            source: manager.get_source(machine),
            env_variables: manager.get_env_variables(machine),
        })
        .collect();

    write_output(output, &serde_json::to_string_pretty(&views)?)
}

fn cmd_capabilities(document: &Path, output: Option<&Path>) -> Result<()> {
    let environment = read_environment(document)?;
    let manager = select_manager(&environment)?;

    let view = CapabilitiesView {
        recipe_type: manager.recipe_type().to_string(),
        editor_mode: manager.editor_mode().to_string(),
        machines: manager
            .get_machines(&environment)
            .iter()
            .map(|machine| MachineCapabilities {
                name: machine.name.clone(),
                can_rename_machine: manager.can_rename_machine(machine),
                can_delete_machine: manager.can_delete_machine(machine),
                can_add_machine: manager.can_add_machine(machine),
                can_edit_env_variables: manager.can_edit_env_variables(machine),
            })
            .collect(),
    };

    write_output(output, &serde_json::to_string_pretty(&view)?)
}

fn cmd_set_memory(
    document: &Path,
    machine: &str,
    bytes: i64,
    output: Option<&Path>,
) -> Result<()> {
    edit_machine(document, machine, output, |manager, m| {
        manager.set_memory_limit(m, bytes);
        info!(machine = %m.name, memory_limit_bytes = bytes, "memory limit set");
    })
}

fn cmd_set_dev(
    document: &Path,
    machine: &str,
    enabled: bool,
    output: Option<&Path>,
) -> Result<()> {
    edit_machine(document, machine, output, |manager, m| {
        manager.set_dev(m, enabled);
        info!(machine = %m.name, dev = enabled, "dev flag set");
    })
}

fn cmd_rename(
    document: &Path,
    old_name: &str,
    new_name: &str,
    output: Option<&Path>,
) -> Result<()> {
    let mut environment = read_environment(document)?;
    let manager = select_manager(&environment)?;

    manager
        .rename_machine(&mut environment, old_name, new_name)
        .with_context(|| format!("Failed to rename machine '{}' to '{}'", old_name, new_name))?;

    write_output(output, &environment.to_json_string_pretty()?)
}

fn cmd_delete(document: &Path, name: &str, output: Option<&Path>) -> Result<()> {
    let mut environment = read_environment(document)?;
    let manager = select_manager(&environment)?;

    manager
        .delete_machine(&mut environment, name)
        .with_context(|| format!("Failed to delete machine '{}'", name))?;

    write_output(output, &environment.to_json_string_pretty()?)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse, edit one machine, rebuild and write the document
fn edit_machine<F>(document: &Path, name: &str, output: Option<&Path>, edit: F) -> Result<()>
where
    F: FnOnce(&dyn EnvironmentManager, &mut EnvironmentManagerMachine),
{
    let environment = read_environment(document)?;
    let manager = select_manager(&environment)?;

    let mut machines = manager.get_machines(&environment);
    let machine = machines
        .iter_mut()
        .find(|m| m.name == name)
        .with_context(|| format!("machine not found: {}", name))?;
    edit(manager.as_ref(), machine);

    let rebuilt = manager.get_environment(&environment, &machines);
    write_output(output, &rebuilt.to_json_string_pretty()?)
}

fn select_manager(environment: &RawEnvironment) -> Result<Box<dyn EnvironmentManager>> {
    let manager = manager_with_agents(&environment.recipe.recipe_type, DevAgents::from_env())?;
    debug!(recipe_type = %manager.recipe_type(), "selected environment manager");
    Ok(manager)
}

fn read_environment(path: &Path) -> Result<RawEnvironment> {
    let text = if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read environment from stdin")?;
        text
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read environment file {:?}", path))?
    };

    RawEnvironment::from_json_str(&text)
        .with_context(|| format!("Failed to parse environment document {:?}", path))
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, format!("{text}\n"))
                .with_context(|| format!("Failed to write {:?}", path))?;
            info!("Wrote {:?}", path);
        }
        None => println!("{}", text),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn write_document(dir: &TempDir, doc: Value) -> PathBuf {
        let path = dir.path().join("environment.json");
        std::fs::write(&path, serde_json::to_string_pretty(&doc).unwrap()).unwrap();
        path
    }

    fn docker_image_document() -> Value {
        json!({
            "recipe": {"type": "dockerimage", "location": "codenvy/ubuntu_jdk8"},
            "machines": {
                "dev-machine": {
                    "attributes": {"memoryLimitBytes": 2147483648u64},
                    "agents": ["org.eclipse.che.ws-agent", "org.eclipse.che.terminal"]
                }
            }
        })
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_cli_parses_set_dev() {
        let cli = Cli::try_parse_from([
            "envctl", "set-dev", "env.json", "--machine", "m", "--enabled", "false",
        ])
        .unwrap();
        match cli.command {
            Commands::SetDev {
                machine, enabled, ..
            } => {
                assert_eq!(machine, "m");
                assert!(!enabled);
            }
            _ => panic!("expected set-dev"),
        }
    }

    #[test]
    fn test_machines_lists_source_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_document(&dir, docker_image_document());
        let out = dir.path().join("machines.json");

        cmd_machines(&doc, Some(&out)).unwrap();

        let listed = read_json(&out);
        assert_eq!(listed[0]["name"], "dev-machine");
        assert_eq!(listed[0]["dev"], true);
        assert_eq!(listed[0]["memoryLimitBytes"], 2147483648u64);
        assert_eq!(listed[0]["source"], json!({"image": "codenvy/ubuntu_jdk8"}));
        assert!(listed[0].get("envVariables").is_none());
    }

    #[test]
    fn test_capabilities_are_all_false() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_document(&dir, docker_image_document());
        let out = dir.path().join("caps.json");

        cmd_capabilities(&doc, Some(&out)).unwrap();

        let caps = read_json(&out);
        assert_eq!(caps["recipeType"], "dockerimage");
        assert_eq!(caps["editorMode"], "");
        assert_eq!(caps["machines"][0]["canRenameMachine"], false);
        assert_eq!(caps["machines"][0]["canEditEnvVariables"], false);
    }

    #[test]
    fn test_set_memory_rewrites_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_document(&dir, docker_image_document());
        let out = dir.path().join("updated.json");

        cmd_set_memory(&doc, "dev-machine", 1024, Some(&out)).unwrap();

        let mut expected = docker_image_document();
        expected["machines"]["dev-machine"]["attributes"]["memoryLimitBytes"] = json!(1024);
        assert_eq!(read_json(&out), expected);
    }

    #[test]
    fn test_set_dev_adds_missing_agents() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_document(&dir, docker_image_document());
        let out = dir.path().join("updated.json");

        cmd_set_dev(&doc, "dev-machine", true, Some(&out)).unwrap();

        assert_eq!(
            read_json(&out)["machines"]["dev-machine"]["agents"],
            json!([
                "org.eclipse.che.ws-agent",
                "org.eclipse.che.terminal",
                "org.eclipse.che.ssh"
            ])
        );
    }

    #[test]
    fn test_unknown_machine_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_document(&dir, docker_image_document());

        let err = cmd_set_memory(&doc, "db", 1024, None).unwrap_err();
        assert!(err.to_string().contains("machine not found: db"));
    }

    #[test]
    fn test_rename_and_delete_report_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_document(&dir, docker_image_document());

        let err = cmd_rename(&doc, "dev-machine", "main", None).unwrap_err();
        assert!(format!("{:#}", err).contains("cannot rename machine"));

        let err = cmd_delete(&doc, "dev-machine", None).unwrap_err();
        assert!(format!("{:#}", err).contains("cannot delete machine"));
    }

    #[test]
    fn test_unsupported_recipe_type_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let doc = write_document(
            &dir,
            json!({
                "recipe": {"type": "compose", "content": "services: {}"},
                "machines": {}
            }),
        );

        let err = cmd_machines(&doc, None).unwrap_err();
        assert!(err.to_string().contains("unsupported recipe type: compose"));
    }
}
