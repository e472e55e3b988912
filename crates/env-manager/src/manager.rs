//! The environment manager contract
//!
//! [`EnvironmentManager`] is implemented once per recipe format. A
//! translator only has to say how machines are extracted from a document
//! (`get_machines`) and where a machine's source lives (`get_source`);
//! everything else has a provided implementation that formats may
//! override when they support more than the default.
//!
//! Capability-gated operations (`rename_machine`, `delete_machine`) fail
//! with [`EnvManagerError::UnsupportedOperation`] unless overridden.

use crate::agents::DevAgents;
use crate::document::{RawEnvironment, RawMachineConfig, ServerConfig, MEMORY_LIMIT_ATTRIBUTE};
use crate::error::EnvManagerError;
use crate::machine::EnvironmentManagerMachine;
use crate::recipe::RecipeType;
use crate::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Memory limit reported for a machine that has none set
pub const MEMORY_LIMIT_UNSET: i64 = -1;

/// Where a machine's runtime comes from.
///
/// The variant depends on the recipe type of the translator that produced
/// it; callers must match on it rather than assume a shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum MachineSource {
    /// A pre-built image reference
    Image { image: String },
}

/// Translator between a raw environment document and editable machines
pub trait EnvironmentManager {
    /// Recipe type this translator handles
    fn recipe_type(&self) -> RecipeType;

    /// Agents that make up a developer machine
    fn dev_agents(&self) -> &DevAgents;

    /// Display-mode tag for recipe editors; empty when there is none
    fn editor_mode(&self) -> &str {
        ""
    }

    fn can_rename_machine(&self, _machine: &EnvironmentManagerMachine) -> bool {
        false
    }

    fn can_delete_machine(&self, _machine: &EnvironmentManagerMachine) -> bool {
        false
    }

    fn can_add_machine(&self, _machine: &EnvironmentManagerMachine) -> bool {
        false
    }

    fn can_edit_env_variables(&self, _machine: &EnvironmentManagerMachine) -> bool {
        false
    }

    /// Extract the machines of `environment`.
    ///
    /// Returned machines are fresh copies; mutating them never touches
    /// `environment`.
    fn get_machines(&self, environment: &RawEnvironment) -> Vec<EnvironmentManagerMachine>;

    /// Source descriptor of `machine`
    fn get_source(&self, machine: &EnvironmentManagerMachine) -> MachineSource;

    /// Rename a machine in place
    fn rename_machine(
        &self,
        _environment: &mut RawEnvironment,
        _old_name: &str,
        _new_name: &str,
    ) -> Result<()> {
        Err(EnvManagerError::unsupported(
            "rename machine",
            self.recipe_type().as_str(),
        ))
    }

    /// Remove a machine in place
    fn delete_machine(&self, _environment: &mut RawEnvironment, _name: &str) -> Result<()> {
        Err(EnvManagerError::unsupported(
            "delete machine",
            self.recipe_type().as_str(),
        ))
    }

    /// Build an updated document from `environment` and the edited `machines`.
    ///
    /// Only `attributes.memoryLimitBytes`, `agents` and `servers` of each
    /// listed machine are written; every other field of the document is
    /// carried over as is. Machines missing from the document are created.
    /// Machines missing from `machines` are kept: deletion goes through
    /// `delete_machine`. An absent or `null` field of an existing machine
    /// stays so while the machine has nothing to put there.
    fn get_environment(
        &self,
        environment: &RawEnvironment,
        machines: &[EnvironmentManagerMachine],
    ) -> RawEnvironment {
        let mut rebuilt = environment.clone();

        for machine in machines {
            let created = !rebuilt.machines.contains_key(&machine.name);
            let config = rebuilt
                .machines
                .entry(machine.name.clone())
                .or_insert_with(RawMachineConfig::with_empty_attributes);

            match machine.attributes.get(MEMORY_LIMIT_ATTRIBUTE) {
                Some(limit) => {
                    config
                        .attributes
                        .get_or_insert(None)
                        .get_or_insert_with(Map::new)
                        .insert(MEMORY_LIMIT_ATTRIBUTE.to_string(), limit.clone());
                }
                None => {
                    if let Some(Some(attributes)) = config.attributes.as_mut() {
                        attributes.remove(MEMORY_LIMIT_ATTRIBUTE);
                    }
                }
            }
            if created || !machine.agents.is_empty() || matches!(config.agents, Some(Some(_))) {
                config.agents = Some(Some(machine.agents.clone()));
            }
            if created || !machine.servers.is_empty() || matches!(config.servers, Some(Some(_))) {
                config.servers = Some(Some(machine.servers.clone()));
            }
        }

        debug!(
            event = "environment.rebuilt",
            recipe_type = %self.recipe_type(),
            machines = machines.len(),
            total = rebuilt.machines.len(),
        );
        rebuilt
    }

    /// Whether `machine` runs the workspace agent
    fn is_dev(&self, machine: &EnvironmentManagerMachine) -> bool {
        let ws_agent = &self.dev_agents().ws_agent;
        machine.agents.iter().any(|agent| agent == ws_agent)
    }

    /// Mark `machine` as developer machine or not.
    ///
    /// Enabling appends whichever of the workspace, ssh and terminal agents
    /// are missing. Disabling removes the workspace agent only.
    fn set_dev(&self, machine: &mut EnvironmentManagerMachine, is_dev: bool) {
        let dev_agents = self.dev_agents();

        if is_dev {
            for agent in dev_agents.install_order() {
                if !machine.agents.iter().any(|a| a == agent) {
                    machine.agents.push(agent.to_string());
                }
            }
            return;
        }

        if let Some(pos) = machine
            .agents
            .iter()
            .position(|a| *a == dev_agents.ws_agent)
        {
            machine.agents.remove(pos);
        }
    }

    fn get_servers<'m>(
        &self,
        machine: &'m EnvironmentManagerMachine,
    ) -> &'m BTreeMap<String, ServerConfig> {
        &machine.servers
    }

    fn set_servers(
        &self,
        machine: &mut EnvironmentManagerMachine,
        servers: &BTreeMap<String, ServerConfig>,
    ) {
        machine.servers = servers.clone();
    }

    fn get_agents<'m>(&self, machine: &'m EnvironmentManagerMachine) -> &'m [String] {
        &machine.agents
    }

    fn set_agents(&self, machine: &mut EnvironmentManagerMachine, agents: &[String]) {
        machine.agents = agents.to_vec();
    }

    /// Memory limit in bytes, or [`MEMORY_LIMIT_UNSET`] when absent or zero
    fn get_memory_limit(&self, machine: &EnvironmentManagerMachine) -> i64 {
        machine
            .attributes
            .get(MEMORY_LIMIT_ATTRIBUTE)
            .and_then(memory_limit_from_value)
            .unwrap_or(MEMORY_LIMIT_UNSET)
    }

    fn set_memory_limit(&self, machine: &mut EnvironmentManagerMachine, limit: i64) {
        machine
            .attributes
            .insert(MEMORY_LIMIT_ATTRIBUTE.to_string(), Value::from(limit));
    }

    /// Environment variables of `machine`; `None` when the format has none
    fn get_env_variables(
        &self,
        _machine: &EnvironmentManagerMachine,
    ) -> Option<BTreeMap<String, String>> {
        None
    }
}

/// Read a memory limit the backend may have stored as a number or a
/// numeric string. Zero, null and non-numeric values count as unset.
/// Fractional byte counts round away from zero, so `0.5` reads as `1`.
fn memory_limit_from_value(value: &Value) -> Option<i64> {
    let limit = match value {
        Value::Number(n) => match n.as_i64() {
            Some(limit) => limit,
            None => round_away_from_zero(n.as_f64()?),
        },
        Value::String(s) => s.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    (limit != 0).then_some(limit)
}

fn round_away_from_zero(bytes: f64) -> i64 {
    if bytes > 0.0 {
        bytes.ceil() as i64
    } else {
        bytes.floor() as i64
    }
}
