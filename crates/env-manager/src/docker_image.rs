//! Translator for `dockerimage` environments
//!
//! The recipe is a single image reference:
//!
//! ```text
//! codenvy/ubuntu_jdk8
//! ```
//!
//! The image lives in `recipe.location` of the environment, not in the
//! machine configs. Machine configs contribute attributes (notably
//! `memoryLimitBytes`), agents and servers. Machines can not be renamed,
//! added or removed, and environment variables can not be set.

use crate::agents::DevAgents;
use crate::document::RawEnvironment;
use crate::machine::EnvironmentManagerMachine;
use crate::manager::{EnvironmentManager, MachineSource};
use crate::recipe::RecipeType;
use tracing::debug;

/// Environment manager for the single-image recipe format
#[derive(Debug, Clone, Default)]
pub struct DockerImageEnvironmentManager {
    dev_agents: DevAgents,
}

impl DockerImageEnvironmentManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom set of developer agents
    pub fn with_dev_agents(dev_agents: DevAgents) -> Self {
        DockerImageEnvironmentManager { dev_agents }
    }
}

impl EnvironmentManager for DockerImageEnvironmentManager {
    fn recipe_type(&self) -> RecipeType {
        RecipeType::DockerImage
    }

    fn dev_agents(&self) -> &DevAgents {
        &self.dev_agents
    }

    fn get_machines(&self, environment: &RawEnvironment) -> Vec<EnvironmentManagerMachine> {
        let machines: Vec<_> = environment
            .machines
            .iter()
            .map(|(name, config)| {
                let mut machine =
                    EnvironmentManagerMachine::new(name.as_str(), &environment.recipe);
                if let Some(Some(attributes)) = &config.attributes {
                    machine.attributes = attributes.clone();
                }
                if let Some(Some(agents)) = &config.agents {
                    machine.agents = agents.clone();
                }
                if let Some(Some(servers)) = &config.servers {
                    machine.servers = servers.clone();
                }
                machine
            })
            .collect();

        debug!(
            event = "environment.parsed",
            recipe_type = %RecipeType::DockerImage,
            machines = machines.len(),
        );
        machines
    }

    /// The image reference stored in the machine's recipe location
    fn get_source(&self, machine: &EnvironmentManagerMachine) -> MachineSource {
        MachineSource::Image {
            image: machine.recipe.location().unwrap_or_default().to_string(),
        }
    }
}
