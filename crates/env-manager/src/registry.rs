//! Translator selection by recipe type

use crate::agents::DevAgents;
use crate::docker_image::DockerImageEnvironmentManager;
use crate::document::RawEnvironment;
use crate::error::EnvManagerError;
use crate::manager::EnvironmentManager;
use crate::recipe::RecipeType;
use crate::Result;
use tracing::debug;

/// Translator for `recipe_type` with the default developer agents
pub fn manager_for(recipe_type: &RecipeType) -> Result<Box<dyn EnvironmentManager>> {
    manager_with_agents(recipe_type, DevAgents::default())
}

/// Translator for `recipe_type` using `dev_agents`
pub fn manager_with_agents(
    recipe_type: &RecipeType,
    dev_agents: DevAgents,
) -> Result<Box<dyn EnvironmentManager>> {
    debug!(event = "manager.select", recipe_type = %recipe_type);

    match recipe_type {
        RecipeType::DockerImage => Ok(Box::new(DockerImageEnvironmentManager::with_dev_agents(
            dev_agents,
        ))),
        RecipeType::Dockerfile | RecipeType::Compose | RecipeType::Other(_) => Err(
            EnvManagerError::UnsupportedRecipeType(recipe_type.to_string()),
        ),
    }
}

/// Translator for the recipe type of `environment`
pub fn manager_for_environment(
    environment: &RawEnvironment,
) -> Result<Box<dyn EnvironmentManager>> {
    manager_for(&environment.recipe.recipe_type)
}
