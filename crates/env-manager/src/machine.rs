//! Normalized per-machine model used while editing an environment

use crate::document::{RecipeDescriptor, ServerConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// One machine of an environment, detached from the raw document.
///
/// Every field is owned. A machine built by a translator never shares
/// state with the document it came from, so edits stay local until the
/// machine list is handed back to `get_environment`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentManagerMachine {
    /// Unique within one environment
    pub name: String,
    /// Copy of the document-level recipe
    pub recipe: RecipeDescriptor,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    /// Order is kept for display only
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
}

impl EnvironmentManagerMachine {
    /// Create a machine with empty attributes, agents and servers
    pub fn new(name: impl Into<String>, recipe: &RecipeDescriptor) -> Self {
        EnvironmentManagerMachine {
            name: name.into(),
            recipe: recipe.clone(),
            attributes: Map::new(),
            agents: Vec::new(),
            servers: BTreeMap::new(),
        }
    }
}
