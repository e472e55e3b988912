//! Env-Manager: translation between workspace environment documents and
//! editable machine models
//!
//! A workspace environment is persisted as a recipe (type plus location or
//! content) and a map of machine name to machine config. Editing surfaces
//! work on a normalized list of [`EnvironmentManagerMachine`]s instead.
//! Each recipe format has its own [`EnvironmentManager`] that converts in
//! both directions:
//!
//! 1. `get_machines(&document)` produces detached machine copies,
//! 2. the caller edits them through the manager's accessors,
//! 3. `get_environment(&document, &machines)` produces a new document.
//!
//! The original document is never mutated by either direction, and fields
//! a translator does not own survive the round trip unchanged.
//!
//! No I/O happens here. Errors are returned, never logged.

pub mod agents;
pub mod docker_image;
pub mod document;
pub mod error;
pub mod machine;
pub mod manager;
pub mod recipe;
pub mod registry;

pub use agents::{DevAgents, SSH_AGENT, TERMINAL_AGENT, WS_AGENT};
pub use docker_image::DockerImageEnvironmentManager;
pub use document::{
    Nullable, RawEnvironment, RawMachineConfig, RecipeDescriptor, ServerConfig,
    MEMORY_LIMIT_ATTRIBUTE,
};
pub use error::EnvManagerError;
pub use machine::EnvironmentManagerMachine;
pub use manager::{EnvironmentManager, MachineSource, MEMORY_LIMIT_UNSET};
pub use recipe::RecipeType;
pub use registry::{manager_for, manager_for_environment, manager_with_agents};

/// Result type for env-manager operations
pub type Result<T> = std::result::Result<T, EnvManagerError>;
