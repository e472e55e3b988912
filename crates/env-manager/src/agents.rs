//! Agent identifiers that make a machine a developer machine

use serde::{Deserialize, Serialize};

/// Workspace agent; its presence alone defines a dev machine
pub const WS_AGENT: &str = "org.eclipse.che.ws-agent";
/// SSH agent
pub const SSH_AGENT: &str = "org.eclipse.che.ssh";
/// Terminal agent
pub const TERMINAL_AGENT: &str = "org.eclipse.che.terminal";

/// Agent set installed when a machine is marked as developer machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevAgents {
    /// Workspace agent identifier
    pub ws_agent: String,
    /// SSH agent identifier
    pub ssh_agent: String,
    /// Terminal agent identifier
    pub terminal_agent: String,
}

impl Default for DevAgents {
    fn default() -> Self {
        DevAgents {
            ws_agent: WS_AGENT.to_string(),
            ssh_agent: SSH_AGENT.to_string(),
            terminal_agent: TERMINAL_AGENT.to_string(),
        }
    }
}

impl DevAgents {
    /// Create from environment variables, falling back to the defaults
    ///
    /// Reads `ENV_MANAGER_WS_AGENT`, `ENV_MANAGER_SSH_AGENT` and
    /// `ENV_MANAGER_TERMINAL_AGENT`.
    pub fn from_env() -> Self {
        DevAgents {
            ws_agent: std::env::var("ENV_MANAGER_WS_AGENT")
                .unwrap_or_else(|_| WS_AGENT.to_string()),
            ssh_agent: std::env::var("ENV_MANAGER_SSH_AGENT")
                .unwrap_or_else(|_| SSH_AGENT.to_string()),
            terminal_agent: std::env::var("ENV_MANAGER_TERMINAL_AGENT")
                .unwrap_or_else(|_| TERMINAL_AGENT.to_string()),
        }
    }

    /// Identifiers appended by `set_dev(.., true)`, in insertion order
    pub fn install_order(&self) -> [&str; 3] {
        [
            self.ws_agent.as_str(),
            self.ssh_agent.as_str(),
            self.terminal_agent.as_str(),
        ]
    }
}
