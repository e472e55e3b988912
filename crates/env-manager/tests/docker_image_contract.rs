//! Contract tests for the single-image translator and the shared accessors.

use env_manager::{
    manager_for_environment, DockerImageEnvironmentManager, EnvManagerError, EnvironmentManager,
    MachineSource, RawEnvironment, RecipeType, SSH_AGENT, TERMINAL_AGENT, WS_AGENT,
};
use serde_json::json;

fn single_machine_environment() -> RawEnvironment {
    RawEnvironment::from_value(json!({
        "recipe": {"type": "dockerimage", "location": "codenvy/ubuntu_jdk8"},
        "machines": {"dev-machine": {}}
    }))
    .unwrap()
}

// ── Source extraction ───────────────────────────────────────────────────

#[test]
fn test_source_is_the_recipe_image() {
    let manager = DockerImageEnvironmentManager::new();
    let machines = manager.get_machines(&single_machine_environment());

    assert_eq!(machines.len(), 1);
    assert_eq!(machines[0].name, "dev-machine");
    assert_eq!(
        manager.get_source(&machines[0]),
        MachineSource::Image {
            image: "codenvy/ubuntu_jdk8".to_string()
        }
    );
    assert_eq!(
        serde_json::to_value(manager.get_source(&machines[0])).unwrap(),
        json!({"image": "codenvy/ubuntu_jdk8"})
    );
}

#[test]
fn test_registry_selects_docker_image_translator() {
    let env = single_machine_environment();
    let manager = manager_for_environment(&env).unwrap();

    assert_eq!(manager.recipe_type(), RecipeType::DockerImage);
    let machines = manager.get_machines(&env);
    assert_eq!(
        manager.get_source(&machines[0]),
        MachineSource::Image {
            image: "codenvy/ubuntu_jdk8".to_string()
        }
    );
}

// ── Capabilities and unsupported operations ─────────────────────────────

#[test]
fn test_capabilities_all_unsupported() {
    let manager = DockerImageEnvironmentManager::new();
    let machines = manager.get_machines(&single_machine_environment());
    let machine = &machines[0];

    assert!(!manager.can_rename_machine(machine));
    assert!(!manager.can_delete_machine(machine));
    assert!(!manager.can_add_machine(machine));
    assert!(!manager.can_edit_env_variables(machine));
    assert_eq!(manager.editor_mode(), "");
    assert_eq!(manager.get_env_variables(machine), None);
}

#[test]
fn test_rename_fails_unsupported() {
    let manager = DockerImageEnvironmentManager::new();
    let mut env = single_machine_environment();
    let before = env.clone();

    let err = manager
        .rename_machine(&mut env, "dev-machine", "main")
        .unwrap_err();
    assert!(matches!(
        err,
        EnvManagerError::UnsupportedOperation {
            operation: "rename machine",
            ..
        }
    ));
    assert_eq!(env, before);
}

#[test]
fn test_delete_fails_unsupported() {
    let manager = DockerImageEnvironmentManager::new();
    let mut env = single_machine_environment();

    let err = manager.delete_machine(&mut env, "dev-machine").unwrap_err();
    assert!(err.is_unsupported_operation());
    assert_eq!(
        err.to_string(),
        "dockerimage environment manager: cannot delete machine"
    );
    assert!(env.machines.contains_key("dev-machine"));
}

// ── Dev designation ─────────────────────────────────────────────────────

#[test]
fn test_set_dev_is_idempotent() {
    let manager = DockerImageEnvironmentManager::new();
    let mut machines = manager.get_machines(&single_machine_environment());
    let machine = &mut machines[0];

    manager.set_dev(machine, true);
    let once = machine.agents.clone();
    manager.set_dev(machine, true);

    assert_eq!(machine.agents, once);
    assert_eq!(once, vec![WS_AGENT, SSH_AGENT, TERMINAL_AGENT]);
    assert!(manager.is_dev(machine));
}

#[test]
fn test_unset_dev_removes_only_ws_agent() {
    let manager = DockerImageEnvironmentManager::new();
    let mut machines = manager.get_machines(&single_machine_environment());
    let machine = &mut machines[0];
    manager.set_agents(
        machine,
        &[
            WS_AGENT.to_string(),
            SSH_AGENT.to_string(),
            TERMINAL_AGENT.to_string(),
            "custom-agent".to_string(),
        ],
    );

    manager.set_dev(machine, false);

    assert_eq!(
        manager.get_agents(machine),
        &[SSH_AGENT, TERMINAL_AGENT, "custom-agent"]
    );
    assert!(!manager.is_dev(machine));
}

// ── Memory limit ────────────────────────────────────────────────────────

#[test]
fn test_memory_limit_sentinel_then_set() {
    let manager = DockerImageEnvironmentManager::new();
    let mut machines = manager.get_machines(&single_machine_environment());
    let machine = &mut machines[0];

    assert_eq!(manager.get_memory_limit(machine), -1);
    manager.set_memory_limit(machine, 2048);
    assert_eq!(manager.get_memory_limit(machine), 2048);
}

// ── Servers ─────────────────────────────────────────────────────────────

#[test]
fn test_set_servers_copies() {
    let manager = DockerImageEnvironmentManager::new();
    let env = RawEnvironment::from_value(json!({
        "recipe": {"type": "dockerimage", "location": "alpine"},
        "machines": {
            "a": {"servers": {"web": {"port": 80, "protocol": "http"}}},
            "b": {}
        }
    }))
    .unwrap();
    let mut machines = manager.get_machines(&env);

    let servers = manager.get_servers(&machines[0]).clone();
    manager.set_servers(&mut machines[1], &servers);
    machines[0].servers.clear();

    assert!(manager.get_servers(&machines[1]).contains_key("web"));
}
