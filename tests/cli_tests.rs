//! Exit codes of the built binary
//!
//! External tools are replaced with `true`/`false`, so nothing here needs
//! kind, docker or a cluster.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::net::TcpListener;
use tempfile::TempDir;

/// Every variable the binary reads, so the host environment cannot leak in
const ENV_VARS: &[&str] = &[
    "KIND_CLUSTER_MANIFEST",
    "KIND_KUBECONFIG",
    "KIND_INITIAL_KUBERNETES_MANIFESTS",
    "KIND_DNS_SERVER_IP",
    "KIND_CONTROL_PLANE_NODE",
    "KIND_SETTLE_DELAY_SECS",
    "KIND_READINESS_ADDR",
    "KIND_READINESS_TIMEOUT_SECS",
    "KIND_BOOTSTRAP_CONFIG",
    "KIND_BIN",
    "YQ_BIN",
    "DOCKER_BIN",
    "KUBECTL_BIN",
];

fn bootstrap(args: &[&str], env: &[(&str, &str)]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_kind-bootstrap"));
    cmd.args(args);
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.envs(env.iter().copied());
    cmd
}

// ==================== Dispatcher ====================

#[test]
fn test_no_arguments_exits_2() {
    bootstrap(&[], &[])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_too_many_arguments_exits_2() {
    bootstrap(&["create", "now"], &[("KIND_BIN", "/nonexistent/kind")])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn test_unrecognized_command_exits_3() {
    bootstrap(&["destroy"], &[])
        .assert()
        .code(3)
        .stdout(predicate::str::starts_with("bad command"));
}

#[test]
fn test_help_exits_0() {
    bootstrap(&["help"], &[])
        .assert()
        .success()
        .stdout(predicate::str::contains("KIND_CLUSTER_MANIFEST"));
}

// ==================== Create ====================

#[test]
fn test_create_without_manifest_exits_4() {
    let temp = TempDir::new().unwrap();
    let kubeconfig = temp.path().join("config");
    fs::write(&kubeconfig, "keep me").unwrap();

    bootstrap(
        &["create"],
        &[
            ("KIND_KUBECONFIG", kubeconfig.to_str().unwrap()),
            ("KIND_BIN", "/nonexistent/kind"),
        ],
    )
    .assert()
    .code(4)
    .stdout(predicate::str::contains("You must define KIND_CLUSTER_MANIFEST"));

    assert_eq!(fs::read_to_string(&kubeconfig).unwrap(), "keep me");
}

#[test]
fn test_create_invalid_setting_exits_4() {
    bootstrap(
        &["create"],
        &[
            ("KIND_CLUSTER_MANIFEST", "/tmp/c.yml"),
            ("KIND_SETTLE_DELAY_SECS", "five"),
        ],
    )
    .assert()
    .code(4)
    .stderr(predicate::str::contains("KIND_SETTLE_DELAY_SECS"));
}

#[cfg(unix)]
#[test]
fn test_create_cluster_failure_passes_status_through() {
    let temp = TempDir::new().unwrap();
    let kubeconfig = temp.path().join("config");
    fs::write(&kubeconfig, "stale").unwrap();

    // A later step would fail to spawn (127) if it were reached
    bootstrap(
        &["create"],
        &[
            ("KIND_CLUSTER_MANIFEST", "/tmp/c.yml"),
            ("KIND_KUBECONFIG", kubeconfig.to_str().unwrap()),
            ("KIND_BIN", "false"),
            ("YQ_BIN", "/nonexistent/yq"),
        ],
    )
    .assert()
    .code(1);

    assert_eq!(fs::read_to_string(&kubeconfig).unwrap(), "");
}

#[cfg(unix)]
#[test]
fn test_create_all_steps_succeed() {
    let temp = TempDir::new().unwrap();
    let kubeconfig = temp.path().join(".kube/config");

    bootstrap(
        &["create"],
        &[
            ("KIND_CLUSTER_MANIFEST", "/tmp/c.yml"),
            ("KIND_KUBECONFIG", kubeconfig.to_str().unwrap()),
            ("KIND_SETTLE_DELAY_SECS", "0"),
            ("KIND_BIN", "true"),
            ("YQ_BIN", "true"),
            ("DOCKER_BIN", "true"),
            ("KUBECTL_BIN", "true"),
        ],
    )
    .assert()
    .success();

    assert_eq!(fs::read_to_string(&kubeconfig).unwrap(), "");
}

#[cfg(unix)]
#[test]
fn test_create_readiness_timeout_at_u64_max() {
    let temp = TempDir::new().unwrap();
    let kubeconfig = temp.path().join("config");
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let timeout = u64::MAX.to_string();

    bootstrap(
        &["create"],
        &[
            ("KIND_CLUSTER_MANIFEST", "/tmp/c.yml"),
            ("KIND_KUBECONFIG", kubeconfig.to_str().unwrap()),
            ("KIND_READINESS_ADDR", address.as_str()),
            ("KIND_READINESS_TIMEOUT_SECS", timeout.as_str()),
            ("KIND_BIN", "true"),
            ("YQ_BIN", "true"),
            ("DOCKER_BIN", "true"),
            ("KUBECTL_BIN", "true"),
        ],
    )
    .assert()
    .success();
}

#[test]
fn test_create_malformed_config_file_exits_4() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("bootstrap.yml");
    fs::write(&file, "manifest: [unterminated\n").unwrap();

    bootstrap(
        &["create"],
        &[
            ("KIND_CLUSTER_MANIFEST", "/tmp/c.yml"),
            ("KIND_BOOTSTRAP_CONFIG", file.to_str().unwrap()),
            ("KIND_BIN", "/nonexistent/kind"),
        ],
    )
    .assert()
    .code(4)
    .stderr(predicate::str::contains("failed to parse config file"));
}

#[test]
fn test_create_missing_config_file_exits_4() {
    bootstrap(
        &["create"],
        &[
            ("KIND_CLUSTER_MANIFEST", "/tmp/c.yml"),
            ("KIND_BOOTSTRAP_CONFIG", "/nonexistent/bootstrap.yml"),
            ("KIND_BIN", "/nonexistent/kind"),
        ],
    )
    .assert()
    .code(4)
    .stderr(predicate::str::contains("/nonexistent/bootstrap.yml"));
}

#[test]
fn test_create_missing_tool_exits_127() {
    let temp = TempDir::new().unwrap();
    let kubeconfig = temp.path().join("config");

    bootstrap(
        &["create"],
        &[
            ("KIND_CLUSTER_MANIFEST", "/tmp/c.yml"),
            ("KIND_KUBECONFIG", kubeconfig.to_str().unwrap()),
            ("KIND_BIN", "/nonexistent/kind"),
        ],
    )
    .assert()
    .code(127)
    .stderr(predicate::str::contains("/nonexistent/kind"));
}

// ==================== Delete ====================

#[cfg(unix)]
#[test]
fn test_delete_succeeds() {
    bootstrap(&["delete"], &[("KIND_BIN", "true")])
        .assert()
        .success();
}

#[cfg(unix)]
#[test]
fn test_delete_ignores_unrelated_settings() {
    bootstrap(
        &["delete"],
        &[
            ("KIND_BIN", "true"),
            ("KIND_SETTLE_DELAY_SECS", "not-a-number"),
            ("KIND_KUBECONFIG", "/nonexistent/dir/config"),
            ("YQ_BIN", "/nonexistent/yq"),
        ],
    )
    .assert()
    .success();
}

#[cfg(unix)]
#[test]
fn test_delete_ignores_missing_config_file() {
    bootstrap(
        &["delete"],
        &[
            ("KIND_BIN", "true"),
            ("KIND_BOOTSTRAP_CONFIG", "/nonexistent/bootstrap.yml"),
        ],
    )
    .assert()
    .success();
}

#[cfg(unix)]
#[test]
fn test_delete_ignores_malformed_config_file() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("bootstrap.yml");
    fs::write(&file, "tools: [unterminated\n").unwrap();

    bootstrap(
        &["delete"],
        &[
            ("KIND_BIN", "true"),
            ("KIND_BOOTSTRAP_CONFIG", file.to_str().unwrap()),
        ],
    )
    .assert()
    .success();
}

#[cfg(unix)]
#[test]
fn test_delete_failure_passes_status_through() {
    bootstrap(&["delete"], &[("KIND_BIN", "false")])
        .assert()
        .code(1);
}
