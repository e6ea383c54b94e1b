//! Cluster configuration
//!
//! A [`ClusterConfig`] is built once at process entry by the
//! [`loader::ConfigLoader`] and passed by reference into the sequencer.

pub mod loader;

use crate::error::ConfigError;
use crate::sequencer::settle::SettlePolicy;

pub use loader::{ConfigLoader, PartialConfig};

/// Path to the kind cluster manifest (required)
pub const ENV_MANIFEST: &str = "KIND_CLUSTER_MANIFEST";
/// Kubeconfig wiped and rewritten during bootstrap
pub const ENV_KUBECONFIG: &str = "KIND_KUBECONFIG";
/// Manifest bundle applied once the cluster is up
pub const ENV_INITIAL_MANIFESTS: &str = "KIND_INITIAL_KUBERNETES_MANIFESTS";
/// Resolver address injected into the control-plane node
pub const ENV_DNS_SERVER: &str = "KIND_DNS_SERVER_IP";
/// Container name of the control-plane node
pub const ENV_CONTROL_PLANE_NODE: &str = "KIND_CONTROL_PLANE_NODE";
/// Fixed settle delay in seconds
pub const ENV_SETTLE_DELAY: &str = "KIND_SETTLE_DELAY_SECS";
/// `host:port` polled instead of the fixed settle delay
pub const ENV_READINESS_ADDR: &str = "KIND_READINESS_ADDR";
/// Upper bound on the readiness poll, in seconds
pub const ENV_READINESS_TIMEOUT: &str = "KIND_READINESS_TIMEOUT_SECS";
/// Optional YAML config file
pub const ENV_CONFIG_FILE: &str = "KIND_BOOTSTRAP_CONFIG";
/// kind binary
pub const ENV_KIND_BIN: &str = "KIND_BIN";
/// yq binary used to patch the kubeconfig
pub const ENV_YQ_BIN: &str = "YQ_BIN";
/// docker binary used to reach the control-plane node
pub const ENV_DOCKER_BIN: &str = "DOCKER_BIN";
/// kubectl binary used to apply the initial manifests
pub const ENV_KUBECTL_BIN: &str = "KUBECTL_BIN";

pub const DEFAULT_KUBECONFIG: &str = "/root/.kube/config";
pub const DEFAULT_INITIAL_MANIFESTS: &str = "/manifests/init.yml";
pub const DEFAULT_DNS_SERVER: &str = "10.254.254.254";
pub const DEFAULT_CONTROL_PLANE_NODE: &str = "kind-control-plane";
pub const DEFAULT_READINESS_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_KIND_BIN: &str = "/usr/local/bin/kind";
pub const DEFAULT_YQ_BIN: &str = "/usr/bin/yq";
pub const DEFAULT_DOCKER_BIN: &str = "/usr/local/bin/docker";
pub const DEFAULT_KUBECTL_BIN: &str = "/usr/local/bin/kubectl";

/// Locations of the external tools the plans invoke
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub kind: String,
    pub yq: String,
    pub docker: String,
    pub kubectl: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            kind: DEFAULT_KIND_BIN.to_string(),
            yq: DEFAULT_YQ_BIN.to_string(),
            docker: DEFAULT_DOCKER_BIN.to_string(),
            kubectl: DEFAULT_KUBECTL_BIN.to_string(),
        }
    }
}

/// Immutable configuration for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// kind cluster topology file, passed to `kind create cluster --config`
    pub manifest_path: String,
    /// Kubeconfig truncated before creation and patched afterwards
    pub kubeconfig_path: String,
    /// Bundle applied with `kubectl create -f`
    pub initial_manifests_path: String,
    /// Nameserver written into the control-plane node's resolv.conf
    pub dns_server: String,
    /// Container name of the control-plane node
    pub control_plane_node: String,
    pub tools: ToolPaths,
    /// How to wait for the control plane after patching the kubeconfig
    pub settle: SettlePolicy,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            manifest_path: String::new(),
            kubeconfig_path: DEFAULT_KUBECONFIG.to_string(),
            initial_manifests_path: DEFAULT_INITIAL_MANIFESTS.to_string(),
            dns_server: DEFAULT_DNS_SERVER.to_string(),
            control_plane_node: DEFAULT_CONTROL_PLANE_NODE.to_string(),
            tools: ToolPaths::default(),
            settle: SettlePolicy::default(),
        }
    }
}

impl ClusterConfig {
    /// Create a config for the given manifest with every other field defaulted
    pub fn new(manifest_path: impl Into<String>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            ..Default::default()
        }
    }

    pub fn with_kubeconfig(mut self, path: impl Into<String>) -> Self {
        self.kubeconfig_path = path.into();
        self
    }

    pub fn with_initial_manifests(mut self, path: impl Into<String>) -> Self {
        self.initial_manifests_path = path.into();
        self
    }

    pub fn with_dns_server(mut self, address: impl Into<String>) -> Self {
        self.dns_server = address.into();
        self
    }

    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_settle(mut self, settle: SettlePolicy) -> Self {
        self.settle = settle;
        self
    }

    /// Check that the configuration is complete enough to create a cluster
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest_path.is_empty() {
            return Err(ConfigError::MissingManifest);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = ClusterConfig::default();
        assert!(config.manifest_path.is_empty());
        assert_eq!(config.kubeconfig_path, "/root/.kube/config");
        assert_eq!(config.initial_manifests_path, "/manifests/init.yml");
        assert_eq!(config.dns_server, "10.254.254.254");
        assert_eq!(config.control_plane_node, "kind-control-plane");
        assert_eq!(config.tools.kind, "/usr/local/bin/kind");
        assert_eq!(config.settle, SettlePolicy::Delay(Duration::from_secs(5)));
    }

    #[test]
    fn test_validate_requires_manifest() {
        assert!(matches!(
            ClusterConfig::default().validate(),
            Err(ConfigError::MissingManifest)
        ));
        assert!(ClusterConfig::new("/tmp/c.yml").validate().is_ok());
    }
}
