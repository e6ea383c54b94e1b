//! Configuration loader
//!
//! Layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. Optional YAML file named by `KIND_BOOTSTRAP_CONFIG`
//! 3. Environment variables
//!
//! A variable that is set but empty is treated as unset.

use super::*;
use crate::sequencer::settle::{ReadinessProbe, SettlePolicy};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// Configuration with every field optional, as read from one source
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialConfig {
    pub manifest: Option<String>,
    pub kubeconfig: Option<String>,
    pub initial_manifests: Option<String>,
    pub dns_server: Option<String>,
    pub control_plane_node: Option<String>,
    pub settle_delay_secs: Option<u64>,
    pub readiness: ReadinessSection,
    pub tools: ToolsSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSection {
    pub address: Option<String>,
    pub timeout_secs: Option<u64>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsSection {
    pub kind: Option<String>,
    pub yq: Option<String>,
    pub docker: Option<String>,
    pub kubectl: Option<String>,
}

impl PartialConfig {
    /// Parse from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Read the variables this crate understands through `lookup`
    pub fn from_env<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Ok(Self {
            manifest: var(ENV_MANIFEST),
            kubeconfig: var(ENV_KUBECONFIG),
            initial_manifests: var(ENV_INITIAL_MANIFESTS),
            dns_server: var(ENV_DNS_SERVER),
            control_plane_node: var(ENV_CONTROL_PLANE_NODE),
            settle_delay_secs: parse_secs(ENV_SETTLE_DELAY, var(ENV_SETTLE_DELAY))?,
            readiness: ReadinessSection {
                address: var(ENV_READINESS_ADDR),
                timeout_secs: parse_secs(ENV_READINESS_TIMEOUT, var(ENV_READINESS_TIMEOUT))?,
                ..Default::default()
            },
            tools: ToolsSection::from_env(&lookup),
        })
    }

    /// Overlay `other` on top of `self`; values present in `other` win
    pub fn merge(self, other: PartialConfig) -> PartialConfig {
        PartialConfig {
            manifest: other.manifest.or(self.manifest),
            kubeconfig: other.kubeconfig.or(self.kubeconfig),
            initial_manifests: other.initial_manifests.or(self.initial_manifests),
            dns_server: other.dns_server.or(self.dns_server),
            control_plane_node: other.control_plane_node.or(self.control_plane_node),
            settle_delay_secs: other.settle_delay_secs.or(self.settle_delay_secs),
            readiness: ReadinessSection {
                address: other.readiness.address.or(self.readiness.address),
                timeout_secs: other.readiness.timeout_secs.or(self.readiness.timeout_secs),
                initial_backoff_ms: other
                    .readiness
                    .initial_backoff_ms
                    .or(self.readiness.initial_backoff_ms),
                max_backoff_ms: other.readiness.max_backoff_ms.or(self.readiness.max_backoff_ms),
            },
            tools: self.tools.merge(other.tools),
        }
    }

    /// Fill in defaults for everything still unset
    pub fn resolve(self) -> ClusterConfig {
        let defaults = ClusterConfig::default();
        let tools = self.tools.resolve();

        let readiness = self.readiness;
        let settle = match readiness.address {
            Some(address) => {
                let timeout = readiness
                    .timeout_secs
                    .unwrap_or(DEFAULT_READINESS_TIMEOUT_SECS);
                let probe = ReadinessProbe::new(address, Duration::from_secs(timeout));
                let initial = readiness
                    .initial_backoff_ms
                    .map(Duration::from_millis)
                    .unwrap_or(probe.initial_backoff);
                let max = readiness
                    .max_backoff_ms
                    .map(Duration::from_millis)
                    .unwrap_or(probe.max_backoff);
                SettlePolicy::Probe(probe.with_backoff(initial, max))
            }
            None => match self.settle_delay_secs {
                Some(secs) => SettlePolicy::Delay(Duration::from_secs(secs)),
                None => defaults.settle,
            },
        };

        ClusterConfig {
            manifest_path: self.manifest.unwrap_or_default(),
            kubeconfig_path: self.kubeconfig.unwrap_or(defaults.kubeconfig_path),
            initial_manifests_path: self
                .initial_manifests
                .unwrap_or(defaults.initial_manifests_path),
            dns_server: self.dns_server.unwrap_or(defaults.dns_server),
            control_plane_node: self
                .control_plane_node
                .unwrap_or(defaults.control_plane_node),
            tools,
            settle,
        }
    }
}

impl ToolsSection {
    fn from_env<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            kind: var(ENV_KIND_BIN),
            yq: var(ENV_YQ_BIN),
            docker: var(ENV_DOCKER_BIN),
            kubectl: var(ENV_KUBECTL_BIN),
        }
    }

    fn merge(self, other: ToolsSection) -> ToolsSection {
        ToolsSection {
            kind: other.kind.or(self.kind),
            yq: other.yq.or(self.yq),
            docker: other.docker.or(self.docker),
            kubectl: other.kubectl.or(self.kubectl),
        }
    }

    fn resolve(self) -> ToolPaths {
        let defaults = ToolPaths::default();
        ToolPaths {
            kind: self.kind.unwrap_or(defaults.kind),
            yq: self.yq.unwrap_or(defaults.yq),
            docker: self.docker.unwrap_or(defaults.docker),
            kubectl: self.kubectl.unwrap_or(defaults.kubectl),
        }
    }
}

fn parse_secs(key: &str, value: Option<String>) -> Result<Option<u64>, ConfigError> {
    value
        .map(|v| v.trim().parse::<u64>().map_err(|_| ConfigError::invalid(key, v)))
        .transpose()
}

/// Read a YAML config file
async fn load_config_file(path: &Path) -> Result<PartialConfig, ConfigError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        })?;

    PartialConfig::from_yaml(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Builder that assembles a [`ClusterConfig`] from its sources
pub struct ConfigLoader {
    env: EnvLookup,
    file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader reading the process environment
    pub fn new() -> Self {
        Self {
            env: Box::new(|key: &str| std::env::var(key).ok()),
            file: None,
        }
    }

    /// Use a custom variable lookup instead of the process environment
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    /// Use a fixed set of variables instead of the process environment
    pub fn with_vars<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.with_env(move |key| vars.get(key).cloned())
    }

    /// Read this config file regardless of `KIND_BOOTSTRAP_CONFIG`
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Load and merge all sources
    pub async fn load(self) -> Result<ClusterConfig, ConfigError> {
        let base = self.load_file().await?;
        let overlay = PartialConfig::from_env(&self.env)?;
        Ok(base.merge(overlay).resolve())
    }

    /// Load only the tool locations
    ///
    /// Cluster deletion needs nothing else, so the other variables are not
    /// read. An unreadable or malformed config file is logged and skipped.
    pub async fn load_tools(self) -> ToolPaths {
        let base = self.load_file().await.unwrap_or_else(|e| {
            warn!("Ignoring config file: {}", e);
            PartialConfig::default()
        });
        let overlay = ToolsSection::from_env(&self.env);
        base.tools.merge(overlay).resolve()
    }

    async fn load_file(&self) -> Result<PartialConfig, ConfigError> {
        let file = self
            .file
            .clone()
            .or_else(|| (self.env)(ENV_CONFIG_FILE).filter(|v| !v.is_empty()).map(PathBuf::from));

        match file {
            Some(path) => {
                debug!("Loading config file {}", path.display());
                load_config_file(&path).await
            }
            None => Ok(PartialConfig::default()),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
