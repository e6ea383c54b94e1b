//! Bootstrap plans
//!
//! A plan is a fixed, ordered list of steps built from a [`ClusterConfig`].
//! Plans are plain data: building one has no side effects, and the
//! sequencer runs the steps in exactly the order they appear.

use crate::config::ClusterConfig;
use crate::error::ConfigError;
use crate::runner::Invocation;
use crate::sequencer::settle::SettlePolicy;
use std::path::PathBuf;

/// Server URL written into the kubeconfig after creation
pub const INTERNAL_API_SERVER: &str = "https://kubernetes:6443";

/// What a step does
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Overwrite a file with empty content
    Truncate(PathBuf),
    /// Run an external program
    Exec(Invocation),
    /// Wait for the control plane
    Settle(SettlePolicy),
}

/// A labelled unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub label: &'static str,
    pub action: Action,
    /// A failing fatal step stops the plan; otherwise it is logged and skipped
    pub fatal: bool,
}

impl Step {
    pub fn fatal(label: &'static str, action: Action) -> Self {
        Self {
            label,
            action,
            fatal: true,
        }
    }
}

/// Which plan this is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanKind {
    Create,
    Delete,
}

impl std::fmt::Display for PlanKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanKind::Create => write!(f, "create"),
            PlanKind::Delete => write!(f, "delete"),
        }
    }
}

/// Ordered list of steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapPlan {
    kind: PlanKind,
    steps: Vec<Step>,
}

impl BootstrapPlan {
    pub fn new(kind: PlanKind, steps: Vec<Step>) -> Self {
        Self { kind, steps }
    }

    /// Build the cluster creation plan
    ///
    /// Fails without building anything if the manifest path is missing.
    pub fn create(config: &ClusterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let tools = &config.tools;
        let steps = vec![
            Step::fatal(
                "wipe kubeconfig",
                Action::Truncate(PathBuf::from(&config.kubeconfig_path)),
            ),
            Step::fatal(
                "create cluster",
                Action::Exec(
                    Invocation::new(&tools.kind)
                        .args(["create", "cluster", "--config"])
                        .arg(&config.manifest_path),
                ),
            ),
            Step::fatal(
                "patch kubeconfig server",
                Action::Exec(
                    Invocation::new(&tools.yq)
                        .args(["-i", "-y"])
                        .arg(server_patch_expression())
                        .arg(&config.kubeconfig_path),
                ),
            ),
            Step::fatal(
                "wait for control plane",
                Action::Settle(config.settle.clone()),
            ),
            Step::fatal(
                "override node dns",
                Action::Exec(
                    Invocation::new(&tools.docker)
                        .args(["exec", "-i"])
                        .arg(&config.control_plane_node)
                        .args(["sh", "-c"])
                        .arg(resolv_override(&config.dns_server)),
                ),
            ),
            Step::fatal(
                "apply initial manifests",
                Action::Exec(
                    Invocation::new(&tools.kubectl)
                        .args(["create", "-f"])
                        .arg(&config.initial_manifests_path),
                ),
            ),
        ];

        Ok(Self::new(PlanKind::Create, steps))
    }

    /// Build the cluster deletion plan
    ///
    /// Only the kind binary location is read from `config`.
    pub fn delete(config: &ClusterConfig) -> Self {
        let steps = vec![Step::fatal(
            "delete cluster",
            Action::Exec(Invocation::new(&config.tools.kind).args(["delete", "cluster"])),
        )];
        Self::new(PlanKind::Delete, steps)
    }

    pub fn kind(&self) -> PlanKind {
        self.kind
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// External invocations in plan order
    pub fn invocations(&self) -> impl Iterator<Item = &Invocation> {
        self.steps.iter().filter_map(|step| match &step.action {
            Action::Exec(invocation) => Some(invocation),
            _ => None,
        })
    }
}

/// yq expression pointing the first cluster entry at the in-cluster API server
fn server_patch_expression() -> String {
    format!(".clusters[0].cluster.server = \"{}\"", INTERNAL_API_SERVER)
}

fn resolv_override(dns_server: &str) -> String {
    format!("echo nameserver {} > /etc/resolv.conf", dns_server)
}
