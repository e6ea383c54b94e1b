//! Bootstrap sequencer
//!
//! Runs a [`BootstrapPlan`] step by step:
//! - steps run strictly in order, one at a time
//! - the first failing fatal step ends the plan and its error is returned
//! - nothing is retried or rolled back; a half-built cluster is left as-is

pub mod settle;

use crate::config::ClusterConfig;
use crate::error::{BootstrapError, ConfigError, StepError};
use crate::plan::{Action, BootstrapPlan, Step};
use crate::runner::{CommandRunner, Invocation};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

/// Check that `config` is complete enough to create a cluster
pub fn validate_config(config: &ClusterConfig) -> Result<(), ConfigError> {
    config.validate()
}

/// Executes bootstrap plans through a [`CommandRunner`]
pub struct Sequencer {
    runner: Arc<dyn CommandRunner>,
    interrupt: Arc<Notify>,
}

impl Sequencer {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            runner,
            interrupt: Arc::new(Notify::new()),
        }
    }

    /// Share an interrupt handle with the caller
    pub fn with_interrupt(mut self, interrupt: Arc<Notify>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Handle that cancels a settle step in progress (or the next one)
    pub fn interrupt_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.interrupt)
    }

    /// Validate `config` and bring the cluster up
    pub async fn create(&self, config: &ClusterConfig) -> Result<(), BootstrapError> {
        let plan = BootstrapPlan::create(config)?;
        self.execute(&plan).await?;
        Ok(())
    }

    /// Tear the cluster down
    pub async fn delete(&self, config: &ClusterConfig) -> Result<(), StepError> {
        self.execute(&BootstrapPlan::delete(config)).await
    }

    /// Run every step of `plan` in order
    pub async fn execute(&self, plan: &BootstrapPlan) -> Result<(), StepError> {
        let total = plan.len();
        info!(
            "Running {} plan ({} steps, runner: {})",
            plan.kind(),
            total,
            self.runner.name()
        );

        for (i, step) in plan.steps().iter().enumerate() {
            info!("[{}/{}] {}", i + 1, total, step.label);

            match self.run_step(step).await {
                Ok(()) => {}
                Err(e) if !step.fatal => {
                    warn!("Step '{}' failed, continuing: {}", step.label, e);
                }
                Err(e) => {
                    debug!("Step '{}' failed: {}", step.label, e);
                    return Err(e);
                }
            }
        }

        info!("{} plan completed", plan.kind());
        Ok(())
    }

    async fn run_step(&self, step: &Step) -> Result<(), StepError> {
        match &step.action {
            Action::Truncate(path) => truncate(path).await,
            Action::Exec(invocation) => self.exec(step.label, invocation).await,
            Action::Settle(policy) => {
                debug!("Settle: {}", policy);
                settle::settle(policy, &self.interrupt).await
            }
        }
    }

    async fn exec(&self, label: &str, invocation: &Invocation) -> Result<(), StepError> {
        debug!("Executing: {}", invocation);

        let code = self
            .runner
            .run(invocation)
            .await
            .map_err(|source| StepError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if code != 0 {
            return Err(StepError::ExternalFailure {
                step: label.to_string(),
                code,
            });
        }
        Ok(())
    }
}

/// Overwrite `path` with empty content, creating parent directories
async fn truncate(path: &Path) -> Result<(), StepError> {
    let io_err = |source| StepError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    fs::write(path, b"").await.map_err(io_err)?;

    debug!("Truncated {}", path.display());
    Ok(())
}
