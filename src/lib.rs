//! kind-bootstrap library
//!
//! Ordered bootstrap and teardown of a local kind Kubernetes cluster.
//!
//! # Design
//!
//! - **Explicit configuration**: a [`ClusterConfig`] is built once and passed
//!   by reference; nothing is read from the environment after startup
//! - **Plans as data**: [`BootstrapPlan`] lists the steps, [`Sequencer`] runs them
//! - **Substitutable runner**: every external program goes through
//!   [`runner::CommandRunner`]
//! - **First failure wins**: no retries, no rollback

pub mod config;
pub mod plan;
pub mod runner;
pub mod sequencer;
pub mod usage;

mod error;

pub use config::{ClusterConfig, ConfigLoader, ToolPaths};
pub use error::{
    BootstrapError, CommandError, ConfigError, EXIT_BAD_ARITY, EXIT_CONFIG, EXIT_INTERRUPTED,
    EXIT_NOT_READY, EXIT_SPAWN, EXIT_UNRECOGNIZED, StepError,
};
pub use plan::{Action, BootstrapPlan, PlanKind, Step};
pub use sequencer::settle::{ReadinessProbe, SettlePolicy};
pub use sequencer::{Sequencer, validate_config};
