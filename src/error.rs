//! Error types for kind-bootstrap

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Exit code for usage errors caused by the wrong number of arguments
pub const EXIT_BAD_ARITY: u8 = 2;
/// Exit code for an unrecognized command word
pub const EXIT_UNRECOGNIZED: u8 = 3;
/// Exit code for missing or invalid configuration
pub const EXIT_CONFIG: u8 = 4;
/// Exit code when the cluster never became reachable
pub const EXIT_NOT_READY: u8 = 124;
/// Exit code when an external program could not be started
pub const EXIT_SPAWN: u8 = 127;
/// Exit code when the settle step was interrupted
pub const EXIT_INTERRUPTED: u8 = 130;

/// Configuration is incomplete or unreadable
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cluster manifest path is not set")]
    MissingManifest,

    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("failed to read config file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

impl ConfigError {
    /// Create an invalid value error
    pub fn invalid(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A step of a bootstrap plan failed
#[derive(Error, Debug)]
pub enum StepError {
    #[error("step '{step}' exited with status {code}")]
    ExternalFailure { step: String, code: i32 },

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cluster not ready: {address} unreachable after {waited:?}")]
    ClusterNotReady { address: String, waited: Duration },

    #[error("interrupted")]
    Interrupted,
}

/// The command line did not select a command
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("expected exactly one command, got {0} arguments")]
    BadArity(usize),

    #[error("bad command: {0}")]
    Unrecognized(String),
}

/// Top-level error carried back to `main`
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Step(#[from] StepError),

    #[error(transparent)]
    Command(#[from] CommandError),
}

impl BootstrapError {
    /// Process exit code for this error
    ///
    /// External failures pass the tool's own status through unchanged.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => EXIT_CONFIG,
            Self::Command(CommandError::BadArity(_)) => EXIT_BAD_ARITY,
            Self::Command(CommandError::Unrecognized(_)) => EXIT_UNRECOGNIZED,
            Self::Step(StepError::ExternalFailure { code, .. }) => {
                u8::try_from(*code).ok().filter(|c| *c != 0).unwrap_or(1)
            }
            Self::Step(StepError::Spawn { .. }) => EXIT_SPAWN,
            Self::Step(StepError::Io { .. }) => 1,
            Self::Step(StepError::ClusterNotReady { .. }) => EXIT_NOT_READY,
            Self::Step(StepError::Interrupted) => EXIT_INTERRUPTED,
        }
    }
}
