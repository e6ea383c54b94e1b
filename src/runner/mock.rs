//! Mock command runner for testing
//!
//! Records every invocation instead of spawning it.
//!
//! # Example
//! ```
//! use kind_bootstrap::runner::mock::MockRunner;
//!
//! let mock = MockRunner::new()
//!     .with_exit_code("kind", 1)
//!     .with_spawn_error("kubectl");
//! assert!(mock.calls().is_empty());
//! ```

use super::{CommandRunner, Invocation};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::time::Instant;

/// One call observed by [`MockRunner`]
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub invocation: Invocation,
    /// When the call happened (follows the paused test clock)
    pub at: Instant,
    /// Contents of the watched file at call time, `None` if unreadable
    pub watched: Option<String>,
}

/// Recording command runner
pub struct MockRunner {
    exit_codes: HashMap<String, i32>,
    spawn_errors: HashSet<String>,
    watch: Option<PathBuf>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockRunner {
    /// Create a runner where every program exits 0
    pub fn new() -> Self {
        Self {
            exit_codes: HashMap::new(),
            spawn_errors: HashSet::new(),
            watch: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make `program` exit with `code`
    pub fn with_exit_code(mut self, program: impl Into<String>, code: i32) -> Self {
        self.exit_codes.insert(program.into(), code);
        self
    }

    /// Make `program` fail to start
    pub fn with_spawn_error(mut self, program: impl Into<String>) -> Self {
        self.spawn_errors.insert(program.into());
        self
    }

    /// Snapshot `path` at every call
    pub fn watching(mut self, path: impl AsRef<Path>) -> Self {
        self.watch = Some(path.as_ref().to_path_buf());
        self
    }

    /// All calls so far, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Rendered command lines of all calls so far
    pub fn command_lines(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| call.invocation.to_string())
            .collect()
    }
}

impl Default for MockRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn run(&self, invocation: &Invocation) -> std::io::Result<i32> {
        let watched = self
            .watch
            .as_ref()
            .and_then(|path| std::fs::read_to_string(path).ok());

        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(RecordedCall {
                invocation: invocation.clone(),
                at: Instant::now(),
                watched,
            });

        if self.spawn_errors.contains(&invocation.program) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: not found", invocation.program),
            ));
        }

        Ok(self
            .exit_codes
            .get(&invocation.program)
            .copied()
            .unwrap_or(0))
    }
}
