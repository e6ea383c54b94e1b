//! External command execution
//!
//! The sequencer never spawns processes directly; it goes through a
//! [`CommandRunner`] so plans can be exercised against [`mock::MockRunner`].

pub mod mock;
pub mod process;

use async_trait::async_trait;

pub use process::ProcessRunner;

/// A program and its argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl std::fmt::Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Runs an external program to completion and reports its exit code
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Name of this runner, for logging
    fn name(&self) -> &'static str;

    /// Run `invocation` and wait for it to exit
    ///
    /// Returns the exit code; an `Err` means the program could not be started.
    async fn run(&self, invocation: &Invocation) -> std::io::Result<i32>;
}
