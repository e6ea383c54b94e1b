//! Settle step - wait for the control plane after cluster creation
//!
//! Either a fixed delay or a TCP readiness probe with exponential backoff.
//! Both are cancelled by the sequencer's interrupt handle.

use crate::error::StepError;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};

/// Fixed delay used when no readiness probe is configured
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(5);

const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Deadline used when `start + timeout` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// How the sequencer waits before touching the running cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlePolicy {
    /// Sleep unconditionally
    Delay(Duration),
    /// Poll a TCP endpoint until it accepts a connection
    Probe(ReadinessProbe),
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self::Delay(DEFAULT_SETTLE_DELAY)
    }
}

impl std::fmt::Display for SettlePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delay(d) => write!(f, "wait {:?}", d),
            Self::Probe(p) => write!(f, "probe {} (timeout {:?})", p.address, p.timeout),
        }
    }
}

/// Bounded readiness check against a `host:port` address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessProbe {
    pub address: String,
    /// Hard deadline for the whole probe
    pub timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ReadinessProbe {
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
        }
    }

    /// Override the retry schedule; `max` is clamped to at least `initial`
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max.max(initial);
        self
    }
}

/// Run the settle policy, returning early with [`StepError::Interrupted`]
/// if `interrupt` is notified
pub async fn settle(policy: &SettlePolicy, interrupt: &Notify) -> Result<(), StepError> {
    tokio::select! {
        result = wait(policy) => result,
        _ = interrupt.notified() => {
            warn!("Settle interrupted");
            Err(StepError::Interrupted)
        }
    }
}

async fn wait(policy: &SettlePolicy) -> Result<(), StepError> {
    match policy {
        SettlePolicy::Delay(delay) => {
            debug!("Sleeping {:?} for the control plane to settle", delay);
            sleep(*delay).await;
            Ok(())
        }
        SettlePolicy::Probe(probe) => wait_ready(probe).await,
    }
}

async fn wait_ready(probe: &ReadinessProbe) -> Result<(), StepError> {
    let start = Instant::now();
    let deadline = start
        .checked_add(probe.timeout)
        .unwrap_or_else(|| start + FAR_FUTURE);
    let mut backoff = probe.initial_backoff;
    let mut attempt: u32 = 0;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(StepError::ClusterNotReady {
                address: probe.address.clone(),
                waited: start.elapsed(),
            });
        }

        attempt += 1;
        match timeout(remaining, TcpStream::connect(&probe.address)).await {
            Ok(Ok(_)) => {
                info!(
                    "{} reachable after {} attempt(s)",
                    probe.address, attempt
                );
                return Ok(());
            }
            Ok(Err(e)) => debug!("Readiness attempt {} failed: {}", attempt, e),
            Err(_) => debug!("Readiness attempt {} timed out", attempt),
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        sleep(backoff.min(remaining)).await;
        backoff = backoff.saturating_mul(2).min(probe.max_backoff);
    }
}
