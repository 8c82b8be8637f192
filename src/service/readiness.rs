use crate::error::GateError;
use backon::{ConstantBuilder, Retryable};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Waiting,
    /// Terminal.
    Ready,
}

/// Polls for a readiness signal file at a fixed interval.
#[derive(Debug, Clone)]
pub struct ReadinessGate {
    signal: PathBuf,
    poll_interval: Duration,
    deadline: Option<Duration>,
    state: GateState,
}

impl ReadinessGate {
    /// `deadline = None` polls forever.
    pub fn new(
        signal: impl Into<PathBuf>,
        poll_interval: Duration,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            signal: signal.into(),
            poll_interval,
            deadline,
            state: GateState::Waiting,
        }
    }

    pub fn signal(&self) -> &Path {
        &self.signal
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// One existence check. A missing file means `Waiting`, not an error.
    pub async fn check(&mut self) -> Result<GateState, GateError> {
        if self.state == GateState::Ready {
            return Ok(GateState::Ready);
        }
        match signal_exists(&self.signal).await {
            Ok(()) => self.state = GateState::Ready,
            Err(GateError::NotReady) => {}
            Err(e) => return Err(e),
        }
        Ok(self.state)
    }

    /// Block until the signal exists. Returns how long the wait took.
    pub async fn wait(&mut self) -> Result<Duration, GateError> {
        let started = Instant::now();
        if self.state == GateState::Ready {
            return Ok(started.elapsed());
        }

        let interval = self.poll_interval.max(Duration::from_millis(1));
        let policy = ConstantBuilder::default()
            .with_delay(interval)
            .with_max_times(usize::MAX);

        info!(
            path = %self.signal.display(),
            interval_ms = interval.as_millis() as u64,
            deadline_ms = self.deadline.map(|d| d.as_millis() as u64),
            "Waiting for readiness signal"
        );

        let signal = self.signal.as_path();
        let polling = (|| signal_exists(signal))
            .retry(policy)
            .when(|e: &GateError| e.is_retryable())
            .notify(|_err, dur: Duration| {
                info!(
                    "Readiness signal {} not found, retrying in {:?}...",
                    signal.display(),
                    dur
                );
            });

        // the deadline is a wall-clock budget, not a retry count
        let outcome = match self.deadline {
            Some(deadline) => match tokio::time::timeout(deadline, polling).await {
                Ok(res) => res,
                Err(_elapsed) => Err(GateError::NotReady),
            },
            None => polling.await,
        };

        let waited = started.elapsed();
        match outcome {
            Ok(()) => {
                self.state = GateState::Ready;
                info!(
                    path = %self.signal.display(),
                    waited_ms = waited.as_millis() as u64,
                    "Readiness signal found"
                );
                Ok(waited)
            }
            Err(GateError::NotReady) => Err(GateError::ReadinessTimeout {
                path: self.signal.clone(),
                waited,
            }),
            Err(e) => Err(e),
        }
    }
}

async fn signal_exists(signal: &Path) -> Result<(), GateError> {
    if tokio::fs::try_exists(signal).await? {
        Ok(())
    } else {
        debug!(path = %signal.display(), "readiness signal absent");
        Err(GateError::NotReady)
    }
}
