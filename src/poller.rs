//! Status polling for asynchronous generation tasks.
//!
//! The poller is a small state machine. Each attempt issues exactly one
//! status query; the first fires immediately and every later one waits a
//! fixed interval first. Queries never overlap.

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::BananaError;
use crate::normalizer::{check_code, TaskHandle};
use crate::ports::{GenerationProvider, Sleeper};

const DEFAULT_FAIL_REASON: &str = "the provider did not give a reason";

/// Polling cadence and ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay before every attempt except the first.
    pub interval: Duration,
    /// Maximum number of status queries.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self { interval: Duration::from_secs(2), max_attempts: 60 }
    }
}

/// Lifecycle of a generation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Waiting for a worker (status 0).
    Queued,
    /// Being generated (status 1).
    Running,
    /// Finished with this image URL (status 2).
    Succeeded(String),
    /// The provider gave up, with a reason (status 3).
    Failed(String),
    /// The attempt ceiling was reached without a terminal status.
    TimedOut,
}

impl TaskState {
    /// Whether no further transitions can happen.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded(_) | Self::Failed(_) | Self::TimedOut)
    }

    /// Apply one status report.
    ///
    /// Unknown status codes leave the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BananaError::MissingImageData`] for a success status that
    /// carries no image URL.
    pub fn advance(self, report: StatusReport) -> Result<Self, BananaError> {
        if self.is_terminal() {
            return Ok(self);
        }
        Ok(match report.status {
            0 => Self::Queued,
            1 => Self::Running,
            2 => Self::Succeeded(report.image_url.ok_or(BananaError::MissingImageData)?),
            3 => Self::Failed(report.fail_reason.unwrap_or_else(|| DEFAULT_FAIL_REASON.into())),
            other => {
                debug!(status = other, "ignoring unknown task status");
                self
            }
        })
    }
}

/// Fields of interest from one status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// 0 queued, 1 running, 2 succeeded, 3 failed.
    pub status: i64,
    /// Image URL, present on success.
    pub image_url: Option<String>,
    /// Human-readable failure reason, present on failure.
    pub fail_reason: Option<String>,
}

impl StatusReport {
    /// Read a status response.
    ///
    /// Returns `Ok(None)` when the body has no usable status.
    ///
    /// # Errors
    ///
    /// A non-200 `code` is authoritative and returns [`BananaError::Provider`].
    pub fn from_response(raw: &Value) -> Result<Option<Self>, BananaError> {
        check_code(raw)?;
        let Some(data) = raw.get("data") else {
            return Ok(None);
        };
        let status = match data.get("status") {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        Ok(status.map(|status| Self {
            status,
            image_url: non_empty(data.get("image_url")),
            fail_reason: non_empty(data.get("fail_reason")),
        }))
    }
}

fn non_empty(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Drives a [`TaskHandle`] to a terminal state.
pub struct TaskPoller<'a> {
    provider: &'a dyn GenerationProvider,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
}

impl<'a> TaskPoller<'a> {
    /// Create a poller over the given provider and timer.
    #[must_use]
    pub fn new(
        provider: &'a dyn GenerationProvider,
        sleeper: &'a dyn Sleeper,
        policy: PollPolicy,
    ) -> Self {
        Self { provider, sleeper, policy }
    }

    /// Poll until the task succeeds, fails, times out or is cancelled.
    ///
    /// Transport errors, non-2xx responses and unparsable bodies carry no
    /// new information and only use up an attempt.
    ///
    /// # Errors
    ///
    /// - [`BananaError::PollFailure`] when the provider reports failure.
    /// - [`BananaError::PollTimeout`] after `max_attempts` queries.
    /// - [`BananaError::Provider`] for a non-200 `code`.
    /// - [`BananaError::MissingImageData`] for success without a URL.
    /// - [`BananaError::Cancelled`] when `cancel` fires; no query is issued
    ///   after that.
    pub async fn poll(
        &self,
        handle: &TaskHandle,
        cancel: &CancelToken,
    ) -> Result<String, BananaError> {
        let mut state = TaskState::Queued;

        for attempt in 1..=self.policy.max_attempts {
            if attempt > 1 {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(BananaError::Cancelled),
                    () = self.sleeper.sleep(self.policy.interval) => {}
                }
            }

            // Calling the port starts the request, so check before building it.
            if cancel.is_cancelled() {
                return Err(BananaError::Cancelled);
            }
            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(BananaError::Cancelled),
                response = self.provider.query_task(&handle.id) => response,
            };

            let report = match response {
                Ok(raw) => StatusReport::from_response(&raw)?,
                Err(e) if e.is_transient() => {
                    warn!(task = %handle.id, attempt, error = %e, "status query failed, will retry");
                    None
                }
                Err(e) => return Err(e),
            };

            if let Some(report) = report {
                state = state.advance(report)?;
            }
            debug!(task = %handle.id, attempt, ?state, "task status");

            match &state {
                TaskState::Succeeded(url) => {
                    let elapsed = chrono::Utc::now() - handle.created_at;
                    info!(task = %handle.id, attempt, secs = elapsed.num_seconds(), "task succeeded");
                    return Ok(url.clone());
                }
                TaskState::Failed(reason) => return Err(BananaError::PollFailure(reason.clone())),
                TaskState::Queued | TaskState::Running | TaskState::TimedOut => {}
            }
        }

        debug!(task = %handle.id, state = ?TaskState::TimedOut, "attempt ceiling reached");
        Err(BananaError::PollTimeout { attempts: self.policy.max_attempts })
    }
}
