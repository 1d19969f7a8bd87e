//! Exponential-backoff retry executor for the LLM client.

use std::collections::HashSet;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::LlmError;

/// Outcome of a single attempt made by the function passed to
/// [`execute_with_retry`].
pub enum Attempt<T> {
    /// The call succeeded.
    Success(T),
    /// The call failed with an HTTP status that may be retryable.
    Status { status: u16, error: LlmError },
    /// The call failed below the HTTP layer (no response received); always retryable.
    Transport(LlmError),
}

/// Retry policy for LLM calls.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
    pub retryable_status: HashSet<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
            retryable_status: [408, 429, 500, 502, 503, 504].into_iter().collect(),
        }
    }
}

impl RetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
    }
}

/// Run `fn_` up to `cfg.max_retries + 1` times, retrying on transport errors
/// and on statuses in `cfg.retryable_status`, waiting an exponentially
/// growing delay (capped at `cfg.max_delay`) between attempts. Returns
/// `Cancelled` immediately if `cancel` fires before an attempt or during a
/// backoff wait.
pub async fn execute_with_retry<T, F, Fut>(
    cfg: &RetryConfig,
    cancel: &CancellationToken,
    mut fn_: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Attempt<T>>,
{
    let mut last_status: Option<u16> = None;
    let mut last_error: Option<LlmError> = None;

    for attempt in 0..=cfg.max_retries {
        if cancel.is_cancelled() {
            return Err(LlmError::Cancelled);
        }

        let outcome = fn_().await;
        let retryable = match outcome {
            Attempt::Success(value) => return Ok(value),
            Attempt::Transport(err) => {
                last_status = None;
                last_error = Some(err);
                true
            }
            Attempt::Status { status, error } => {
                last_status = Some(status);
                let retryable = cfg.retryable_status.contains(&status);
                last_error = Some(error);
                if !retryable {
                    return Err(last_error.unwrap());
                }
                true
            }
        };

        if !retryable || attempt == cfg.max_retries {
            break;
        }

        let delay = cfg.delay_for(attempt);
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = cancel.cancelled() => return Err(LlmError::Cancelled),
        }
    }

    let _ = last_error;
    Err(LlmError::RetryExhausted {
        attempts: cfg.max_retries + 1,
        last_status,
    })
}
