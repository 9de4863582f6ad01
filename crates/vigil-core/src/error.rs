//! Poll error types.

use thiserror::Error;

/// Errors a metric poller can surface from a single poll.
///
/// The scheduler never matches on these — it logs them and moves on; the
/// poller records the outcome in its own success flag.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("probe failed: {0}")]
    Probe(String),

    #[error("poll source unreachable: {0}")]
    Unreachable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type PollResult<T> = Result<T, PollError>;
