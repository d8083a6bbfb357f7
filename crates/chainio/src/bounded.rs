//! Deadline wrapper for remote chain calls.
//!
//! Every externally observable operation in the adapter core goes through
//! [`bounded`] or [`bounded_detached`]: the caller-visible wait is capped
//! at the spec's duration no matter how the underlying transport behaves.
//!
//! Timing out does NOT mean the remote effect was aborted. A request that
//! already left the process may still land on the node; callers must treat
//! a [`ClientError::Timeout`] as "outcome unknown", never as "aborted".

use std::{future::Future, time::Duration};

use tracing::warn;

use crate::error::{ClientError, ClientResult};

/// Deadline and diagnostic label for one bounded invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutSpec {
    pub duration: Duration,
    /// Appears verbatim as the timeout error message, e.g.
    /// `ChainType: EOS get_info timeout`.
    pub label: String,
}

impl TimeoutSpec {
    pub fn new(duration: Duration, label: impl Into<String>) -> Self {
        Self {
            duration,
            label: label.into(),
        }
    }
}

/// Runs `work` under the spec's deadline.
///
/// Exactly one of two outcomes occurs: the work's own result (success or
/// failure, surfaced verbatim) if it resolves in time, or
/// [`ClientError::Timeout`] carrying the spec's label at the instant the
/// deadline elapses. On timeout the future is dropped; any remote side
/// effect it already triggered is not rolled back.
pub async fn bounded<T, F>(spec: TimeoutSpec, work: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>>,
{
    match tokio::time::timeout(spec.duration, work).await {
        Ok(result) => result,
        Err(_) => Err(ClientError::Timeout(spec.label)),
    }
}

/// Like [`bounded`], but the work keeps running to completion in the
/// background after a timeout, its eventual result discarded.
///
/// Used for submission paths where dropping the future mid-flight would
/// leave even less certainty about the remote outcome than letting it
/// finish.
pub async fn bounded_detached<T, F>(spec: TimeoutSpec, work: F) -> ClientResult<T>
where
    F: Future<Output = ClientResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(work);

    match tokio::time::timeout(spec.duration, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ClientError::Other(format!(
            "background task failed: {join_err}"
        ))),
        Err(_) => {
            warn!(label = %spec.label, "deadline elapsed; detached work continues, result will be discarded");
            Err(ClientError::Timeout(spec.label))
        }
    }
}
