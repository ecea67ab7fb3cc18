use std::time::Duration;

use tracing::{debug, info};

use crate::error::{GenerateError, Result};
use crate::generation::{MediaBackend, OperationHandle, OperationStatus};
use crate::orchestrator::CancelToken;

/// Remote video operations typically take minutes; query at a coarse cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// How a completed poll loop ended.
#[derive(Debug, PartialEq, Eq)]
pub enum PollOutcome {
    /// The operation succeeded and its artifact bytes were fetched.
    Completed(Vec<u8>),
    /// The caller's cancel token was observed between poll iterations.
    /// The remote operation is abandoned, not aborted.
    Cancelled,
}

/// Poll a long-running video operation to completion and fetch its artifact.
///
/// The loop sleeps one interval, checks the cancel token, then queries status.
/// There is no self-imposed deadline: the loop runs as long as the remote
/// operation does. A completed-with-error status, a missing result locator
/// and a failed artifact fetch are each fatal for this one operation and are
/// never retried here.
pub async fn poll_to_completion(
    backend: &dyn MediaBackend,
    handle: &OperationHandle,
    interval: Duration,
    cancel: &CancelToken,
) -> Result<PollOutcome> {
    loop {
        tokio::time::sleep(interval).await;

        if cancel.is_cancelled() {
            info!("Abandoning video operation {} after cancel", handle.task_id);
            return Ok(PollOutcome::Cancelled);
        }

        match backend.poll_video(handle).await? {
            OperationStatus::Running => {
                debug!("Video operation {} still running", handle.task_id);
            }
            OperationStatus::Failed { message } => {
                return Err(GenerateError::Generation(message));
            }
            OperationStatus::Succeeded { video_url } => {
                let bytes = backend.fetch_artifact(&video_url).await?;
                return Ok(PollOutcome::Completed(bytes));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::generation::VideoRequest;

    /// Reports Running for `polls_until_done` queries, then the scripted end.
    struct ScriptedOperation {
        polls_until_done: u32,
        fail: bool,
        polls_seen: AtomicU32,
    }

    impl ScriptedOperation {
        fn new(polls_until_done: u32, fail: bool) -> Self {
            Self {
                polls_until_done,
                fail,
                polls_seen: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl MediaBackend for ScriptedOperation {
        async fn generate_image(&self, _prompt: &str) -> Result<Vec<u8>> {
            unreachable!("poller never generates images")
        }

        async fn start_video(&self, _request: &VideoRequest) -> Result<OperationHandle> {
            unreachable!("poller never starts operations")
        }

        async fn poll_video(&self, _handle: &OperationHandle) -> Result<OperationStatus> {
            let seen = self.polls_seen.fetch_add(1, Ordering::SeqCst) + 1;
            if seen <= self.polls_until_done {
                Ok(OperationStatus::Running)
            } else if self.fail {
                Ok(OperationStatus::Failed {
                    message: "model refused the frame".into(),
                })
            } else {
                Ok(OperationStatus::Succeeded {
                    video_url: "https://media.example/clip.mp4".into(),
                })
            }
        }

        async fn fetch_artifact(&self, _url: &str) -> Result<Vec<u8>> {
            Ok(b"mp4".to_vec())
        }
    }

    fn handle() -> OperationHandle {
        OperationHandle {
            task_id: "task-1".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn completes_after_several_running_polls() {
        let backend = ScriptedOperation::new(3, false);
        let outcome = poll_to_completion(
            &backend,
            &handle(),
            Duration::from_secs(10),
            &CancelToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, PollOutcome::Completed(b"mp4".to_vec()));
        assert_eq!(backend.polls_seen.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn completion_with_error_is_a_generation_failure() {
        let backend = ScriptedOperation::new(1, true);
        let err = poll_to_completion(
            &backend,
            &handle(),
            Duration::from_secs(10),
            &CancelToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, GenerateError::Generation(_)));
        assert!(err.to_string().contains("model refused the frame"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_between_polls_abandons_the_operation() {
        let backend = ScriptedOperation::new(u32::MAX, false);
        let cancel = CancelToken::new();
        cancel.cancel();

        let outcome = poll_to_completion(&backend, &handle(), Duration::from_secs(10), &cancel)
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        // Observed before the first query went out.
        assert_eq!(backend.polls_seen.load(Ordering::SeqCst), 0);
    }
}
