//! Drives a long-running video job from submission to a local file.
//!
//! Submitted → Polling right after the submit call returns a handle. Each poll
//! sleeps for the policy interval, then fetches status with a freshly
//! resolved credential. Polls are strictly sequential. Every sleep and
//! backend call races the cancellation token; the attempt cap and deadline
//! bound an otherwise endless loop.

use providers::{GenerativeBackend, MediaOperation, OperationHandle, OperationStatus, VideoRequest};
use shared::credentials::CredentialProvider;
use shared::events::ToolEvent;
use shared::settings::VideoPollSettings;
use shared::tool::MediaHandle;
use shared::{OracleError, Result};
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::media::MediaStore;

const VIDEO_MIME: &str = "video/mp4";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_attempts: Option<u32>,
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        (&VideoPollSettings::default()).into()
    }
}

impl From<&VideoPollSettings> for PollPolicy {
    fn from(settings: &VideoPollSettings) -> Self {
        Self {
            interval: settings.interval(),
            max_attempts: settings.max_attempts,
            deadline: settings.deadline(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Submitted,
    Polling,
    Complete { reference: String },
    Failed { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub handle: OperationHandle,
    pub state: PollState,
    pub status_calls: u32,
}

pub struct OperationPoller<'a> {
    backend: &'a dyn GenerativeBackend,
    credentials: &'a dyn CredentialProvider,
    policy: PollPolicy,
    cancel: CancellationToken,
    progress: Option<(UnboundedSender<ToolEvent>, Uuid)>,
}

impl<'a> OperationPoller<'a> {
    pub fn new(
        backend: &'a dyn GenerativeBackend,
        credentials: &'a dyn CredentialProvider,
        policy: PollPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            credentials,
            policy,
            cancel,
            progress: None,
        }
    }

    /// Emit a progress event per poll iteration
    pub fn with_progress(mut self, sender: UnboundedSender<ToolEvent>, execution_id: Uuid) -> Self {
        self.progress = Some((sender, execution_id));
        self
    }

    async fn guard<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(OracleError::Cancelled),
            result = fut => result,
        }
    }

    /// Like `guard`, but also gives up at `deadline_at`.
    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T>>,
        deadline_at: Option<Instant>,
        attempts: u32,
    ) -> Result<T> {
        let Some(deadline_at) = deadline_at else {
            return self.guard(fut).await;
        };
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(OracleError::Cancelled),
            _ = tokio::time::sleep_until(deadline_at) => {
                warn!(attempts, "poll deadline passed");
                Err(OracleError::TimedOut { attempts })
            }
            result = fut => result,
        }
    }

    fn report_progress(&self, attempt: u32, handle: &OperationHandle) {
        if let Some((sender, execution_id)) = &self.progress {
            let _ = sender.send(ToolEvent::Progress {
                execution_id: *execution_id,
                message: format!("Waiting for video ({})", handle.as_str()),
                attempt: Some(attempt),
            });
        }
    }

    /// Submit the job and poll until the backend reports it done.
    pub async fn run(&self, request: &VideoRequest) -> Result<PollReport> {
        let deadline_at = self.policy.deadline.map(|deadline| Instant::now() + deadline);
        let mut state = PollState::Submitted;

        let credential = self.credentials.credential()?;
        let mut operation: MediaOperation = self
            .bounded(self.backend.submit_video(&credential, request), deadline_at, 0)
            .await?;
        drop(credential);

        debug!(handle = operation.handle.as_str(), ?state, "video job submitted");
        state = PollState::Polling;
        let mut status_calls = 0u32;

        while !operation.is_done() {
            if let Some(max) = self.policy.max_attempts {
                if status_calls >= max {
                    warn!(handle = operation.handle.as_str(), status_calls, "poll attempt cap reached");
                    return Err(OracleError::TimedOut {
                        attempts: status_calls,
                    });
                }
            }

            let interval = self.policy.interval;
            self.bounded(
                async {
                    tokio::time::sleep(interval).await;
                    Ok(())
                },
                deadline_at,
                status_calls,
            )
            .await?;

            let credential = self.credentials.credential()?;
            let handle = operation.handle.clone();
            operation = self
                .bounded(
                    self.backend.operation_status(&credential, &handle),
                    deadline_at,
                    status_calls,
                )
                .await?;
            status_calls += 1;
            debug!(handle = handle.as_str(), attempt = status_calls, ?state, "polled video job");
            self.report_progress(status_calls, &handle);
        }

        state = match (operation.status, operation.result) {
            (OperationStatus::Done, Some(reference)) => PollState::Complete { reference },
            (OperationStatus::Done, None) => PollState::Failed {
                message: "Video generation failed".to_string(),
            },
            (OperationStatus::Failed { message }, _) => PollState::Failed { message },
            (OperationStatus::Pending, _) => PollState::Polling,
        };
        info!(handle = operation.handle.as_str(), status_calls, ?state, "video job finished");

        Ok(PollReport {
            handle: operation.handle,
            state,
            status_calls,
        })
    }

    /// Run the job, download the result and store it locally.
    pub async fn run_to_media(&self, request: &VideoRequest, store: &MediaStore) -> Result<MediaHandle> {
        let report = self.run(request).await?;
        let reference = match report.state {
            PollState::Complete { reference } => reference,
            PollState::Failed { message } => return Err(OracleError::operation(message)),
            PollState::Submitted | PollState::Polling => {
                return Err(OracleError::operation("video job did not finish"))
            }
        };

        let credential = self.credentials.credential()?;
        let bytes = self
            .guard(self.backend.fetch_media(&credential, &reference))
            .await?;
        store.store(&bytes, VIDEO_MIME).await
    }
}
