//! Runs a tool end to end.
//!
//! Validation happens before anything is sent. Content requests go straight to
//! the backend; video requests go through the [`OperationPoller`] and land in
//! the [`MediaStore`]. Every outcome ends up in a [`ToolExecution`] record and
//! never touches the chat conversation.

use providers::GenerativeBackend;
use shared::credentials::CredentialProvider;
use shared::events::ToolEvent;
use shared::settings::ModelCatalog;
use shared::tool::{ExecutionStatus, ToolExecution, ToolInput, ToolOutput};
use shared::{OracleError, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::media::MediaStore;
use crate::poller::{OperationPoller, PollPolicy};
use crate::tools::{Tool, ToolRequest, ToolResponse};

/// Everything a run needs from the host
pub struct ToolContext<'a> {
    pub backend: &'a dyn GenerativeBackend,
    pub credentials: &'a dyn CredentialProvider,
    pub models: &'a ModelCatalog,
    pub store: &'a MediaStore,
    pub cancel: CancellationToken,
}

pub struct ToolExecutor {
    poll_policy: PollPolicy,
    event_sender: Option<mpsc::UnboundedSender<ToolEvent>>,
}

impl ToolExecutor {
    pub fn new(poll_policy: PollPolicy) -> Self {
        Self {
            poll_policy,
            event_sender: None,
        }
    }

    pub fn with_events(mut self, event_sender: mpsc::UnboundedSender<ToolEvent>) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Run a tool. Invalid input is returned as an error before any event is
    /// sent; everything after that is folded into the execution record.
    pub async fn execute(
        &self,
        tool: &Arc<dyn Tool>,
        input: ToolInput,
        ctx: ToolContext<'_>,
    ) -> Result<ToolExecution> {
        let (execution, _) = self.run(tool, input, ctx).await?;
        Ok(execution)
    }

    /// Run a tool and return its output, or the failure exactly as raised.
    /// Events and logging are the same as for [`ToolExecutor::execute`].
    pub async fn execute_output(
        &self,
        tool: &Arc<dyn Tool>,
        input: ToolInput,
        ctx: ToolContext<'_>,
    ) -> Result<ToolOutput> {
        let (_, outcome) = self.run(tool, input, ctx).await?;
        outcome
    }

    async fn run(
        &self,
        tool: &Arc<dyn Tool>,
        input: ToolInput,
        ctx: ToolContext<'_>,
    ) -> Result<(ToolExecution, Result<ToolOutput>)> {
        tool.validate_input(&input)?;

        let kind = tool.kind();
        let execution = ToolExecution::new(kind);
        let execution_id = execution.id;
        self.send_event(ToolEvent::Started { execution_id, kind });

        let start = Instant::now();
        let request = tool.build_request(&input, ctx.models);
        let result = match self.dispatch(request, &ctx, execution_id).await {
            Ok(response) => tool.normalize_result(response),
            Err(e) => Err(e),
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                info!(kind = kind.display_name(), duration_ms, "tool finished");
                self.send_event(ToolEvent::Completed {
                    execution_id,
                    duration_ms,
                });
                Ok((execution.complete(output.clone(), duration_ms), Ok(output)))
            }
            Err(e) => {
                warn!(kind = kind.display_name(), duration_ms, error = %e, "tool failed");
                let status = match e {
                    OracleError::Cancelled => ExecutionStatus::Cancelled,
                    OracleError::TimedOut { .. } => ExecutionStatus::Timeout,
                    _ => ExecutionStatus::Failed,
                };
                let message = e.user_message();
                self.send_event(ToolEvent::Failed {
                    execution_id,
                    error: message.clone(),
                    duration_ms,
                });
                Ok((execution.fail(status, message, duration_ms), Err(e)))
            }
        }
    }

    async fn dispatch(
        &self,
        request: ToolRequest,
        ctx: &ToolContext<'_>,
        execution_id: uuid::Uuid,
    ) -> Result<ToolResponse> {
        match request {
            ToolRequest::Content(request) => {
                let credential = ctx.credentials.credential()?;
                tokio::select! {
                    biased;
                    _ = ctx.cancel.cancelled() => Err(OracleError::Cancelled),
                    envelope = ctx.backend.generate_content(&credential, &request) => {
                        envelope.map(ToolResponse::Content)
                    }
                }
            }
            ToolRequest::Video(request) => {
                let mut poller = OperationPoller::new(
                    ctx.backend,
                    ctx.credentials,
                    self.poll_policy.clone(),
                    ctx.cancel.clone(),
                );
                if let Some(sender) = &self.event_sender {
                    poller = poller.with_progress(sender.clone(), execution_id);
                }
                poller
                    .run_to_media(&request, ctx.store)
                    .await
                    .map(ToolResponse::Video)
            }
        }
    }

    fn send_event(&self, event: ToolEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}

impl Default for ToolExecutor {
    fn default() -> Self {
        Self::new(PollPolicy::default())
    }
}
