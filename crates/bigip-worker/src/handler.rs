//! Per-message lifecycle: acknowledge, report progress, validate, dispatch,
//! report the outcome.
//!
//! ```text
//! Received -> (ack) -> Started -> Completed | Failed
//! ```
//!
//! The delivery is acknowledged before anything else, so a message is never
//! redelivered even when its command fails. Command failures (validation
//! or executor) become a `failed` status plus notifications. Collaborator
//! failures are returned to the caller.

use crate::channel::{
    CommandMessage, ErrorReporter, MessageChannel, Notification, NotificationSink, Phase,
    StatusUpdate,
};
use crate::command::ValidatedCommand;
use crate::dispatcher::{Dispatcher, ExecutionReport};
use crate::error::{WorkerError, WorkerResult};
use crate::validator;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

const SUCCESS_TITLE: &str = "BigipWorker Executed Successfully";
const FAILURE_TITLE: &str = "BigipWorker Failed";

/// How a message ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

/// Drives one command message from receipt to its final status.
pub struct CommandHandler {
    channel: Arc<dyn MessageChannel>,
    notifier: Arc<dyn NotificationSink>,
    reporter: Arc<dyn ErrorReporter>,
    dispatcher: Dispatcher,
}

impl CommandHandler {
    pub fn new(
        channel: Arc<dyn MessageChannel>,
        notifier: Arc<dyn NotificationSink>,
        reporter: Arc<dyn ErrorReporter>,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            channel,
            notifier,
            reporter,
            dispatcher,
        }
    }

    /// Handle one message to completion.
    pub async fn handle(&self, message: &CommandMessage) -> WorkerResult<Outcome> {
        let correlation_id = message.correlation_id.as_str();

        self.channel.ack(&message.delivery_id).await?;
        self.channel
            .send_status(&message.reply_to, correlation_id, &StatusUpdate::Started)
            .await?;

        match self.execute(message).await {
            Ok((command, report)) => {
                self.complete(message, &command, report).await?;
                Ok(Outcome::Completed)
            }
            Err(err @ (WorkerError::InvalidCommand(_) | WorkerError::Execution(_))) => {
                self.fail(message, &err.to_string()).await?;
                Ok(Outcome::Failed)
            }
            Err(other) => Err(other),
        }
    }

    async fn execute(
        &self,
        message: &CommandMessage,
    ) -> WorkerResult<(ValidatedCommand, ExecutionReport)> {
        let command = validator::validate_body(&message.body)?;
        info!(
            correlation_id = %message.correlation_id,
            command = %command,
            "Executing command"
        );
        let report = self.dispatcher.dispatch(&command).await?;
        Ok((command, report))
    }

    async fn complete(
        &self,
        message: &CommandMessage,
        command: &ValidatedCommand,
        report: ExecutionReport,
    ) -> WorkerResult<()> {
        let correlation_id = message.correlation_id.as_str();
        info!(correlation_id = %correlation_id, "Success for {}", command);

        let data = json!({
            "command": command.to_string(),
            "argv": report.argv,
            "output": report.output.stdout,
        });
        self.channel
            .send_status(
                &message.reply_to,
                correlation_id,
                &StatusUpdate::Completed { data: Some(data) },
            )
            .await?;

        self.notifier
            .notify(&Notification {
                title: SUCCESS_TITLE.to_string(),
                body: format!("BigipWorker successfully executed {}. See logs.", command),
                phase: Phase::Completed,
                correlation_id: correlation_id.to_string(),
            })
            .await
    }

    async fn fail(&self, message: &CommandMessage, reason: &str) -> WorkerResult<()> {
        let correlation_id = message.correlation_id.as_str();
        error!(correlation_id = %correlation_id, "Failure: {}", reason);

        self.channel
            .send_status(&message.reply_to, correlation_id, &StatusUpdate::Failed)
            .await?;

        self.notifier
            .notify(&Notification {
                title: FAILURE_TITLE.to_string(),
                body: reason.to_string(),
                phase: Phase::Failed,
                correlation_id: correlation_id.to_string(),
            })
            .await?;

        self.reporter.report_error(correlation_id, reason).await
    }
}
