//! Collaborators the command handler talks to, and the messages it
//! exchanges with them.

use crate::error::WorkerResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A command message delivered by the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandMessage {
    /// Channel-specific token used to acknowledge this delivery.
    pub delivery_id: String,
    /// Pairs the request with its status replies.
    pub correlation_id: String,
    /// Where status replies go.
    pub reply_to: String,
    /// Untyped message body.
    pub body: Value,
}

/// Status reply sent to the requester.
///
/// Serializes as `{"status": "started"}` etc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusUpdate {
    Started,
    Completed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    Failed,
}

/// Terminal phase carried by human-facing notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Completed,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        }
    }
}

/// Human-facing notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub phase: Phase,
    pub correlation_id: String,
}

/// Source of command messages and destination of status replies.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Wait for the next message. `None` means nothing arrived in time.
    async fn receive(&self) -> WorkerResult<Option<CommandMessage>>;

    /// Acknowledge a delivery so it is not redelivered.
    async fn ack(&self, delivery_id: &str) -> WorkerResult<()>;

    /// Send a status reply.
    async fn send_status(
        &self,
        reply_to: &str,
        correlation_id: &str,
        status: &StatusUpdate,
    ) -> WorkerResult<()>;

    /// Re-establish the underlying connection after a transport error.
    async fn recover(&self) -> WorkerResult<()> {
        Ok(())
    }
}

/// Receives human-facing notifications.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: &Notification) -> WorkerResult<()>;
}

/// Receives the error text of failed commands.
#[async_trait]
pub trait ErrorReporter: Send + Sync {
    async fn report_error(&self, correlation_id: &str, message: &str) -> WorkerResult<()>;
}
