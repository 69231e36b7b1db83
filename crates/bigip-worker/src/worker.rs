//! Main worker loop.

use crate::channel::MessageChannel;
use crate::error::{WorkerError, WorkerResult};
use crate::handler::{CommandHandler, Outcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Reads messages one at a time and hands each to the [`CommandHandler`].
pub struct Worker {
    channel: Arc<dyn MessageChannel>,
    handler: CommandHandler,
}

impl Worker {
    pub fn new(channel: Arc<dyn MessageChannel>, handler: CommandHandler) -> Self {
        Self { channel, handler }
    }

    /// Run until `shutdown` turns true.
    ///
    /// Each iteration:
    /// 1. Checks for shutdown; a message already read always finishes first
    /// 2. Reads at most one message
    /// 3. Handles it to completion (ack, statuses, notifications)
    /// 4. On transport errors, pauses and reconnects before reading again
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> WorkerResult<()> {
        info!("Starting BigIP worker loop");

        while !*shutdown.borrow() {
            if let Err(e) = self.process_one().await {
                error!(error = %e, "Error processing message");

                match &e {
                    WorkerError::Redis(_) => {
                        warn!("Redis error, attempting to reconnect...");
                        if pause(&mut shutdown, Duration::from_secs(1)).await {
                            break;
                        }
                        if let Err(reconnect_err) = self.channel.recover().await {
                            error!(error = %reconnect_err, "Failed to reconnect to Redis");
                            pause(&mut shutdown, Duration::from_secs(5)).await;
                        }
                    }
                    _ => {
                        pause(&mut shutdown, Duration::from_millis(100)).await;
                    }
                }
            }
        }

        info!("Worker loop stopped");
        Ok(())
    }

    /// Read and handle one message. `None` when nothing arrived.
    pub async fn process_one(&self) -> WorkerResult<Option<Outcome>> {
        let message = match self.channel.receive().await? {
            Some(message) => message,
            None => {
                debug!("No messages available, continuing to poll...");
                return Ok(None);
            }
        };

        info!(
            delivery_id = %message.delivery_id,
            correlation_id = %message.correlation_id,
            reply_to = %message.reply_to,
            "Processing message"
        );

        let outcome = self.handler.handle(&message).await?;

        info!(
            delivery_id = %message.delivery_id,
            correlation_id = %message.correlation_id,
            outcome = ?outcome,
            "Message handled"
        );

        Ok(Some(outcome))
    }
}

/// Sleep for `duration` unless shutdown comes first. True if shutting down.
async fn pause(shutdown: &mut watch::Receiver<bool>, duration: Duration) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => {}
        Ok(()) = shutdown.changed() => {}
    }
    *shutdown.borrow()
}
