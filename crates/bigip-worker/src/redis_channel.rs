//! Redis Streams transport for command messages, status replies and
//! notifications.
//!
//! Command entries carry three fields:
//!
//! - `body`: JSON message body
//! - `correlation_id`: echoed on every reply (defaults to the entry id)
//! - `reply_to`: stream for status replies (defaults to the configured one)

use crate::channel::{CommandMessage, MessageChannel, Notification, NotificationSink, StatusUpdate};
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisResult};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Redis Streams channel.
pub struct RedisChannel {
    client: Client,
    conn: Mutex<MultiplexedConnection>,
    config: WorkerConfig,
}

impl RedisChannel {
    /// Connect to Redis and make sure the consumer group exists.
    pub async fn connect(config: WorkerConfig) -> WorkerResult<Self> {
        let client = Client::open(config.redis_url.as_str())?;
        let conn = client.get_multiplexed_async_connection().await?;

        let channel = Self {
            client,
            conn: Mutex::new(conn),
            config,
        };
        channel.ensure_consumer_group().await?;

        Ok(channel)
    }

    fn conn(&self) -> MultiplexedConnection {
        self.conn.lock().clone()
    }

    async fn ensure_consumer_group(&self) -> WorkerResult<()> {
        let stream_key = &self.config.command_stream;

        let result: RedisResult<()> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream_key)
            .arg(&self.config.consumer_group)
            .arg("$")
            .arg("MKSTREAM")
            .query_async(&mut self.conn())
            .await;

        match result {
            Ok(()) => {
                info!(
                    stream = %stream_key,
                    group = %self.config.consumer_group,
                    "Created consumer group"
                );
            }
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!(
                    stream = %stream_key,
                    group = %self.config.consumer_group,
                    "Consumer group already exists"
                );
            }
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}

#[async_trait]
impl MessageChannel for RedisChannel {
    async fn receive(&self) -> WorkerResult<Option<CommandMessage>> {
        // XREADGROUP GROUP g c COUNT 1 BLOCK ms STREAMS key >
        let result: redis::Value = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.config.consumer_name)
            .arg("COUNT")
            .arg(1)
            .arg("BLOCK")
            .arg(self.config.block_timeout_ms)
            .arg("STREAMS")
            .arg(&self.config.command_stream)
            .arg(">")
            .query_async(&mut self.conn())
            .await?;

        parse_xreadgroup_response(result, &self.config.reply_stream)
    }

    async fn ack(&self, delivery_id: &str) -> WorkerResult<()> {
        let stream_key = &self.config.command_stream;

        let acked: i64 = self
            .conn()
            .xack(stream_key, &self.config.consumer_group, &[delivery_id])
            .await?;

        if acked == 1 {
            debug!(delivery_id = %delivery_id, stream = %stream_key, "Acknowledged message");
        } else {
            warn!(
                delivery_id = %delivery_id,
                stream = %stream_key,
                "XACK returned {}, message may not exist",
                acked
            );
        }

        Ok(())
    }

    async fn send_status(
        &self,
        reply_to: &str,
        correlation_id: &str,
        status: &StatusUpdate,
    ) -> WorkerResult<()> {
        let body = serde_json::to_string(status)?;

        let entry_id: String = self
            .conn()
            .xadd(
                reply_to,
                "*",
                &[("correlation_id", correlation_id), ("body", body.as_str())],
            )
            .await?;

        debug!(
            reply_to = %reply_to,
            correlation_id = %correlation_id,
            entry_id = %entry_id,
            body = %body,
            "Sent status reply"
        );
        Ok(())
    }

    async fn recover(&self) -> WorkerResult<()> {
        info!("Reconnecting to Redis...");
        let conn = self.client.get_multiplexed_async_connection().await?;
        *self.conn.lock() = conn;
        self.ensure_consumer_group().await
    }
}

#[async_trait]
impl NotificationSink for RedisChannel {
    async fn notify(&self, notification: &Notification) -> WorkerResult<()> {
        let _: String = self
            .conn()
            .xadd(
                &self.config.notify_stream,
                "*",
                &[
                    ("correlation_id", notification.correlation_id.as_str()),
                    ("title", notification.title.as_str()),
                    ("body", notification.body.as_str()),
                    ("phase", notification.phase.as_str()),
                ],
            )
            .await?;

        debug!(
            correlation_id = %notification.correlation_id,
            phase = notification.phase.as_str(),
            "Sent notification"
        );
        Ok(())
    }
}

/// Parse an XREADGROUP reply into at most one command message.
///
/// Reply shape: `[[stream_key, [[entry_id, [field, value, ...]]]]]`.
pub fn parse_xreadgroup_response(
    value: redis::Value,
    default_reply_to: &str,
) -> WorkerResult<Option<CommandMessage>> {
    let streams = match value {
        redis::Value::Array(streams) => streams,
        redis::Value::Nil => return Ok(None),
        other => {
            return Err(WorkerError::Protocol(format!(
                "Unexpected XREADGROUP response type: {:?}",
                other
            )))
        }
    };

    let Some(stream) = streams.first() else {
        return Ok(None);
    };
    let stream = as_array(stream, "stream entry")?;
    if stream.len() < 2 {
        return Err(WorkerError::Protocol("Stream entry too short".to_string()));
    }

    let entries = as_array(&stream[1], "entries")?;
    let Some(entry) = entries.first() else {
        return Ok(None);
    };
    let entry = as_array(entry, "entry")?;
    if entry.len() < 2 {
        return Err(WorkerError::Protocol("Entry too short".to_string()));
    }

    let delivery_id = as_string(&entry[0]).ok_or_else(|| {
        WorkerError::Protocol(format!("Expected string for entry id, got {:?}", entry[0]))
    })?;

    let mut body = None;
    let mut correlation_id = None;
    let mut reply_to = None;
    for pair in as_array(&entry[1], "fields")?.chunks(2) {
        let [name, value] = pair else { continue };
        match as_string(name).as_deref() {
            Some("body") => body = as_string(value),
            Some("correlation_id") => correlation_id = as_string(value),
            Some("reply_to") => reply_to = as_string(value),
            _ => {}
        }
    }

    // A body that is missing or not JSON still gets a failed reply.
    let body = match body.as_deref().map(serde_json::from_str::<Value>) {
        Some(Ok(body)) => body,
        Some(Err(e)) => {
            warn!(delivery_id = %delivery_id, error = %e, "Entry body is not valid JSON");
            Value::Null
        }
        None => {
            warn!(delivery_id = %delivery_id, "Entry has no body field");
            Value::Null
        }
    };

    Ok(Some(CommandMessage {
        correlation_id: correlation_id.unwrap_or_else(|| delivery_id.clone()),
        reply_to: reply_to.unwrap_or_else(|| default_reply_to.to_string()),
        delivery_id,
        body,
    }))
}

fn as_array<'a>(value: &'a redis::Value, what: &str) -> WorkerResult<&'a Vec<redis::Value>> {
    match value {
        redis::Value::Array(items) => Ok(items),
        _ => Err(WorkerError::Protocol(format!("Expected array for {}", what))),
    }
}

fn as_string(value: &redis::Value) -> Option<String> {
    match value {
        redis::Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        redis::Value::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}
