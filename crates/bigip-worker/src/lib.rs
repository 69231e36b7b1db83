//! BigIP worker: turns queued load balancer commands into device calls.
//!
//! A message names one of three operations and its arguments:
//!
//! ```json
//! {"parameters": {"subcommand": "InRotation", "hosts": ["web1", "web2"]}}
//! ```
//!
//! The worker validates the parameters, translates them into the argument
//! vector of the `bigip` device-control tool (`state -e web1 web2`), runs it,
//! and reports `started` then `completed` or `failed` to the requester.
//!
//! # Core Invariants
//!
//! 1. **Ack-First**: every delivery is acknowledged before it is validated
//! 2. **One In-Flight**: one message is handled to completion before the next
//!    is read
//! 3. **Order-Preserving**: hosts and environments reach the device in the
//!    order they were sent
//! 4. **Always Answered**: every handled message gets `started` and exactly
//!    one of `completed` / `failed`
//!
//! # Architecture
//!
//! ```text
//! Redis Stream -> Worker -> CommandHandler -> validator -> Dispatcher -> bigip
//!      ^                        |
//!      |___ XACK, status, notifications
//! ```

pub mod channel;
pub mod cli_executor;
pub mod command;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod output;
pub mod redis_channel;
pub mod translator;
pub mod validator;
pub mod worker;

#[cfg(test)]
mod tests;

pub use channel::{
    CommandMessage, ErrorReporter, MessageChannel, Notification, NotificationSink, Phase,
    StatusUpdate,
};
pub use cli_executor::CliExecutor;
pub use command::{Operation, ValidatedCommand};
pub use config::WorkerConfig;
pub use device::{DeviceArgs, DeviceCommand, DeviceExecutor, DeviceOutput};
pub use dispatcher::{Dispatcher, ExecutionReport};
pub use error::{ExecutionFault, InvalidCommand, WorkerError, WorkerResult};
pub use handler::{CommandHandler, Outcome};
pub use output::FileOutputReporter;
pub use redis_channel::RedisChannel;
pub use translator::translate;
pub use validator::{extract_parameters, validate, validate_body};
pub use worker::Worker;
