//! Worker tests against mocked collaborators.
//!
//! - `lifecycle`: ack, status, notification and report sequences per message
//! - `dispatch`: command routing onto device entry points
//! - `worker_loop`: sequential processing and transport recovery


mod lifecycle;
