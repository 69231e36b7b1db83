//! Per-request output logs.
//!
//! Each correlation id gets its own JSONL file under the output directory,
//! so whoever runs the workflow can read what went wrong for their request.

use crate::channel::ErrorReporter;
use crate::error::WorkerResult;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// One line of an output log.
#[derive(Debug, Clone, Serialize)]
struct OutputRecord<'a> {
    timestamp: String,
    correlation_id: &'a str,
    level: &'static str,
    message: &'a str,
}

/// Appends error reports to `<dir>/<correlation_id>-<digest>.log`.
pub struct FileOutputReporter {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileOutputReporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the output log for a correlation id.
    pub fn log_path(&self, correlation_id: &str) -> PathBuf {
        self.dir.join(format!("{}.log", file_stem(correlation_id)))
    }

    async fn append(&self, path: &Path, line: &str) -> std::io::Result<()> {
        let _guard = self.write_lock.lock().await;
        fs::create_dir_all(&self.dir).await?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        file.write_all(format!("{}\n", line).as_bytes()).await?;
        file.flush().await
    }
}

#[async_trait]
impl ErrorReporter for FileOutputReporter {
    async fn report_error(&self, correlation_id: &str, message: &str) -> WorkerResult<()> {
        let record = OutputRecord {
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            correlation_id,
            level: "ERROR",
            message,
        };
        let line = serde_json::to_string(&record)?;

        let path = self.log_path(correlation_id);
        self.append(&path, &line).await?;

        debug!(path = %path.display(), "Wrote output log record");
        Ok(())
    }
}

/// Readable, path-safe file stem for a correlation id.
///
/// Unsafe characters become `_`; a short digest of the raw id keeps ids
/// that sanitize the same (`a/b`, `a_b`) in separate files.
fn file_stem(correlation_id: &str) -> String {
    let readable: String = correlation_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let readable = if readable.is_empty() || readable.chars().all(|c| c == '.') {
        "unknown".to_string()
    } else {
        readable
    };

    let digest = Sha256::digest(correlation_id.as_bytes());
    let short: String = digest[..6].iter().map(|b| format!("{:02x}", b)).collect();

    format!("{}-{}", readable, short)
}
