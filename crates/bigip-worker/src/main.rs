//! BigIP worker binary entry point.
//!
//! Usage: bigip-worker [--redis-url <url>] [--bigip-path <path>] ...
//!
//! Every flag falls back to its environment variable, then to the built-in
//! default.

use bigip_worker::{
    CliExecutor, CommandHandler, Dispatcher, FileOutputReporter, RedisChannel, Worker,
    WorkerConfig, WorkerError, WorkerResult,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// BigIP worker: applies queued rotation and config-sync commands.
#[derive(Parser, Debug)]
#[command(name = "bigip-worker")]
#[command(about = "Message-queue worker for BigIP rotation and config sync")]
struct Args {
    /// Redis connection URL.
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Stream to consume command messages from.
    #[arg(long, env = "BIGIP_COMMAND_STREAM")]
    command_stream: Option<String>,

    /// Stream for status replies when a message names none.
    #[arg(long, env = "BIGIP_REPLY_STREAM")]
    reply_stream: Option<String>,

    /// Stream for human-facing notifications.
    #[arg(long, env = "BIGIP_NOTIFY_STREAM")]
    notify_stream: Option<String>,

    /// Path to the bigip device-control program.
    #[arg(long, env = "BIGIP_PATH")]
    bigip_path: Option<String>,

    /// XREADGROUP block timeout in milliseconds.
    #[arg(long, env = "BIGIP_BLOCK_MS")]
    block_ms: Option<u64>,

    /// Device command timeout in seconds.
    #[arg(long, env = "BIGIP_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Directory for per-request output logs.
    #[arg(long, env = "BIGIP_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log format (compact, json)
    #[arg(long, default_value = "compact")]
    log_format: String,
}

/// Built-in defaults, then flags (clap reads each flag's environment
/// variable itself), validated once at the end.
fn build_config(args: Args) -> WorkerResult<WorkerConfig> {
    let mut config = WorkerConfig::default();

    if let Some(redis_url) = args.redis_url {
        config.redis_url = redis_url;
    }
    if let Some(command_stream) = args.command_stream {
        config.set_command_stream(command_stream);
    }
    if let Some(reply_stream) = args.reply_stream {
        config.reply_stream = reply_stream;
    }
    if let Some(notify_stream) = args.notify_stream {
        config.notify_stream = notify_stream;
    }
    if let Some(ms) = args.block_ms {
        config.block_timeout_ms = ms;
    }
    if let Some(bigip_path) = args.bigip_path {
        config.bigip_path = bigip_path;
    }
    if let Some(secs) = args.timeout_secs {
        config.executor_timeout = Duration::from_secs(secs);
    }
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> WorkerResult<()> {
    let args = Args::parse();

    let format = observability::LogFormat::from_name(&args.log_format).ok_or_else(|| {
        WorkerError::Config(format!("unknown log format: {}", args.log_format))
    })?;
    observability::init_with_config(observability::LogConfig {
        service_name: "bigip-worker".into(),
        default_level: args.log_level.clone(),
        format,
    });

    info!("BigIP worker starting...");

    let config = build_config(args)?;

    info!(
        redis_url = %config.redis_url,
        stream = %config.command_stream,
        notify_stream = %config.notify_stream,
        consumer = %config.consumer_name,
        bigip_path = %config.bigip_path,
        timeout_secs = config.executor_timeout.as_secs(),
        output_dir = %config.output_dir.display(),
        "Configuration loaded"
    );

    let channel = Arc::new(RedisChannel::connect(config.clone()).await?);
    let executor = Arc::new(CliExecutor::new(
        config.bigip_path.clone(),
        config.executor_timeout,
    ));
    let reporter = Arc::new(FileOutputReporter::new(config.output_dir.clone()));

    let handler = CommandHandler::new(
        channel.clone(),
        channel.clone(),
        reporter,
        Dispatcher::new(executor),
    );
    let worker = Worker::new(channel, handler);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, finishing current message...");
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(e) = worker.run(shutdown_rx).await {
        error!(error = %e, "Worker exited with error");
        return Err(e);
    }

    info!("BigIP worker stopped");
    Ok(())
}
