use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{Level, event};
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Routes JSON events for a tournament run into `telemetry.jsonl`, next to
/// the summary file.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    if logging.decision_details {
        // Read by the bot policies; set before any worker thread exists.
        unsafe {
            std::env::set_var("GOPS_DECISION_DETAILS", "1");
        }
    }

    let telemetry_dir = outputs
        .summary_md
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    fs::create_dir_all(&telemetry_dir).with_context(|| {
        format!(
            "creating telemetry directory at {}",
            telemetry_dir.display()
        )
    })?;

    let telemetry_path = telemetry_dir.join("telemetry.jsonl");
    let file = File::create(&telemetry_path)
        .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

    let (subscriber, guard) = telemetry_subscriber(logging, file);

    // A subscriber may already be installed (tests, embedding callers).
    let _ = tracing::subscriber::set_global_default(subscriber);
    announce_run(run_id, &telemetry_path);

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

fn telemetry_subscriber(
    logging: &LoggingConfig,
    file: File,
) -> (impl tracing::Subscriber + Send + Sync + 'static, WorkerGuard) {
    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();
    (subscriber, guard)
}

/// First telemetry line of a run; ties the file to its run id.
fn announce_run(run_id: &str, telemetry_path: &Path) {
    event!(
        target: "gops_bench::run",
        Level::INFO,
        run_id,
        telemetry = %telemetry_path.display(),
        "run started"
    );
}

/// Human-readable events on stderr for the interactive and extract commands,
/// so stdout stays free for the game table.
pub fn init_console_logging(level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
