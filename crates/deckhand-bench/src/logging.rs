use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{Level, info};
use tracing_appender::non_blocking::{self, NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs, SimulationConfig};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

/// Dropping the guard flushes buffered telemetry.
pub struct LoggingGuard {
    _guard: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Where structured telemetry lands for a run: next to the summary table.
pub fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    outputs.summary_dir().join(TELEMETRY_FILE)
}

/// Installs the JSON telemetry subscriber when `logging.enable_structured`
/// is set. `RUST_LOG` takes precedence over `logging.tracing_level`.
pub fn init_logging(
    config: &SimulationConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !config.logging.enable_structured {
        return Ok(None);
    }

    let (writer, guard, telemetry_path) = telemetry_writer(outputs)?;

    let installed = tracing_subscriber::registry()
        .with(env_filter(&config.logging))
        .with(
            fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(writer),
        )
        .try_init()
        .is_ok();

    // Test binaries may install their own subscriber first.
    if installed {
        info!(
            target: "deckhand_bench::run",
            run_id = %config.run_id,
            kind = config.session.kind.as_str(),
            sessions = config.session.count,
            seed = config.session.seed,
            agents = config.agents.len(),
            "telemetry enabled"
        );
    }

    Ok(Some(LoggingGuard {
        _guard: guard,
        telemetry_path,
    }))
}

fn telemetry_writer(outputs: &ResolvedOutputs) -> Result<(NonBlocking, WorkerGuard, PathBuf)> {
    let path = telemetry_path(outputs);
    let dir = outputs.summary_dir();
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    let file = File::create(&path)
        .with_context(|| format!("creating telemetry file at {}", path.display()))?;

    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);
    Ok((writer, guard, path))
}

fn env_filter(logging: &LoggingConfig) -> EnvFilter {
    let level = logging.level().unwrap_or(Level::INFO);
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}
