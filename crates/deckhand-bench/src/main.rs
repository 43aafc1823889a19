use std::io;
use std::path::PathBuf;

use clap::Parser;

use deckhand_bench::config::{ResolvedOutputs, SimulationConfig};
use deckhand_bench::logging::init_logging;
use deckhand_bench::session::SessionRunner;
use deckhand_core::AppInfo;
use deckhand_core::cards::TextDisplay;

/// Session harness for deckhand processes.
#[derive(Debug, Parser)]
#[command(
    name = "deckhand-bench",
    author,
    version,
    about = "Deterministic draft, sealed, blackjack and opening sessions"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/sessions.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of sessions to play.
    #[arg(long, value_name = "COUNT")]
    sessions: Option<usize>,

    /// Override the RNG seed for session generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Exit after validating the configuration (no session is played).
    #[arg(long)]
    validate_only: bool,

    /// Print every built deck and opening hand to stdout.
    #[arg(long)]
    show_pools: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = SimulationConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(sessions) = cli.sessions {
        config.session.count = sessions;
    }

    if let Some(seed) = cli.seed {
        config.session.seed = Some(seed);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let kind = config.session.kind;
    let sessions = config.session.count;

    println!(
        "{} {} ({}): loaded '{run_id}' with {agent_count} agent{} ({sessions} {} sessions)",
        AppInfo::name(),
        AppInfo::version(),
        AppInfo::codename(),
        if agent_count == 1 { "" } else { "s" },
        kind.as_str()
    );

    let logging_guard = init_logging(&config, &outputs)?;
    let mut runner = SessionRunner::new(config, outputs)?;
    if cli.show_pools {
        runner = runner.with_display(Box::new(TextDisplay::new(io::stdout())));
    }

    if cli.validate_only {
        println!("Validation-only mode: sessions skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} sessions → {} rows at {}",
        summary.sessions_played,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
