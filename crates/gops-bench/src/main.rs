use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::Level;

use gops_bench::config::{BenchmarkConfig, ExternalConfig, ResolvedOutputs};
use gops_bench::console::{StdinPrompt, run_console_game};
use gops_bench::extract::{ExtractRequest, default_output, export_samples};
use gops_bench::logging::{init_console_logging, init_logging};
use gops_bench::tournament::{ProcessModel, TournamentRunner};
use gops_bot::Difficulty;
use gops_core::statement::MovePredictor;

/// Bulk game generation, trace mining and console play for GOPS bots.
#[derive(Debug, Parser)]
#[command(
    name = "gops-bench",
    author,
    version,
    about = "Deterministic GOPS game generator and harness"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Play a configured batch of bot-vs-bot games and write their traces.
    Run(RunArgs),
    /// Turn winning moves from saved traces into training samples.
    Extract(ExtractArgs),
    /// Play one game against a bot in the terminal.
    Play(PlayArgs),
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the base RNG seed.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Play games one after another instead of on the worker pool.
    #[arg(long)]
    sequential: bool,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,

    /// Log hand size and state statement with every decision (forces GOPS_DECISION_DETAILS=1).
    #[arg(long)]
    log_decision_details: bool,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Directory holding the trace files.
    #[arg(long, value_name = "DIR")]
    traces: PathBuf,

    /// Difficulty level of player one in the traces to read.
    #[arg(long, value_name = "LEVEL")]
    p1: u8,

    /// Difficulty level of player two in the traces to read.
    #[arg(long, value_name = "LEVEL")]
    p2: u8,

    /// Output JSONL file; defaults to a samples file inside the trace directory.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Keep only the most frequent winning move for each state.
    #[arg(long)]
    most_frequent: bool,
}

#[derive(Debug, Args)]
struct PlayArgs {
    /// Bot level (1-5 or a label); falls back to GOPS_BOT_DIFFICULTY.
    #[arg(short, long, value_name = "LEVEL")]
    difficulty: Option<String>,

    /// Seed for the prize deck and the bot.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Move model command for the external-model level.
    #[arg(long, value_name = "CMD")]
    model_command: Option<String>,

    /// Extra argument passed to the model command (repeatable).
    #[arg(long = "model-arg", value_name = "ARG")]
    model_args: Vec<String>,

    /// Kill the model process when it has not answered after this long.
    #[arg(long, value_name = "MS", default_value_t = 2_000)]
    model_timeout_ms: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run(args) => run(args),
        Command::Extract(args) => extract(args),
        Command::Play(args) => play(args),
    }
}

fn run(args: RunArgs) -> anyhow::Result<()> {
    let mut config = BenchmarkConfig::from_path(&args.config)?;

    if let Some(run_id) = args.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = args.games {
        config.games.count = games;
    }

    if let Some(seed) = args.seed {
        config.games.seed = Some(seed);
    }

    if args.sequential {
        config.games.parallel = false;
    }

    if args.log_decision_details {
        config.logging.decision_details = true;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let pairing = config
        .players
        .iter()
        .map(|player| format!("{} (d{})", player.name, player.difficulty))
        .collect::<Vec<_>>()
        .join(" vs ");

    println!("Loaded configuration '{run_id}': {pairing}, {games} games");

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if args.validate_only {
        println!("Validation-only mode: no games played.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} games ({} ties) -> {} rows at {}",
        summary.games_played,
        summary.ties,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Traces: {}", summary.trace_dir.display());
    println!("Summary table: {}", summary.summary_path.display());
    println!(
        "Sign test p-value: {:.4} over {} decided games",
        summary.analytics.sign_test.p_value, summary.analytics.sign_test.sample_size
    );
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}

fn extract(args: ExtractArgs) -> anyhow::Result<()> {
    init_console_logging(Level::INFO);
    let output = args
        .output
        .unwrap_or_else(|| default_output(&args.traces, args.p1, args.p2));
    let summary = export_samples(&ExtractRequest {
        trace_dir: args.traces,
        player_one: args.p1,
        player_two: args.p2,
        most_frequent: args.most_frequent,
        output,
    })?;
    println!(
        "Read {} traces: {} winning moves, {} written to {}",
        summary.traces_read,
        summary.samples_found,
        summary.samples_written,
        summary.output.display()
    );
    Ok(())
}

fn play(args: PlayArgs) -> anyhow::Result<()> {
    init_console_logging(Level::WARN);
    let difficulty = match args.difficulty.as_deref() {
        Some(raw) => Difficulty::parse(raw)
            .with_context(|| format!("unknown difficulty '{raw}'; expected 1-5 or a label"))?,
        None => Difficulty::from_env(),
    };

    let model = args.model_command.map(|command| {
        Box::new(ProcessModel::new(
            "console-model",
            ExternalConfig {
                command,
                args: args.model_args,
                working_dir: None,
                timeout_ms: args.model_timeout_ms,
            },
        )) as Box<dyn MovePredictor>
    });

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut stdout = std::io::stdout();
    let outcome = run_console_game(
        difficulty,
        model,
        StdinPrompt::stdio(),
        &mut stdout,
        &mut rng,
    )?;
    if outcome.quit {
        println!("Game abandoned after {} rounds.", outcome.rounds);
    }
    Ok(())
}
