mod external;

pub use external::ProcessModel;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use gops_bot::{Difficulty, PolicyError, build_policy};
use gops_core::game::strategy::{Choice, RoundRecord, SelectionStrategy, TurnContext};
use gops_core::game::{Game, GameError, Winner};
use gops_core::model::hand::Hand;
use gops_core::statement::MovePredictor;
use gops_core::trace::extract::trace_file_prefix;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, AnalyticsSummary};
use crate::config::{BenchmarkConfig, ExternalConfig, PlayerConfig, ResolvedOutputs};

/// Plays a batch of independent bot-vs-bot games and persists their traces.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    seats: [SeatBlueprint; 2],
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub rows_written: usize,
    pub ties: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub trace_dir: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub analytics: AnalyticsSummary,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let seats = match config.players.as_slice() {
            [one, two] => [SeatBlueprint::from_config(one)?, SeatBlueprint::from_config(two)?],
            other => return Err(RunnerError::SeatCount { found: other.len() }),
        };
        Ok(Self {
            config,
            outputs,
            seats,
        })
    }

    /// One deterministic seed per game, drawn from the configured base seed.
    pub fn game_seeds(&self) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        (0..self.config.games.count).map(|_| rng.next_u64()).collect()
    }

    /// Execute every game, then write the JSONL rows and the markdown summary.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.results_jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        fs::create_dir_all(&self.outputs.trace_dir)?;

        let seeds = self.game_seeds();
        let outcomes = if self.config.games.parallel {
            match self.config.games.threads {
                Some(threads) => rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|err| RunnerError::ThreadPool(err.to_string()))?
                    .install(|| self.play_parallel(&seeds))?,
                None => self.play_parallel(&seeds)?,
            }
        } else {
            seeds
                .iter()
                .enumerate()
                .map(|(index, &seed)| self.play_game(index, seed))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut writer = BufWriter::new(File::create(&self.outputs.results_jsonl)?);
        let mut analytics = AnalyticsCollector::new(&self.config);
        let mut rows_written = 0usize;
        for outcome in &outcomes {
            analytics.record_game(outcome);
            write_game_row(&mut writer, &self.config, outcome)?;
            rows_written += 1;
        }
        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self.config.logging.enable_structured.then(|| {
            self.outputs
                .summary_md
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("telemetry.jsonl")
        });

        Ok(RunSummary {
            games_played: outcomes.len(),
            rows_written,
            ties: summary.ties,
            jsonl_path: self.outputs.results_jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            trace_dir: self.outputs.trace_dir.clone(),
            telemetry_path,
            analytics: summary,
        })
    }

    fn play_parallel(&self, seeds: &[u64]) -> Result<Vec<GameOutcome>, RunnerError> {
        seeds
            .par_iter()
            .enumerate()
            .map(|(index, &seed)| self.play_game(index, seed))
            .collect()
    }

    /// Plays one full game with fresh policies and writes its trace file.
    pub fn play_game(&self, index: usize, seed: u64) -> Result<GameOutcome, RunnerError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut game = Game::new(&mut rng);
        let mut one = MeteredPolicy::new(self.seats[0].spawn_policy()?);
        let mut two = MeteredPolicy::new(self.seats[1].spawn_policy()?);

        let winner = game
            .run(&mut one, &mut two, &mut rng)
            .map_err(|source| RunnerError::Game { index, source })?;

        let trace_path = self.outputs.trace_dir.join(format!(
            "{}{}_{index:05}.json",
            trace_file_prefix(self.seats[0].difficulty.level(), self.seats[1].difficulty.level()),
            self.config.run_id,
        ));
        fs::write(&trace_path, game.trace().to_file().to_json_pretty()?)?;

        let scores = game.scores();
        let stranded_value = game
            .stranded_prizes()
            .iter()
            .map(|card| u32::from(card.numeric_value()))
            .sum();
        let rounds = game.arena().round();

        if tracing::enabled!(Level::INFO) {
            event!(
                target: "gops_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = index as u64,
                seed,
                winner = winner.code(),
                score_one = scores[0],
                score_two = scores[1],
                rounds,
                stranded_value,
            );
        }

        Ok(GameOutcome {
            index,
            seed,
            winner,
            scores,
            rounds,
            stranded_value,
            bad_selections: [one.bad_selections(), two.bad_selections()],
            decisions: [one.metrics.finalize(), two.metrics.finalize()],
            trace_path,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_row(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    outcome: &GameOutcome,
) -> Result<(), RunnerError> {
    let row = GameLogRow {
        run_id: &config.run_id,
        game_index: outcome.index,
        game_seed: outcome.seed,
        players: [config.players[0].name.as_str(), config.players[1].name.as_str()],
        winner: outcome.winner.code(),
        scores: outcome.scores,
        margin: i64::from(outcome.scores[0]) - i64::from(outcome.scores[1]),
        rounds: outcome.rounds,
        stranded_value: outcome.stranded_value,
        bad_selections: outcome.bad_selections,
        speed_ms_turn: [
            outcome.decisions[0].avg_ms_per_decision,
            outcome.decisions[1].avg_ms_per_decision,
        ],
        trace: outcome.trace_path.display().to_string(),
    };
    serde_json::to_writer(&mut *writer, &row)?;
    writer.write_all(b"\n")?;
    Ok(())
}

#[derive(Serialize)]
struct GameLogRow<'a> {
    run_id: &'a str,
    game_index: usize,
    game_seed: u64,
    players: [&'a str; 2],
    winner: u8,
    scores: [u32; 2],
    margin: i64,
    rounds: u32,
    stranded_value: u32,
    bad_selections: [u32; 2],
    speed_ms_turn: [f64; 2],
    trace: String,
}

/// Result of one finished game.
#[derive(Debug, Clone)]
pub struct GameOutcome {
    pub index: usize,
    pub seed: u64,
    pub winner: Winner,
    pub scores: [u32; 2],
    pub rounds: u32,
    /// Value of tie pots nobody collected.
    pub stranded_value: u32,
    pub bad_selections: [u32; 2],
    pub decisions: [DecisionSummary; 2],
    pub trace_path: PathBuf,
}

struct SeatBlueprint {
    name: String,
    difficulty: Difficulty,
    external: Option<ExternalConfig>,
}

impl SeatBlueprint {
    fn from_config(config: &PlayerConfig) -> Result<Self, RunnerError> {
        let difficulty = config
            .difficulty()
            .ok_or(RunnerError::InvalidDifficulty {
                name: config.name.clone(),
                level: config.difficulty,
            })?;
        Ok(Self {
            name: config.name.clone(),
            difficulty,
            external: config.external.clone(),
        })
    }

    fn spawn_policy(&self) -> Result<Box<dyn SelectionStrategy>, RunnerError> {
        let model = self
            .external
            .as_ref()
            .filter(|_| self.difficulty.needs_model())
            .map(|options| {
                Box::new(ProcessModel::new(self.name.clone(), options.clone()))
                    as Box<dyn MovePredictor>
            });
        Ok(build_policy(self.difficulty, model)?)
    }
}

/// Times every `choose` call of the wrapped policy.
struct MeteredPolicy {
    inner: Box<dyn SelectionStrategy>,
    metrics: DecisionMetrics,
}

impl MeteredPolicy {
    fn new(inner: Box<dyn SelectionStrategy>) -> Self {
        Self {
            inner,
            metrics: DecisionMetrics::default(),
        }
    }
}

impl SelectionStrategy for MeteredPolicy {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice {
        let start = Instant::now();
        let choice = self.inner.choose(hand, ctx, rng);
        self.metrics.record(start.elapsed());
        choice
    }

    fn observe(&mut self, round: &RoundRecord) {
        self.inner.observe(round);
    }

    fn label(&self) -> &'static str {
        self.inner.label()
    }

    fn bad_selections(&self) -> u32 {
        self.inner.bad_selections()
    }
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) {
        self.total += duration;
        self.decisions += 1;
    }

    fn finalize(&self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize output: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Policy(#[from] PolicyError),
    #[error("game {index} failed: {source}")]
    Game {
        index: usize,
        #[source]
        source: GameError,
    },
    #[error("configuration requires exactly 2 players but found {found}")]
    SeatCount { found: usize },
    #[error("player '{name}' has unknown difficulty {level}")]
    InvalidDifficulty { name: String, level: u8 },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),
}
