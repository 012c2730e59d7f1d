//! Mines persisted traces for training pairs.
//!
//! Trace files are named `p1_d<a>_p2_d<b>_trace_<suffix>.json`, where `a` and
//! `b` are the difficulty levels of the two seats.

use crate::game::Winner;
use crate::statement::{self, StatementError, TrainingSample};
use crate::trace::record::{MoveRecord, TraceFile};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse trace {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Statement(#[from] StatementError),
}

pub fn trace_file_prefix(player_one: u8, player_two: u8) -> String {
    format!("p1_d{player_one}_p2_d{player_two}_trace_")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinningSamples {
    pub traces_read: usize,
    pub samples: Vec<TrainingSample>,
}

#[derive(Debug, Clone)]
pub struct TraceExtractor {
    dir: PathBuf,
}

impl TraceExtractor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Trace files for the given difficulty pairing, sorted by path.
    pub fn trace_files(
        &self,
        player_one: u8,
        player_two: u8,
    ) -> Result<Vec<PathBuf>, ExtractError> {
        let prefix = trace_file_prefix(player_one, player_two);
        let entries = fs::read_dir(&self.dir).map_err(|source| ExtractError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ExtractError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".json"));
            if matches && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    pub fn load(&self, path: &Path) -> Result<TraceFile, ExtractError> {
        let json = fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        TraceFile::from_json(&json).map_err(|source| ExtractError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Winning-side samples from every matching trace, file by file.
    pub fn collect_winning(
        &self,
        player_one: u8,
        player_two: u8,
    ) -> Result<WinningSamples, ExtractError> {
        let files = self.trace_files(player_one, player_two)?;
        let mut samples = Vec::new();
        for path in &files {
            let trace = self.load(path)?;
            samples.extend(winning_samples(&trace)?);
        }
        Ok(WinningSamples {
            traces_read: files.len(),
            samples,
        })
    }
}

/// The game winner's move statements in turn order. Ties and undecided games
/// contribute nothing.
pub fn winning_samples(trace: &TraceFile) -> Result<Vec<TrainingSample>, StatementError> {
    let Some(winner) = trace.winner.and_then(Winner::from_code) else {
        return Ok(Vec::new());
    };
    let Some(seat) = winner.seat() else {
        return Ok(Vec::new());
    };
    trace
        .ordered_turns()
        .into_iter()
        .map(|(_, moves)| {
            let record = match seat.id() {
                1 => &moves.player_1_move,
                _ => &moves.player_2_move,
            };
            statement::move_statement(record)
        })
        .collect()
}

/// Both seats' move records for every turn, player one first.
pub fn all_moves(trace: &TraceFile) -> Vec<(u32, &MoveRecord, &MoveRecord)> {
    trace
        .ordered_turns()
        .into_iter()
        .map(|(turn, moves)| (turn, &moves.player_1_move, &moves.player_2_move))
        .collect()
}

/// Keeps, for each state, only the moves seen most often for it.
///
/// Output is deduplicated and keeps first-seen order.
pub fn most_frequent_moves(samples: &[TrainingSample]) -> Vec<TrainingSample> {
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for sample in samples {
        *counts
            .entry((sample.state.as_str(), sample.played.as_str()))
            .or_default() += 1;
    }
    let mut best: HashMap<&str, usize> = HashMap::new();
    for ((state, _), count) in &counts {
        let entry = best.entry(*state).or_default();
        *entry = (*entry).max(*count);
    }

    let mut emitted = std::collections::HashSet::new();
    samples
        .iter()
        .filter(|sample| {
            let key = (sample.state.as_str(), sample.played.as_str());
            counts.get(&key) == best.get(key.0) && emitted.insert(key)
        })
        .cloned()
        .collect()
}
