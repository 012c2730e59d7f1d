use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use gops_core::trace::extract::{ExtractError, TraceExtractor, WinningSamples, most_frequent_moves};
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractRequest {
    pub trace_dir: PathBuf,
    pub player_one: u8,
    pub player_two: u8,
    /// Keep only each state's most frequent winning moves.
    pub most_frequent: bool,
    pub output: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractSummary {
    pub traces_read: usize,
    pub samples_found: usize,
    pub samples_written: usize,
    pub output: PathBuf,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("failed to write {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode sample: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Writes winning-side `(state, move)` pairs as JSONL, one object per line.
pub fn export_samples(request: &ExtractRequest) -> Result<ExtractSummary, ExportError> {
    let WinningSamples {
        traces_read,
        mut samples,
    } = TraceExtractor::new(&request.trace_dir)
        .collect_winning(request.player_one, request.player_two)?;
    let samples_found = samples.len();
    if request.most_frequent {
        samples = most_frequent_moves(&samples);
    }

    let io_err = |source| ExportError::Io {
        path: request.output.clone(),
        source,
    };
    if let Some(dir) = request
        .output
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        fs::create_dir_all(dir).map_err(io_err)?;
    }
    let mut writer = BufWriter::new(File::create(&request.output).map_err(io_err)?);
    for sample in &samples {
        serde_json::to_writer(&mut writer, sample)?;
        writer.write_all(b"\n").map_err(io_err)?;
    }
    writer.flush().map_err(io_err)?;

    event!(
        target: "gops_bench::extract",
        Level::INFO,
        trace_dir = %request.trace_dir.display(),
        traces = traces_read,
        samples_found,
        samples_written = samples.len(),
        output = %request.output.display(),
    );

    Ok(ExtractSummary {
        traces_read,
        samples_found,
        samples_written: samples.len(),
        output: request.output.clone(),
    })
}

/// Samples file for a difficulty pairing, placed beside its traces.
pub fn default_output(trace_dir: &Path, player_one: u8, player_two: u8) -> PathBuf {
    trace_dir.join(format!("samples_p1_d{player_one}_p2_d{player_two}.jsonl"))
}
