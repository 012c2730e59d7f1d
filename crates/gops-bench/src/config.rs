use gops_bot::Difficulty;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_TIMEOUT_MS: u64 = 2_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root benchmark configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub games: GamesConfig,
    pub players: Vec<PlayerConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_reader(BufReader::new(file)).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.games.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        validate_players(&self.players)?;
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            trace_dir: resolve_template(&self.run_id, &self.outputs.trace_dir),
            results_jsonl: resolve_template(&self.run_id, &self.outputs.results_jsonl),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub count: usize,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Worker threads for parallel runs; rayon's default pool when unset.
    #[serde(default)]
    pub threads: Option<usize>,
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.count == 0 {
            return Err(ValidationError::field(
                "games.count",
                "number of games must be greater than zero",
            ));
        }
        if self.threads == Some(0) {
            return Err(ValidationError::field(
                "games.threads",
                "thread count must be at least 1",
            ));
        }
        Ok(())
    }
}

fn default_parallel() -> bool {
    true
}

/// One of the two seats. Seat order follows list order.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlayerConfig {
    pub name: String,
    pub difficulty: u8,
    #[serde(default)]
    pub external: Option<ExternalConfig>,
}

impl PlayerConfig {
    pub fn difficulty(&self) -> Option<Difficulty> {
        Difficulty::from_level(self.difficulty)
    }
}

/// Process that answers one state statement per invocation.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ExternalConfig {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub trace_dir: String,
    pub results_jsonl: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.trace_dir", &self.trace_dir),
            ("outputs.results_jsonl", &self.results_jsonl),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::field(label, "path must not be empty"));
            }
            if resolve_template(run_id, value).components().count() == 0 {
                return Err(ValidationError::field(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

/// Structured logging is off unless enabled.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub decision_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            decision_details: false,
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::field("run_id", "run_id must not be empty"));
    }
    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::field(
            "run_id",
            "run_id may only contain alphanumeric characters, '.', '_' or '-'",
        ));
    }
    Ok(())
}

fn validate_players(players: &[PlayerConfig]) -> Result<(), ValidationError> {
    if players.len() != 2 {
        return Err(ValidationError::field(
            "players",
            format!("exactly 2 players are required, found {}", players.len()),
        ));
    }

    let mut seen = HashSet::new();
    for (index, player) in players.iter().enumerate() {
        let field = format!("players[{index}]");
        if player.name.trim().is_empty() {
            return Err(ValidationError::field(field, "player name must not be empty"));
        }
        if !seen.insert(player.name.as_str()) {
            return Err(ValidationError::field(
                "players",
                format!("player name '{}' defined more than once", player.name),
            ));
        }
        let Some(difficulty) = player.difficulty() else {
            return Err(ValidationError::field(
                format!("{field}.difficulty"),
                format!("unknown difficulty {}; expected 1-5", player.difficulty),
            ));
        };
        match &player.external {
            None if difficulty.needs_model() => {
                return Err(ValidationError::field(
                    format!("{field}.external"),
                    "difficulty 4 needs an external model command",
                ));
            }
            Some(external) if external.command.trim().is_empty() => {
                return Err(ValidationError::field(
                    format!("{field}.external.command"),
                    "command must not be empty",
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub trace_dir: PathBuf,
    pub results_jsonl: PathBuf,
    pub summary_md: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "d3_vs_d5"
games:
  seed: 123
  count: 8
players:
  - name: "weighted"
    difficulty: 3
  - name: "bidder"
    difficulty: 5
outputs:
  trace_dir: "bench/out/{run_id}/traces"
  results_jsonl: "bench/out/{run_id}/games.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).expect("parse yaml")
    }

    fn invalid_field(yaml: &str) -> String {
        let mut cfg = parse(yaml);
        match cfg.validate().expect_err("should fail") {
            ValidationError::InvalidField { field, .. } => field,
        }
    }

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg = parse(BASIC_YAML);
        cfg.validate().expect("validate");

        assert!(cfg.games.parallel);
        assert_eq!(cfg.games.threads, None);
        assert!(cfg.logging.enable_structured);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));
        assert_eq!(cfg.players[1].difficulty(), Some(Difficulty::BidPrediction));

        let outputs = cfg.resolved_outputs();
        assert_eq!(outputs.trace_dir, PathBuf::from("bench/out/d3_vs_d5/traces"));
        assert_eq!(
            outputs.summary_md,
            PathBuf::from("bench/out/d3_vs_d5/summary.md")
        );
    }

    #[test]
    fn from_path_reads_yaml_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("bench.yaml");
        std::fs::write(&path, BASIC_YAML).expect("write config");
        let cfg = BenchmarkConfig::from_path(&path).expect("load");
        assert_eq!(cfg.run_id, "d3_vs_d5");

        let missing =
            BenchmarkConfig::from_path(dir.path().join("nope.yaml")).expect_err("missing");
        assert!(matches!(missing, ConfigError::Read { .. }));
        assert!(missing.path().ends_with("nope.yaml"));
    }

    #[test]
    fn rejects_unknown_difficulty() {
        let yaml = BASIC_YAML.replace("difficulty: 5", "difficulty: 9");
        assert_eq!(invalid_field(&yaml), "players[1].difficulty");
    }

    #[test]
    fn model_difficulty_needs_external_command() {
        let yaml = BASIC_YAML.replace("difficulty: 5", "difficulty: 4");
        assert_eq!(invalid_field(&yaml), "players[1].external");

        let yaml = BASIC_YAML.replace(
            "difficulty: 5",
            "difficulty: 4\n    external:\n      command: \"./model\"\n      args: [\"--greedy\"]",
        );
        let mut cfg = parse(&yaml);
        cfg.validate().expect("valid");
        let external = cfg.players[1].external.as_ref().expect("external block");
        assert_eq!(external.args, vec!["--greedy".to_string()]);
        assert_eq!(external.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn rejects_duplicate_names_and_wrong_seat_count() {
        let yaml = BASIC_YAML.replace("\"bidder\"", "\"weighted\"");
        assert_eq!(invalid_field(&yaml), "players");

        let yaml = BASIC_YAML.replace("  - name: \"bidder\"\n    difficulty: 5\n", "");
        assert_eq!(invalid_field(&yaml), "players");
    }

    #[test]
    fn rejects_invalid_run_id_and_zero_games() {
        let yaml = BASIC_YAML.replace("d3_vs_d5", "d3 vs d5");
        assert_eq!(invalid_field(&yaml), "run_id");

        let yaml = BASIC_YAML.replace("count: 8", "count: 0");
        assert_eq!(invalid_field(&yaml), "games.count");
    }
}
