use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use gops_core::game::Winner;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::BenchmarkConfig;
use crate::tournament::GameOutcome;

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Accumulates per-game outcomes into head-to-head statistics.
pub struct AnalyticsCollector {
    run_id: String,
    seats: [SeatAccumulator; 2],
    ties: usize,
    margins: Vec<f64>,
    stranded_total: u64,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Self {
        let seat = |index: usize| {
            let player = config.players.get(index);
            SeatAccumulator::new(
                player.map(|p| p.name.clone()).unwrap_or_default(),
                player.map(|p| p.difficulty).unwrap_or_default(),
            )
        };
        Self {
            run_id: config.run_id.clone(),
            seats: [seat(0), seat(1)],
            ties: 0,
            margins: Vec::new(),
            stranded_total: 0,
        }
    }

    pub fn record_game(&mut self, outcome: &GameOutcome) {
        match outcome.winner {
            Winner::PlayerOne => self.seats[0].wins += 1,
            Winner::PlayerTwo => self.seats[1].wins += 1,
            Winner::Tie => self.ties += 1,
        }
        for (idx, seat) in self.seats.iter_mut().enumerate() {
            seat.scores.push(f64::from(outcome.scores[idx]));
            seat.bad_selections += u64::from(outcome.bad_selections[idx]);
            seat.decision_ms += outcome.decisions[idx].total_ms;
            seat.decisions += u64::from(outcome.decisions[idx].decisions);
        }
        self.margins
            .push(f64::from(outcome.scores[0]) - f64::from(outcome.scores[1]));
        self.stranded_total += u64::from(outcome.stranded_value);
    }

    pub fn finalize(self) -> AnalyticsSummary {
        let games = self.margins.len();
        let decided = games - self.ties;
        let [one, two] = self.seats;
        let p_value = sign_test(one.wins, decided);
        let margin_mean = mean(&self.margins);

        AnalyticsSummary {
            run_id: self.run_id,
            games,
            ties: self.ties,
            seats: [one.into_report(games), two.into_report(games)],
            margin: MarginReport {
                mean: margin_mean,
                ci95: confidence_interval(&self.margins),
            },
            sign_test: SignTest {
                p_value,
                sample_size: decided,
            },
            avg_stranded_value: if games == 0 {
                0.0
            } else {
                self.stranded_total as f64 / games as f64
            },
        }
    }
}

struct SeatAccumulator {
    name: String,
    difficulty: u8,
    wins: usize,
    scores: Vec<f64>,
    bad_selections: u64,
    decision_ms: f64,
    decisions: u64,
}

impl SeatAccumulator {
    fn new(name: String, difficulty: u8) -> Self {
        Self {
            name,
            difficulty,
            wins: 0,
            scores: Vec::new(),
            bad_selections: 0,
            decision_ms: 0.0,
            decisions: 0,
        }
    }

    fn into_report(self, games: usize) -> SeatReport {
        let per_game = |total: f64| {
            if games == 0 { 0.0 } else { total / games as f64 }
        };
        SeatReport {
            win_rate: per_game(self.wins as f64),
            avg_score: mean(&self.scores),
            score_ci95: confidence_interval(&self.scores),
            avg_bad_selections: per_game(self.bad_selections as f64),
            avg_ms_per_decision: if self.decisions == 0 {
                0.0
            } else {
                self.decision_ms / self.decisions as f64
            },
            name: self.name,
            difficulty: self.difficulty,
            wins: self.wins,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSummary {
    pub run_id: String,
    pub games: usize,
    pub ties: usize,
    pub seats: [SeatReport; 2],
    /// Player one's score minus player two's.
    pub margin: MarginReport,
    pub sign_test: SignTest,
    pub avg_stranded_value: f64,
}

impl AnalyticsSummary {
    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        fs::write(path.as_ref(), self.to_markdown()).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut rows = String::new();
        let _ = writeln!(rows, "# Tournament Summary: {}\n", self.run_id);
        let _ = writeln!(
            rows,
            "Games: {} (ties: {}, avg stranded prize value: {:.2})\n",
            self.games, self.ties, self.avg_stranded_value
        );
        rows.push_str("| Seat | Player | Difficulty | Wins | Win % | Avg score | 95% CI | Avg bad selections | Avg ms/decision |\n");
        rows.push_str("|------|--------|------------|------|-------|-----------|--------|--------------------|-----------------|\n");
        for (idx, seat) in self.seats.iter().enumerate() {
            let _ = writeln!(
                rows,
                "| {seat_no} | {name} | {difficulty} | {wins} | {win:.1}% | {avg:.3} | [{ci_low:.3}, {ci_high:.3}] | {bad:.2} | {latency:.3} |",
                seat_no = idx + 1,
                name = seat.name,
                difficulty = seat.difficulty,
                wins = seat.wins,
                win = seat.win_rate * 100.0,
                avg = seat.avg_score,
                ci_low = seat.score_ci95.0,
                ci_high = seat.score_ci95.1,
                bad = seat.avg_bad_selections,
                latency = seat.avg_ms_per_decision,
            );
        }
        let _ = writeln!(
            rows,
            "\nMean margin (player 1 - player 2): {:+.3} [{:.3}, {:.3}]",
            self.margin.mean, self.margin.ci95.0, self.margin.ci95.1
        );
        let _ = writeln!(
            rows,
            "Sign test over {} decided games: p = {:.4}",
            self.sign_test.sample_size, self.sign_test.p_value
        );
        rows
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatReport {
    pub name: String,
    pub difficulty: u8,
    pub wins: usize,
    pub win_rate: f64,
    pub avg_score: f64,
    pub score_ci95: (f64, f64),
    pub avg_bad_selections: f64,
    pub avg_ms_per_decision: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarginReport {
    pub mean: f64,
    pub ci95: (f64, f64),
}

#[derive(Debug, Clone, Serialize)]
pub struct SignTest {
    pub p_value: f64,
    pub sample_size: usize,
}

fn mean(points: &[f64]) -> f64 {
    if points.is_empty() {
        0.0
    } else {
        points.iter().sum::<f64>() / points.len() as f64
    }
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = mean(points);
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}

/// Two-sided sign test on decided games, normal approximation with
/// continuity correction.
fn sign_test(successes: usize, trials: usize) -> f64 {
    if trials == 0 {
        return 1.0;
    }
    let n = trials as f64;
    let z = ((successes as f64 - n / 2.0).abs() - 0.5) / (n.sqrt() / 2.0);
    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return 1.0;
    };
    let p = 2.0 * (1.0 - normal.cdf(z));
    p.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tournament::DecisionSummary;
    use std::path::PathBuf;

    fn config() -> BenchmarkConfig {
        serde_yaml::from_str(
            r#"
run_id: "stats"
games:
  count: 4
players:
  - name: "mirror"
    difficulty: 2
  - name: "bidder"
    difficulty: 5
outputs:
  trace_dir: "t"
  results_jsonl: "r.jsonl"
  summary_md: "s.md"
"#,
        )
        .expect("yaml")
    }

    fn outcome(index: usize, winner: Winner, scores: [u32; 2]) -> GameOutcome {
        let decisions = DecisionSummary {
            decisions: 13,
            avg_ms_per_decision: 0.5,
            total_ms: 6.5,
        };
        GameOutcome {
            index,
            seed: index as u64,
            winner,
            scores,
            rounds: 13,
            stranded_value: 91 - scores[0] - scores[1],
            bad_selections: [0, index as u32],
            decisions: [decisions.clone(), decisions],
            trace_path: PathBuf::from(format!("trace_{index}.json")),
        }
    }

    #[test]
    fn summary_counts_wins_ties_and_margins() {
        let mut collector = AnalyticsCollector::new(&config());
        collector.record_game(&outcome(0, Winner::PlayerOne, [60, 31]));
        collector.record_game(&outcome(1, Winner::PlayerTwo, [40, 51]));
        collector.record_game(&outcome(2, Winner::PlayerOne, [50, 41]));
        collector.record_game(&outcome(3, Winner::Tie, [40, 40]));
        let summary = collector.finalize();

        assert_eq!(summary.games, 4);
        assert_eq!(summary.ties, 1);
        assert_eq!(summary.seats[0].wins, 2);
        assert_eq!(summary.seats[1].wins, 1);
        assert!((summary.seats[0].win_rate - 0.5).abs() < 1e-12);
        assert!((summary.margin.mean - 6.75).abs() < 1e-12);
        assert!(summary.margin.ci95.0 < 6.75 && summary.margin.ci95.1 > 6.75);
        assert!((summary.seats[1].avg_bad_selections - 1.5).abs() < 1e-12);
        assert!((summary.avg_stranded_value - 2.75).abs() < 1e-12);
        assert!((summary.seats[0].avg_ms_per_decision - 0.5).abs() < 1e-12);
        assert_eq!(summary.sign_test.sample_size, 3);
        assert!((summary.sign_test.p_value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sign_test_flags_lopsided_results() {
        assert_eq!(sign_test(0, 0), 1.0);
        assert_eq!(sign_test(5, 10), 1.0);
        let p = sign_test(95, 100);
        assert!(p < 1e-10, "p = {p}");
        let symmetric = (sign_test(70, 100) - sign_test(30, 100)).abs();
        assert!(symmetric < 1e-12);
        assert!(sign_test(60, 100) > 0.05);
    }

    #[test]
    fn confidence_interval_handles_small_samples() {
        assert_eq!(confidence_interval(&[]), (0.0, 0.0));
        assert_eq!(confidence_interval(&[3.0]), (3.0, 3.0));
        let (low, high) = confidence_interval(&[1.0, 3.0]);
        assert!((low - (2.0 - 1.96)).abs() < 1e-12);
        assert!((high - (2.0 + 1.96)).abs() < 1e-12);
    }

    #[test]
    fn markdown_lists_both_seats() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("summary.md");
        let mut collector = AnalyticsCollector::new(&config());
        collector.record_game(&outcome(0, Winner::PlayerTwo, [30, 61]));
        collector.finalize().write_markdown(&path).expect("write");

        let text = fs::read_to_string(&path).expect("read");
        assert!(text.starts_with("# Tournament Summary: stats"));
        assert!(text.contains("| 1 | mirror | 2 | 0 |"));
        assert!(text.contains("| 2 | bidder | 5 | 1 |"));
        assert!(text.contains("Sign test over 1 decided games"));
    }
}
