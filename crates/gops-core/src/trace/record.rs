//! On-disk trace format.
//!
//! ```json
//! { "turns": { "1": { "player_1_move": {..}, "player_2_move": {..} } }, "winner": 1 }
//! ```
//!
//! Card values are rank symbols and scores are decimal strings, so existing
//! datasets stay readable by the training tooling.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrePlayData {
    pub own_score: String,
    pub own_hand: Vec<String>,
    pub opponent_score: String,
    /// Cards the opponent still holds; the statement derives what was played.
    pub opponent_hand: Vec<String>,
    pub prize_values: Vec<String>,
    pub previous_prize_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostPlayData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub own_played_card: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    pub pre_play_data: PrePlayData,
    #[serde(default)]
    pub post_play_data: PostPlayData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMoves {
    pub player_1_move: MoveRecord,
    pub player_2_move: MoveRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceFile {
    /// Keyed by the 1-based turn number rendered as a string.
    pub turns: BTreeMap<String, TurnMoves>,
    pub winner: Option<u8>,
}

impl TraceFile {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Turns in numeric order. String keys would otherwise sort "10" before "2".
    pub fn ordered_turns(&self) -> Vec<(u32, &TurnMoves)> {
        let mut turns: Vec<(u32, &TurnMoves)> = self
            .turns
            .iter()
            .filter_map(|(key, moves)| key.parse::<u32>().ok().map(|turn| (turn, moves)))
            .collect();
        turns.sort_by_key(|(turn, _)| *turn);
        turns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn record(played: Option<&str>) -> MoveRecord {
        MoveRecord {
            pre_play_data: PrePlayData {
                own_score: "0".into(),
                own_hand: strings(&["2", "A"]),
                opponent_score: "3".into(),
                opponent_hand: strings(&["K"]),
                prize_values: strings(&["4"]),
                previous_prize_values: Vec::new(),
            },
            post_play_data: PostPlayData {
                own_played_card: played.map(str::to_string),
            },
        }
    }

    #[test]
    fn unplayed_card_is_omitted() {
        let json = serde_json::to_string(&record(None)).unwrap();
        assert!(json.contains("\"post_play_data\":{}"));
        let json = serde_json::to_string(&record(Some("A"))).unwrap();
        assert!(json.contains("\"own_played_card\":\"A\""));
    }

    #[test]
    fn reads_trace_with_null_winner() {
        let json = r#"{
            "turns": {
                "1": {
                    "player_1_move": {
                        "pre_play_data": {
                            "own_score": "0", "own_hand": ["A"], "opponent_score": "0",
                            "opponent_hand": ["A"], "prize_values": ["5"], "previous_prize_values": []
                        },
                        "post_play_data": {"own_played_card": "A"}
                    },
                    "player_2_move": {
                        "pre_play_data": {
                            "own_score": "0", "own_hand": ["A"], "opponent_score": "0",
                            "opponent_hand": ["A"], "prize_values": ["5"], "previous_prize_values": []
                        },
                        "post_play_data": {}
                    }
                }
            },
            "winner": null
        }"#;
        let trace = TraceFile::from_json(json).unwrap();
        assert_eq!(trace.winner, None);
        let moves = &trace.turns["1"];
        assert_eq!(moves.player_1_move.post_play_data.own_played_card.as_deref(), Some("A"));
        assert_eq!(moves.player_2_move.post_play_data.own_played_card, None);
    }

    #[test]
    fn ordered_turns_sort_numerically() {
        let mut trace = TraceFile::default();
        for turn in [10, 2, 1] {
            trace.turns.insert(
                turn.to_string(),
                TurnMoves {
                    player_1_move: record(Some("A")),
                    player_2_move: record(Some("2")),
                },
            );
        }
        let order: Vec<u32> = trace.ordered_turns().iter().map(|(turn, _)| *turn).collect();
        assert_eq!(order, vec![1, 2, 10]);
    }
}
