//! Fixed-vocabulary text encoding of a move record.
//!
//! A state statement is six whitespace-separated words, always in this order:
//!
//! ```text
//! player_hand_<v_v_..> player_score_<n> opp_cards_played_<v_v_..>
//! opponent_score_<n> current_score_card_<sum> prev_score_cards_<v_v_..>
//! ```
//!
//! The external move model is trained on exactly these bytes, so any change
//! here breaks compatibility with existing models and datasets.

use crate::model::rank::Rank;
use crate::trace::record::MoveRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const FULL_SUIT: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    #[error("unknown card value '{0}'")]
    UnknownValue(String),
    #[error("move record has no played card")]
    MissingPlayedCard,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    #[error("move model unavailable: {0}")]
    Unavailable(String),
    #[error("move model protocol error: {0}")]
    Protocol(String),
}

/// Narrow contract with the learned move model: one statement in, one move
/// token (`<prefix>_<prefix>_<rank>`) out.
pub trait MovePredictor: Send {
    fn predict(&mut self, statement: &str) -> Result<String, PredictError>;
}

impl<M: MovePredictor + ?Sized> MovePredictor for Box<M> {
    fn predict(&mut self, statement: &str) -> Result<String, PredictError> {
        (**self).predict(statement)
    }
}

/// A `(state, move)` pair as fed to model training.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingSample {
    pub state: String,
    #[serde(rename = "move")]
    pub played: String,
}

impl TrainingSample {
    /// The move statement: state followed by the played-card word.
    pub fn joined(&self) -> String {
        format!("{} {}", self.state, self.played)
    }
}

/// Statement integer for a persisted card value. `"0"` maps to the sentinel 0.
pub fn value_token(value: &str) -> Result<u8, StatementError> {
    if value == "0" {
        return Ok(0);
    }
    FULL_SUIT
        .iter()
        .position(|symbol| *symbol == value)
        .map(|idx| idx as u8 + 1)
        .ok_or_else(|| StatementError::UnknownValue(value.to_string()))
}

fn value_tokens(values: &[String]) -> Result<Vec<u8>, StatementError> {
    values.iter().map(|value| value_token(value)).collect()
}

/// Card values missing from `held`, in ace-low deck order.
pub fn hand_to_played(held: &[String]) -> Vec<String> {
    FULL_SUIT
        .iter()
        .filter(|symbol| !held.iter().any(|value| value == *symbol))
        .map(|symbol| symbol.to_string())
        .collect()
}

fn sorted_word(tag: &str, values: &[String]) -> Result<String, StatementError> {
    let mut tokens = value_tokens(values)?;
    tokens.sort_unstable();
    let joined = tokens
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join("_");
    Ok(format!("{tag}{joined}"))
}

pub fn state_statement(record: &MoveRecord) -> Result<String, StatementError> {
    let pre = &record.pre_play_data;
    let hand = sorted_word("player_hand_", &pre.own_hand)?;
    let opponent_played = sorted_word("opp_cards_played_", &hand_to_played(&pre.opponent_hand))?;
    let pot: u32 = value_tokens(&pre.prize_values)?
        .into_iter()
        .map(u32::from)
        .sum();
    let previous = sorted_word("prev_score_cards_", &pre.previous_prize_values)?;

    Ok(format!(
        "{hand} player_score_{own} {opponent_played} opponent_score_{opp} current_score_card_{pot} {previous}",
        own = pre.own_score,
        opp = pre.opponent_score,
    ))
}

pub fn move_word(record: &MoveRecord) -> Result<String, StatementError> {
    let played = record
        .post_play_data
        .own_played_card
        .as_deref()
        .ok_or(StatementError::MissingPlayedCard)?;
    Ok(format!("played_card_{}", value_token(played)?))
}

pub fn move_statement(record: &MoveRecord) -> Result<TrainingSample, StatementError> {
    Ok(TrainingSample {
        state: state_statement(record)?,
        played: move_word(record)?,
    })
}

/// Rank named by the trailing integer of a model token such as `played_card_7`.
pub fn parse_move_token(token: &str) -> Option<Rank> {
    let tail = token.trim().rsplit('_').next()?;
    tail.parse::<u8>().ok().and_then(Rank::from_token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::record::{PostPlayData, PrePlayData};

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn sample_record() -> MoveRecord {
        MoveRecord {
            pre_play_data: PrePlayData {
                own_score: "5".into(),
                own_hand: strings(&["10", "2", "A", "K"]),
                opponent_score: "12".into(),
                opponent_hand: strings(&[
                    "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q",
                ]),
                prize_values: strings(&["3", "J"]),
                previous_prize_values: strings(&["Q", "5", "A"]),
            },
            post_play_data: PostPlayData {
                own_played_card: Some("K".into()),
            },
        }
    }

    #[test]
    fn value_tokens_follow_conversion_table() {
        assert_eq!(value_token("A"), Ok(1));
        assert_eq!(value_token("10"), Ok(10));
        assert_eq!(value_token("K"), Ok(13));
        assert_eq!(value_token("0"), Ok(0));
        assert_eq!(
            value_token("Z"),
            Err(StatementError::UnknownValue("Z".into()))
        );
    }

    #[test]
    fn hand_to_played_is_set_difference() {
        let played = hand_to_played(&strings(&["A", "3", "K"]));
        assert_eq!(played.len(), 10);
        assert_eq!(played[0], "2");
        assert!(!played.contains(&"K".to_string()));
    }

    #[test]
    fn state_statement_is_byte_exact() {
        let statement = state_statement(&sample_record()).unwrap();
        assert_eq!(
            statement,
            "player_hand_1_2_10_13 player_score_5 opp_cards_played_1_13 opponent_score_12 current_score_card_14 prev_score_cards_1_5_12"
        );
    }

    #[test]
    fn empty_fields_keep_their_tags() {
        let mut record = sample_record();
        record.pre_play_data.own_hand.clear();
        record.pre_play_data.opponent_hand = strings(&FULL_SUIT);
        record.pre_play_data.previous_prize_values.clear();
        let statement = state_statement(&record).unwrap();
        assert_eq!(
            statement,
            "player_hand_ player_score_5 opp_cards_played_ opponent_score_12 current_score_card_14 prev_score_cards_"
        );
    }

    #[test]
    fn move_statement_appends_played_card() {
        let sample = move_statement(&sample_record()).unwrap();
        assert_eq!(sample.played, "played_card_13");
        assert!(sample.joined().ends_with(" played_card_13"));
        assert!(sample.joined().starts_with(&sample.state));
    }

    #[test]
    fn move_statement_requires_played_card() {
        let mut record = sample_record();
        record.post_play_data.own_played_card = None;
        assert_eq!(
            move_statement(&record),
            Err(StatementError::MissingPlayedCard)
        );
    }

    #[test]
    fn parse_move_token_reads_trailing_integer() {
        assert_eq!(parse_move_token("played_card_12"), Some(Rank::Queen));
        assert_eq!(parse_move_token("played_card_1\n"), Some(Rank::Ace));
        assert_eq!(parse_move_token("played_card_0"), None);
        assert_eq!(parse_move_token("played_card_x"), None);
    }

    #[test]
    fn training_sample_serializes_move_field() {
        let sample = TrainingSample {
            state: "s".into(),
            played: "played_card_3".into(),
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"state":"s","move":"played_card_3"}"#);
    }
}
