mod basic;
mod bid;
mod human;
mod model;

pub use basic::{MirrorPrizePolicy, RandomPolicy, WeightedDistancePolicy};
pub use bid::BidPredictionPolicy;
pub use human::{CardPrompt, HumanPolicy, PromptReply, parse_reply};
pub use model::ExternalModelPolicy;

use crate::difficulty::Difficulty;
use gops_core::game::strategy::{SelectionStrategy, TurnContext};
use gops_core::model::card::Card;
use gops_core::statement::MovePredictor;
use thiserror::Error;
use tracing::{Level, event};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("difficulty {0} needs an external move model")]
    MissingModel(Difficulty),
}

/// Builds the automated policy for `difficulty`. Only the external-model
/// level consumes `model`; it is dropped otherwise.
pub fn build_policy(
    difficulty: Difficulty,
    model: Option<Box<dyn MovePredictor>>,
) -> Result<Box<dyn SelectionStrategy>, PolicyError> {
    let policy: Box<dyn SelectionStrategy> = match difficulty {
        Difficulty::Random => Box::new(RandomPolicy),
        Difficulty::MirrorPrize => Box::new(MirrorPrizePolicy),
        Difficulty::WeightedDistance => Box::new(WeightedDistancePolicy),
        Difficulty::BidPrediction => Box::new(BidPredictionPolicy::new()),
        Difficulty::ExternalModel => {
            let model = model.ok_or(PolicyError::MissingModel(difficulty))?;
            Box::new(ExternalModelPolicy::new(model))
        }
    };
    Ok(policy)
}

pub(crate) fn decision_details_enabled() -> bool {
    details_flag(std::env::var("GOPS_DECISION_DETAILS").ok().as_deref())
}

fn details_flag(raw: Option<&str>) -> bool {
    raw.is_some_and(|raw| matches!(raw.trim(), "1" | "true" | "TRUE" | "on" | "ON"))
}

pub(crate) fn log_play_decision(
    ctx: &TurnContext<'_>,
    policy: &'static str,
    hand_size: usize,
    chosen: Card,
    reason: &str,
) {
    if !tracing::enabled!(Level::INFO) {
        return;
    }

    if decision_details_enabled() {
        event!(
            target: "gops_bot::play",
            Level::INFO,
            seat = ctx.seat.id(),
            turn = ctx.turn,
            policy,
            prize_value = ctx.prize_value,
            pot_cards = ctx.prize_cards.len(),
            hand_size,
            chosen = %chosen,
            reason,
            statement = ctx.statement,
        );
    } else {
        event!(
            target: "gops_bot::play",
            Level::INFO,
            seat = ctx.seat.id(),
            turn = ctx.turn,
            policy,
            prize_value = ctx.prize_value,
            chosen = %chosen,
            reason,
        );
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use gops_core::statement::PredictError;

    struct Echo;

    impl MovePredictor for Echo {
        fn predict(&mut self, _statement: &str) -> Result<String, PredictError> {
            Ok("played_card_1".into())
        }
    }

    #[test]
    fn factory_labels_match_difficulty() {
        for difficulty in Difficulty::ALL {
            let model: Option<Box<dyn MovePredictor>> = Some(Box::new(Echo));
            let policy = build_policy(difficulty, model).unwrap();
            assert_eq!(policy.label(), difficulty.label());
        }
    }

    #[test]
    fn external_level_requires_model() {
        let err = build_policy(Difficulty::ExternalModel, None).err();
        assert_eq!(err, Some(PolicyError::MissingModel(Difficulty::ExternalModel)));
        assert!(build_policy(Difficulty::Random, None).is_ok());
    }

    #[test]
    fn details_flag_accepts_truthy_values() {
        assert!(!details_flag(None));
        assert!(!details_flag(Some("")));
        assert!(!details_flag(Some("0")));
        assert!(!details_flag(Some("yes")));
        assert!(details_flag(Some("1")));
        assert!(details_flag(Some(" on\n")));
        assert!(details_flag(Some("TRUE")));
    }
}
