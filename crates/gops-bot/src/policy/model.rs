use super::log_play_decision;
use gops_core::game::strategy::{Choice, SelectionStrategy, TurnContext};
use gops_core::model::hand::{Hand, ModelMiss, ModelSelection};
use gops_core::statement::MovePredictor;
use rand::RngCore;

/// Plays whatever the external move model names, falling back to a random
/// card whenever the model fails or names a card that is not held.
#[derive(Debug)]
pub struct ExternalModelPolicy<M> {
    model: M,
    bad_selections: u32,
}

impl<M: MovePredictor> ExternalModelPolicy<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            bad_selections: 0,
        }
    }

    pub fn into_model(self) -> M {
        self.model
    }
}

impl<M: MovePredictor> SelectionStrategy for ExternalModelPolicy<M> {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice {
        let remaining = hand.len();
        let Some(selection) = hand.select_via_external_model(ctx.statement, &mut self.model, rng)
        else {
            return Choice::Quit;
        };
        match &selection {
            ModelSelection::Predicted(card) => {
                log_play_decision(ctx, self.label(), remaining, *card, "model");
            }
            ModelSelection::Fallback { card, reason } => {
                self.bad_selections += 1;
                let reason = match reason {
                    ModelMiss::Error(err) => format!("model-error: {err}"),
                    ModelMiss::UnparsableToken(token) => format!("model-token '{token}'"),
                    ModelMiss::NotHeld(rank) => format!("model-not-held {rank}"),
                };
                tracing::warn!(
                    target: "gops_bot::model",
                    seat = ctx.seat.id(),
                    turn = ctx.turn,
                    bad_selections = self.bad_selections,
                    reason = %reason,
                    "external model selection rejected; playing a random card"
                );
                log_play_decision(ctx, self.label(), remaining, *card, &reason);
            }
        }
        Choice::Play(selection.card())
    }

    fn label(&self) -> &'static str {
        "external-model"
    }

    fn bad_selections(&self) -> u32 {
        self.bad_selections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::context;
    use gops_core::model::card::Card;
    use gops_core::model::rank::Rank;
    use gops_core::model::suit::Suit;
    use gops_core::statement::PredictError;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Replays canned replies and remembers every statement it was shown.
    struct Scripted {
        replies: Vec<Result<String, PredictError>>,
        seen: Vec<String>,
    }

    impl MovePredictor for Scripted {
        fn predict(&mut self, statement: &str) -> Result<String, PredictError> {
            self.seen.push(statement.to_string());
            if self.replies.is_empty() {
                return Err(PredictError::Unavailable("script exhausted".into()));
            }
            self.replies.remove(0)
        }
    }

    #[test]
    fn counts_only_rejected_predictions() {
        let model = Scripted {
            replies: vec![
                Ok("played_card_5".into()),
                Ok("played_card_5".into()),
                Ok("garbage".into()),
            ],
            seen: Vec::new(),
        };
        let mut policy = ExternalModelPolicy::new(model);
        let mut rng = StdRng::seed_from_u64(3);
        let mut hand = Hand::full(Suit::Hearts);
        let pot = [Card::new(Rank::Four, Suit::Clubs)];
        let ctx = context(&pot, "player_hand_1_2", 1);

        assert_eq!(
            policy.choose(&mut hand, &ctx, &mut rng),
            Choice::Play(Card::new(Rank::Five, Suit::Hearts))
        );
        assert_eq!(policy.bad_selections(), 0);

        // Five is gone now, so the same answer is rejected.
        assert!(matches!(policy.choose(&mut hand, &ctx, &mut rng), Choice::Play(_)));
        assert_eq!(policy.bad_selections(), 1);

        assert!(matches!(policy.choose(&mut hand, &ctx, &mut rng), Choice::Play(_)));
        assert!(matches!(policy.choose(&mut hand, &ctx, &mut rng), Choice::Play(_)));
        assert_eq!(policy.bad_selections(), 3);
        assert_eq!(hand.len(), 9);

        let model = policy.into_model();
        assert_eq!(model.seen.len(), 4);
        assert!(model.seen.iter().all(|statement| statement == "player_hand_1_2"));
    }
}
