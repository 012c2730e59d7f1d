use super::log_play_decision;
use gops_core::game::strategy::{Choice, RoundRecord, SelectionStrategy, TurnContext};
use gops_core::model::hand::Hand;
use gops_core::predict::{MAX_PRIZE, MIN_PRIZE, Strategy, StrategyCollection};
use rand::RngCore;
use tracing::{Level, event};

/// Predicts the opponent's bid from its past bidding and plays the most
/// efficient answer.
#[derive(Debug, Clone)]
pub struct BidPredictionPolicy {
    strategies: StrategyCollection,
    bids: Vec<i32>,
    fallbacks: u32,
}

impl Default for BidPredictionPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl BidPredictionPolicy {
    pub fn new() -> Self {
        Self::with_strategies(StrategyCollection::new())
    }

    pub fn with_strategies(strategies: StrategyCollection) -> Self {
        Self {
            strategies,
            bids: (MIN_PRIZE..=MAX_PRIZE).collect(),
            fallbacks: 0,
        }
    }

    pub fn strategies(&self) -> &StrategyCollection {
        &self.strategies
    }
}

/// Prize keys live in the rank range; pots from rolled-over ties are capped.
fn prize_key(prize_value: u32) -> i32 {
    i32::try_from(prize_value).map_or(MAX_PRIZE, |value| value.clamp(MIN_PRIZE, MAX_PRIZE))
}

fn turn_key(turn: u32) -> i32 {
    i32::try_from(turn).unwrap_or(i32::MAX)
}

impl SelectionStrategy for BidPredictionPolicy {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice {
        let remaining = hand.len();
        let prize = prize_key(ctx.prize_value);
        let Some(selection) = hand.select_via_bid_prediction(
            turn_key(ctx.turn),
            prize,
            &self.bids,
            &self.strategies,
            rng,
        ) else {
            return Choice::Quit;
        };

        if selection.fell_back {
            self.fallbacks += 1;
        }
        if tracing::enabled!(Level::DEBUG) {
            event!(
                target: "gops_bot::bid",
                Level::DEBUG,
                turn = ctx.turn,
                prize,
                strategy_turn = selection.strategy.turn,
                strategy_prize = selection.strategy.prize,
                bid_diff = selection.strategy.bid_diff,
                predicted_bid = selection.predicted_bid,
                best_bid = ?selection.best_bid,
                fell_back = selection.fell_back,
            );
        }
        let reason = if selection.fell_back {
            "bid-fallback"
        } else {
            "bid-efficiency"
        };
        log_play_decision(ctx, self.label(), remaining, selection.card, reason);
        Choice::Play(selection.card)
    }

    fn observe(&mut self, round: &RoundRecord) {
        let prize = prize_key(round.prize_value);
        let opponent_bid = i32::from(round.opponent_card.numeric_value());
        self.strategies.add_strategy(Strategy::new(
            turn_key(round.turn),
            prize,
            opponent_bid - prize,
        ));
    }

    fn label(&self) -> &'static str {
        "bid-prediction"
    }

    fn bad_selections(&self) -> u32 {
        self.fallbacks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::context;
    use gops_core::model::arena::RoundOutcome;
    use gops_core::model::card::Card;
    use gops_core::model::player::Seat;
    use gops_core::model::rank::Rank;
    use gops_core::model::suit::Suit;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn round(turn: u32, prize_value: u32, opponent: Rank) -> RoundRecord {
        RoundRecord {
            seat: Seat::One,
            turn,
            prize_value,
            own_card: Card::new(Rank::Two, Suit::Hearts),
            opponent_card: Card::new(opponent, Suit::Spades),
            outcome: RoundOutcome {
                winner: Some(Seat::Two),
                points: prize_value,
            },
        }
    }

    #[test]
    fn observe_records_opponent_offset() {
        let mut policy = BidPredictionPolicy::new();
        policy.observe(&round(1, 6, Rank::Nine));
        assert_eq!(policy.strategies().len(), 14);
        assert_eq!(policy.strategies().get(1, 6), Some(&Strategy::new(1, 6, 3)));

        // Rolled-over pots above the rank range share the top key.
        policy.observe(&round(2, 21, Rank::Four));
        assert_eq!(policy.strategies().get(2, 13), Some(&Strategy::new(2, 13, -9)));
    }

    #[test]
    fn choose_plays_a_held_card() {
        let mut policy = BidPredictionPolicy::new();
        let mut rng = StdRng::seed_from_u64(12);
        let mut hand = Hand::full(Suit::Hearts);
        let pot = [Card::new(Rank::Seven, Suit::Clubs)];
        let ctx = context(&pot, "", 1);
        let Choice::Play(card) = policy.choose(&mut hand, &ctx, &mut rng) else {
            panic!("expected a card");
        };
        assert_eq!(card.suit(), Suit::Hearts);
        assert!(!hand.contains(Suit::Hearts, card.rank()));
        assert_eq!(policy.bad_selections(), 0);
    }

    #[test]
    fn prize_key_stays_in_rank_range() {
        assert_eq!(prize_key(0), 1);
        assert_eq!(prize_key(9), 9);
        assert_eq!(prize_key(40), 13);
        assert_eq!(prize_key(u32::MAX), 13);
    }
}
