use super::log_play_decision;
use gops_core::game::strategy::{Choice, SelectionStrategy, TurnContext};
use gops_core::model::hand::Hand;
use rand::RngCore;

/// Uniform pick over the remaining cards.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomPolicy;

impl SelectionStrategy for RandomPolicy {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice {
        let remaining = hand.len();
        match hand.select_random(rng) {
            Some(card) => {
                log_play_decision(ctx, self.label(), remaining, card, "random");
                Choice::Play(card)
            }
            None => Choice::Quit,
        }
    }

    fn label(&self) -> &'static str {
        "random"
    }
}

/// Bids the card matching the flipped prize, or a random one once it is gone.
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorPrizePolicy;

impl SelectionStrategy for MirrorPrizePolicy {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice {
        let remaining = hand.len();
        let (card, reason) = match hand.select_mirror_prize(&ctx.prize) {
            Some(card) => (Some(card), "mirror"),
            None => (hand.select_random(rng), "mirror-missing"),
        };
        match card {
            Some(card) => {
                log_play_decision(ctx, self.label(), remaining, card, reason);
                Choice::Play(card)
            }
            None => Choice::Quit,
        }
    }

    fn label(&self) -> &'static str {
        "mirror-prize"
    }
}

/// Distance-weighted pick against the value of the whole pot.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedDistancePolicy;

impl SelectionStrategy for WeightedDistancePolicy {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice {
        let remaining = hand.len();
        match hand.select_weighted_distance(ctx.prize_value, rng) {
            Some(card) => {
                log_play_decision(ctx, self.label(), remaining, card, "weighted-distance");
                Choice::Play(card)
            }
            None => Choice::Quit,
        }
    }

    fn label(&self) -> &'static str {
        "weighted-distance"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::context;
    use gops_core::model::card::Card;
    use gops_core::model::rank::Rank;
    use gops_core::model::suit::Suit;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn mirror_matches_flipped_prize() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut hand = Hand::full(Suit::Hearts);
        let pot = [Card::new(Rank::Nine, Suit::Clubs)];
        let ctx = context(&pot, "", 1);
        let choice = MirrorPrizePolicy.choose(&mut hand, &ctx, &mut rng);
        assert_eq!(choice, Choice::Play(Card::new(Rank::Nine, Suit::Hearts)));
    }

    #[test]
    fn mirror_falls_back_when_value_gone() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut hand = Hand::full(Suit::Hearts);
        hand.select_by_value(9).unwrap();
        let pot = [Card::new(Rank::Nine, Suit::Clubs)];
        let ctx = context(&pot, "", 2);
        let choice = MirrorPrizePolicy.choose(&mut hand, &ctx, &mut rng);
        assert!(matches!(choice, Choice::Play(_)));
        assert_eq!(hand.len(), 11);
    }

    #[test]
    fn policies_quit_on_empty_hand() {
        let mut rng = StdRng::seed_from_u64(1);
        let pot = [Card::new(Rank::Two, Suit::Clubs)];
        let ctx = context(&pot, "", 14);
        let mut empty = Hand::with_cards(Suit::Hearts, Vec::new());
        assert_eq!(RandomPolicy.choose(&mut empty, &ctx, &mut rng), Choice::Quit);
        assert_eq!(WeightedDistancePolicy.choose(&mut empty, &ctx, &mut rng), Choice::Quit);
        assert_eq!(MirrorPrizePolicy.choose(&mut empty, &ctx, &mut rng), Choice::Quit);
    }

    #[test]
    fn weighted_distance_uses_pot_value() {
        let mut rng = StdRng::seed_from_u64(6);
        // Pot worth 20: only the king or the lowest card may be thrown.
        let pot = [Card::new(Rank::Seven, Suit::Clubs), Card::new(Rank::King, Suit::Clubs)];
        let ctx = context(&pot, "", 2);
        for _ in 0..50 {
            let mut hand = Hand::full(Suit::Spades);
            let Choice::Play(card) = WeightedDistancePolicy.choose(&mut hand, &ctx, &mut rng) else {
                panic!("expected a card");
            };
            assert!(matches!(card.numeric_value(), 1 | 13), "picked {card}");
        }
    }
}
