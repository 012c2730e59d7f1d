use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::stack::CardStack;
use crate::model::suit::Suit;
use crate::predict::{self, Strategy, StrategyCollection};
use crate::statement::{self, MovePredictor, PredictError};
use rand::Rng;

/// Prize values at or above this threshold count as expensive.
pub const EXPENSIVE_PRIZE: u32 = 7;
const MAX_DISTANCE_PRIZE: u32 = 13;
const BELOW_PRIZE_PENALTY: f64 = 0.1;

/// A player's cards, always kept sorted ascending by numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hand {
    suit: Suit,
    stack: CardStack,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BidSelection {
    pub card: Card,
    pub strategy: Strategy,
    pub predicted_bid: i32,
    pub best_bid: Option<i32>,
    pub fell_back: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelSelection {
    Predicted(Card),
    Fallback { card: Card, reason: ModelMiss },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelMiss {
    Error(PredictError),
    UnparsableToken(String),
    NotHeld(Rank),
}

impl ModelSelection {
    pub fn card(&self) -> Card {
        match self {
            ModelSelection::Predicted(card) => *card,
            ModelSelection::Fallback { card, .. } => *card,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, ModelSelection::Fallback { .. })
    }
}

impl Hand {
    /// All 13 cards of `suit`.
    pub fn full(suit: Suit) -> Self {
        Self::with_cards(suit, CardStack::suit_deck(suit).cards().to_vec())
    }

    pub fn with_cards(suit: Suit, cards: Vec<Card>) -> Self {
        let mut stack = CardStack::new(cards);
        stack.sort_by_value();
        Self { suit, stack }
    }

    pub fn suit(&self) -> Suit {
        self.suit
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        self.stack.cards()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.stack.iter()
    }

    pub fn contains(&self, suit: Suit, rank: Rank) -> bool {
        self.stack.contains(suit, rank)
    }

    pub fn values(&self) -> Vec<u8> {
        self.iter().map(|card| card.numeric_value()).collect()
    }

    fn remove_at(&mut self, index: usize) -> Card {
        let card = self.stack.take(index);
        self.stack.sort_by_value();
        card
    }

    pub fn select_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Card> {
        if self.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.len());
        Some(self.remove_at(index))
    }

    pub fn select_by_identity(&mut self, suit: Suit, rank: Rank) -> Option<Card> {
        let index = self.stack.find(suit, rank)?;
        Some(self.remove_at(index))
    }

    pub fn select_by_value(&mut self, value: u8) -> Option<Card> {
        let index = self
            .iter()
            .position(|card| card.numeric_value() == value)?;
        Some(self.remove_at(index))
    }

    pub fn select_mirror_prize(&mut self, prize: &Card) -> Option<Card> {
        self.select_by_value(prize.numeric_value())
    }

    /// Per-card distance weights in hand order; lower is preferred.
    pub fn distance_weights(&self, prize_value: u32) -> Vec<f64> {
        if prize_value < EXPENSIVE_PRIZE {
            return self.iter().map(|card| f64::from(card.numeric_value())).collect();
        }
        let target = f64::from(prize_value.min(MAX_DISTANCE_PRIZE));
        self.iter()
            .map(|card| {
                let value = f64::from(card.numeric_value());
                let mut weight = (value - target).abs();
                if value < target {
                    weight += BELOW_PRIZE_PENALTY;
                }
                weight
            })
            .collect()
    }

    pub fn select_weighted_distance<R: Rng + ?Sized>(
        &mut self,
        prize_value: u32,
        rng: &mut R,
    ) -> Option<Card> {
        if self.is_empty() {
            return None;
        }
        let weights = self.distance_weights(prize_value);
        let mut ranked: Vec<usize> = (0..self.len()).collect();
        ranked.sort_by(|&a, &b| weights[a].total_cmp(&weights[b]));

        let distribution = position_distribution(self.len());
        let position = sample_position(&distribution, rng.gen_range(0.0..1.0));
        let mut index = ranked[position];

        if prize_value >= EXPENSIVE_PRIZE {
            let value = u32::from(self.cards()[index].numeric_value());
            let max_value = self.values().into_iter().max().unwrap_or(0);
            let is_max = self.cards()[index].numeric_value() == max_value;
            if value < prize_value && !is_max {
                // Cheap card against an expensive prize: throw the lowest instead.
                index = 0;
            }
        }
        Some(self.remove_at(index))
    }

    pub fn select_via_bid_prediction<R: Rng + ?Sized>(
        &mut self,
        turn: i32,
        prize_value: i32,
        bids: &[i32],
        strategies: &StrategyCollection,
        rng: &mut R,
    ) -> Option<BidSelection> {
        if self.is_empty() {
            return None;
        }
        let strategy = strategies.predicted_strategy(turn, prize_value, rng);
        let predicted_bid = strategy.predicted_bid(prize_value);
        let efficiency = predict::bid_efficiency(prize_value, predicted_bid, bids);
        let best_bid = efficiency.best_bid(bids);

        let chosen = best_bid
            .and_then(|bid| u8::try_from(bid).ok())
            .and_then(|value| self.select_by_value(value));
        let (card, fell_back) = match chosen {
            Some(card) => (card, false),
            None => (self.select_random(rng)?, true),
        };
        Some(BidSelection {
            card,
            strategy,
            predicted_bid,
            best_bid,
            fell_back,
        })
    }

    pub fn select_via_external_model<M, R>(
        &mut self,
        statement: &str,
        model: &mut M,
        rng: &mut R,
    ) -> Option<ModelSelection>
    where
        M: MovePredictor + ?Sized,
        R: Rng + ?Sized,
    {
        if self.is_empty() {
            return None;
        }
        let miss = match model.predict(statement) {
            Ok(token) => match statement::parse_move_token(&token) {
                Some(rank) => match self.select_by_identity(self.suit, rank) {
                    Some(card) => return Some(ModelSelection::Predicted(card)),
                    None => ModelMiss::NotHeld(rank),
                },
                None => ModelMiss::UnparsableToken(token),
            },
            Err(err) => ModelMiss::Error(err),
        };
        let card = self.select_random(rng)?;
        Some(ModelSelection::Fallback { card, reason: miss })
    }
}

/// Geometric-decay distribution over `n` ranked positions.
///
/// Position weights start at `n` and halve each step, then get normalised.
pub fn position_distribution(n: usize) -> Vec<f64> {
    let mut weights = Vec::with_capacity(n);
    let mut weight = n as f64;
    for _ in 0..n {
        weights.push(weight);
        weight -= weight / 2.0;
    }
    let total: f64 = weights.iter().sum();
    if total > 0.0 {
        for w in &mut weights {
            *w /= total;
        }
    }
    weights
}

/// First index whose cumulative probability reaches `draw`.
pub fn sample_position(distribution: &[f64], draw: f64) -> usize {
    let mut cumulative = 0.0;
    for (idx, p) in distribution.iter().enumerate() {
        cumulative += p;
        if cumulative >= draw {
            return idx;
        }
    }
    distribution.len().saturating_sub(1)
}
