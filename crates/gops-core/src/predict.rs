//! Bayesian-style opponent bid model.
//!
//! Every stored [`Strategy`] records how far an opponent bid from the prize at
//! a given turn. Strategies close to the current `(turn, prize)` get
//! exponentially more weight when one is sampled.

use rand::Rng;
use std::collections::BTreeMap;

pub const MIN_PRIZE: i32 = 1;
pub const MAX_PRIZE: i32 = 13;
const EFFICIENCY_SCALE: f64 = 3.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Strategy {
    pub turn: i32,
    pub prize: i32,
    pub bid_diff: i32,
}

impl Strategy {
    pub const fn new(turn: i32, prize: i32, bid_diff: i32) -> Self {
        Self {
            turn,
            prize,
            bid_diff,
        }
    }

    /// The bid this strategy implies for `prize`, kept inside the rank range.
    pub fn predicted_bid(self, prize: i32) -> i32 {
        (prize + self.bid_diff).clamp(MIN_PRIZE, MAX_PRIZE)
    }
}

#[derive(Debug, Clone)]
pub struct StrategyCollection {
    strategies: BTreeMap<(i32, i32), Strategy>,
}

impl Default for StrategyCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyCollection {
    pub fn new() -> Self {
        let strategies = (MIN_PRIZE..=MAX_PRIZE)
            .map(|prize| ((0, prize), Strategy::new(0, prize, 0)))
            .collect();
        Self { strategies }
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    pub fn get(&self, turn: i32, prize: i32) -> Option<&Strategy> {
        self.strategies.get(&(turn, prize))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Strategy> {
        self.strategies.values()
    }

    /// Inserts `strategy`, replacing any entry with the same `(turn, prize)`.
    pub fn add_strategy(&mut self, strategy: Strategy) {
        self.strategies
            .insert((strategy.turn, strategy.prize), strategy);
    }

    /// Un-normalised weight. The turn term is signed: strategies recorded
    /// after `turn` are boosted rather than penalised.
    pub fn base_weight(turn: i32, prize: i32, strategy: &Strategy) -> f64 {
        let dturn = f64::from(turn - strategy.turn);
        let dprize = f64::from((prize - strategy.prize).abs());
        (-(dturn + dprize)).exp()
    }

    pub fn normalization(&self, turn: i32, prize: i32) -> f64 {
        self.iter()
            .map(|strategy| Self::base_weight(turn, prize, strategy))
            .sum()
    }

    pub fn probability(&self, turn: i32, prize: i32, strategy: &Strategy) -> f64 {
        Self::base_weight(turn, prize, strategy) / self.normalization(turn, prize)
    }

    pub fn predicted_strategy<R: Rng + ?Sized>(
        &self,
        turn: i32,
        prize: i32,
        rng: &mut R,
    ) -> Strategy {
        let norm = self.normalization(turn, prize);
        let draw: f64 = rng.gen_range(0.0..1.0);
        let mut cumulative = 0.0;
        let mut last = None;
        for strategy in self.iter() {
            cumulative += Self::base_weight(turn, prize, strategy) / norm;
            if draw <= cumulative {
                return *strategy;
            }
            last = Some(*strategy);
        }
        // Rounding can leave the final cumulative sum a hair below one.
        last.unwrap_or(Strategy::new(turn, prize, 0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BidEfficiency {
    pub values: Vec<f64>,
    /// 1-based position of the best bid in the candidate list.
    pub best_index: usize,
    pub best_value: f64,
}

impl BidEfficiency {
    pub fn best_bid(&self, bids: &[i32]) -> Option<i32> {
        self.best_index
            .checked_sub(1)
            .and_then(|idx| bids.get(idx))
            .copied()
    }
}

/// Scores each candidate bid against the predicted opponent bid.
///
/// Beating the prediction is worth less the more it overshoots; matching it is
/// worthless; undercutting it saves the difference.
pub fn bid_efficiency(prize: i32, predicted_bid: i32, bids: &[i32]) -> BidEfficiency {
    let mut values = Vec::with_capacity(bids.len());
    let mut best_value = -1.0;
    let mut best_index = 0;
    for (idx, &bid) in bids.iter().enumerate() {
        let term = if bid > predicted_bid {
            f64::from(prize) * EFFICIENCY_SCALE / f64::from(1 + bid + predicted_bid).log2()
        } else if bid == predicted_bid {
            0.0
        } else {
            f64::from(predicted_bid - bid)
        };
        values.push(term);
        if term > best_value {
            best_value = term;
            best_index = idx + 1;
        }
    }
    BidEfficiency {
        values,
        best_index,
        best_value,
    }
}
