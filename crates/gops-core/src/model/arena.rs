use crate::model::card::Card;
use crate::model::player::{Player, Seat};
use thiserror::Error;

/// The face-up cards of the current round plus the undistributed prize pot.
#[derive(Debug, Clone, Default)]
pub struct PlayArea {
    cards: [Option<Card>; 2],
    prize_cards: Vec<Card>,
    round: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArenaPhase {
    Empty,
    PrizeRevealed,
    CardsPlayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    /// `None` on a tie; the pot then rolls into the next round.
    pub winner: Option<Seat>,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArenaError {
    #[error("no cards have been played this round")]
    NoCardsPlayed,
}

impl PlayArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ArenaPhase {
        if self.cards.iter().all(Option::is_some) {
            ArenaPhase::CardsPlayed
        } else if !self.prize_cards.is_empty() {
            ArenaPhase::PrizeRevealed
        } else {
            ArenaPhase::Empty
        }
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn prize_cards(&self) -> &[Card] {
        &self.prize_cards
    }

    pub fn card(&self, seat: Seat) -> Option<Card> {
        self.cards[seat.index()]
    }

    pub fn flip_prize(&mut self, prize: Card) {
        self.prize_cards.push(prize);
    }

    pub fn flip_cards(&mut self, player_one: Card, player_two: Card) {
        self.cards = [Some(player_one), Some(player_two)];
        self.round += 1;
    }

    pub fn prize_value(&self) -> u32 {
        self.prize_cards
            .iter()
            .map(|card| u32::from(card.numeric_value()))
            .sum()
    }

    pub fn award_points(&mut self, players: &mut [Player; 2]) -> Result<RoundOutcome, ArenaError> {
        let (Some(one), Some(two)) = (self.cards[0], self.cards[1]) else {
            return Err(ArenaError::NoCardsPlayed);
        };
        let points = self.prize_value();
        let winner = match one.numeric_value().cmp(&two.numeric_value()) {
            core::cmp::Ordering::Greater => Some(Seat::One),
            core::cmp::Ordering::Less => Some(Seat::Two),
            core::cmp::Ordering::Equal => None,
        };

        match winner {
            Some(seat) => {
                players[seat.index()].accept_points(points);
                self.clear();
                Ok(RoundOutcome { winner, points })
            }
            None => {
                self.clear_player_cards();
                Ok(RoundOutcome {
                    winner: None,
                    points: 0,
                })
            }
        }
    }

    pub fn clear_player_cards(&mut self) {
        self.cards = [None, None];
    }

    pub fn clear(&mut self) {
        self.clear_player_cards();
        self.prize_cards.clear();
    }
}
