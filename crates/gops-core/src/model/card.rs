use crate::model::rank::Rank;
use crate::model::suit::Suit;
use core::fmt;
use core::hash::{Hash, Hasher};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AceMode {
    #[default]
    Low,
    High,
}

/// A single card. Identity is `(suit, rank)`; the ace mode only changes the
/// numeric value.
#[derive(Debug, Clone, Copy)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
    ace: AceMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("invalid suit '{0}'")]
    InvalidSuit(String),
    #[error("invalid rank '{0}'")]
    InvalidRank(String),
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self {
            rank,
            suit,
            ace: AceMode::Low,
        }
    }

    pub fn parse(suit: &str, rank: &str) -> Result<Self, CardError> {
        let suit = suit.parse::<Suit>()?;
        let rank = rank.parse::<Rank>()?;
        Ok(Self::new(rank, suit))
    }

    pub const fn rank(self) -> Rank {
        self.rank
    }

    pub const fn suit(self) -> Suit {
        self.suit
    }

    pub const fn ace_mode(self) -> AceMode {
        self.ace
    }

    pub fn set_ace_mode(&mut self, mode: AceMode) {
        self.ace = mode;
    }

    pub const fn numeric_value(self) -> u8 {
        match (self.rank, self.ace) {
            (Rank::Ace, AceMode::High) => 14,
            (rank, _) => rank.token(),
        }
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.suit == other.suit && self.rank == other.rank
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.suit.hash(state);
        self.rank.hash(state);
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rank, self.suit)
    }
}

#[cfg(test)]
mod tests {
    use super::{AceMode, Card, CardError, Rank, Suit};

    #[test]
    fn ace_value_follows_mode() {
        let mut card = Card::new(Rank::Ace, Suit::Clubs);
        assert_eq!(card.numeric_value(), 1);
        card.set_ace_mode(AceMode::High);
        assert_eq!(card.ace_mode(), AceMode::High);
        assert_eq!(card.numeric_value(), 14);
    }

    #[test]
    fn face_cards_have_fixed_values() {
        assert_eq!(Card::new(Rank::Jack, Suit::Hearts).numeric_value(), 11);
        assert_eq!(Card::new(Rank::Queen, Suit::Hearts).numeric_value(), 12);
        assert_eq!(Card::new(Rank::King, Suit::Hearts).numeric_value(), 13);
        assert_eq!(Card::new(Rank::Seven, Suit::Hearts).numeric_value(), 7);
    }

    #[test]
    fn equality_ignores_ace_mode() {
        let low = Card::new(Rank::Ace, Suit::Spades);
        let mut high = low;
        high.set_ace_mode(AceMode::High);
        assert_eq!(low, high);
        assert_ne!(low, Card::new(Rank::Ace, Suit::Hearts));
    }

    #[test]
    fn parse_validates_both_parts() {
        assert_eq!(
            Card::parse("Clubs", "K").unwrap(),
            Card::new(Rank::King, Suit::Clubs)
        );
        assert!(matches!(
            Card::parse("Cups", "K"),
            Err(CardError::InvalidSuit(_))
        ));
        assert!(matches!(
            Card::parse("Clubs", "11"),
            Err(CardError::InvalidRank(_))
        ));
    }
}
