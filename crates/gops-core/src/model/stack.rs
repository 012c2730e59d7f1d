use crate::model::card::Card;
use crate::model::rank::Rank;
use crate::model::suit::Suit;
use rand::Rng;
use rand::seq::SliceRandom;

/// Ordered sequence of cards, drawn from the front.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardStack {
    cards: Vec<Card>,
}

impl CardStack {
    pub fn new(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// One card of each of the 13 ranks in `suit`, in `Rank::ORDERED` order.
    pub fn suit_deck(suit: Suit) -> Self {
        let cards = Rank::ORDERED
            .iter()
            .copied()
            .map(|rank| Card::new(rank, suit))
            .collect();
        Self { cards }
    }

    pub fn shuffled_suit<R: Rng + ?Sized>(suit: Suit, rng: &mut R) -> Self {
        let mut stack = Self::suit_deck(suit);
        stack.shuffle(rng);
        stack
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Removes the front card.
    ///
    /// # Panics
    /// Panics when the stack is empty; callers check [`CardStack::is_empty`] first.
    pub fn draw(&mut self) -> Card {
        assert!(!self.cards.is_empty(), "draw from an empty card stack");
        self.cards.remove(0)
    }

    pub fn find(&self, suit: Suit, rank: Rank) -> Option<usize> {
        self.cards
            .iter()
            .position(|card| card.suit == suit && card.rank == rank)
    }

    pub fn contains(&self, suit: Suit, rank: Rank) -> bool {
        self.find(suit, rank).is_some()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Stable sort, ascending by numeric value.
    pub fn sort_by_value(&mut self) {
        self.cards.sort_by_key(|card| card.numeric_value());
    }

    pub(crate) fn take(&mut self, index: usize) -> Card {
        self.cards.swap_remove(index)
    }
}

#[cfg(test)]
mod tests {
    use super::CardStack;
    use crate::model::card::Card;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn suit_deck_has_each_rank_once() {
        let deck = CardStack::suit_deck(Suit::Clubs);
        assert_eq!(deck.len(), 13);
        let unique: HashSet<_> = deck.iter().map(|card| card.rank).collect();
        assert_eq!(unique.len(), 13);
        assert!(deck.iter().all(|card| card.suit == Suit::Clubs));
    }

    #[test]
    fn find_reports_position_or_none() {
        let stack = CardStack::new(vec![
            Card::new(Rank::Ace, Suit::Clubs),
            Card::new(Rank::Two, Suit::Clubs),
            Card::new(Rank::Three, Suit::Clubs),
            Card::new(Rank::Four, Suit::Clubs),
            Card::new(Rank::Five, Suit::Clubs),
        ]);
        assert_eq!(stack.find(Suit::Spades, Rank::Ace), None);
        assert_eq!(stack.find(Suit::Clubs, Rank::Four), Some(3));
    }

    #[test]
    fn draw_takes_from_front() {
        let mut deck = CardStack::suit_deck(Suit::Hearts);
        let first = deck.draw();
        assert_eq!(first, Card::new(Rank::Two, Suit::Hearts));
        assert_eq!(deck.len(), 12);
    }

    #[test]
    #[should_panic(expected = "empty card stack")]
    fn draw_from_empty_stack_panics() {
        let mut stack = CardStack::default();
        stack.draw();
    }

    #[test]
    fn shuffle_changes_order_over_repeated_trials() {
        let original = CardStack::suit_deck(Suit::Clubs);
        let mut rng = StdRng::seed_from_u64(7);
        let mut differs = false;
        for _ in 0..5 {
            let mut stack = original.clone();
            stack.shuffle(&mut rng);
            if stack.cards() != original.cards() {
                differs = true;
                break;
            }
        }
        assert!(differs);
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let a = CardStack::shuffled_suit(Suit::Clubs, &mut StdRng::seed_from_u64(42));
        let b = CardStack::shuffled_suit(Suit::Clubs, &mut StdRng::seed_from_u64(42));
        assert_eq!(a.cards(), b.cards());
    }

    #[test]
    fn sort_by_value_puts_low_ace_first() {
        let mut deck = CardStack::shuffled_suit(Suit::Spades, &mut StdRng::seed_from_u64(3));
        deck.sort_by_value();
        let values: Vec<u8> = deck.iter().map(|card| card.numeric_value()).collect();
        assert_eq!(values, (1..=13).collect::<Vec<u8>>());
    }
}
