use crate::model::arena::RoundOutcome;
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::Seat;
use rand::RngCore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Play(Card),
    Quit,
}

/// What a player can see when it is asked for a card.
#[derive(Debug, Clone)]
pub struct TurnContext<'a> {
    pub seat: Seat,
    pub turn: u32,
    /// The card flipped this round.
    pub prize: Card,
    /// Every card in the pot, including prizes rolled over from ties.
    pub prize_cards: &'a [Card],
    pub prize_value: u32,
    pub own_score: u32,
    pub opponent_score: u32,
    /// State statement rendered from this turn's trace snapshot.
    pub statement: &'a str,
}

/// A resolved round, from the point of view of `seat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundRecord {
    pub seat: Seat,
    pub turn: u32,
    pub prize_value: u32,
    pub own_card: Card,
    pub opponent_card: Card,
    pub outcome: RoundOutcome,
}

impl RoundRecord {
    pub fn won(&self) -> bool {
        self.outcome.winner == Some(self.seat)
    }
}

/// How a seat picks its card each round.
///
/// Implementations remove the chosen card from `hand` themselves, using the
/// `Hand::select_*` family.
pub trait SelectionStrategy: Send {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice;

    fn observe(&mut self, _round: &RoundRecord) {}

    fn label(&self) -> &'static str;

    /// Times the strategy had to abandon its preferred card for a random one.
    fn bad_selections(&self) -> u32 {
        0
    }
}

impl<S: SelectionStrategy + ?Sized> SelectionStrategy for Box<S> {
    fn choose(&mut self, hand: &mut Hand, ctx: &TurnContext<'_>, rng: &mut dyn RngCore) -> Choice {
        (**self).choose(hand, ctx, rng)
    }

    fn observe(&mut self, round: &RoundRecord) {
        (**self).observe(round)
    }

    fn label(&self) -> &'static str {
        (**self).label()
    }

    fn bad_selections(&self) -> u32 {
        (**self).bad_selections()
    }
}
