pub mod strategy;

use crate::model::arena::{ArenaError, PlayArea, RoundOutcome};
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::{Player, Seat};
use crate::model::stack::CardStack;
use crate::model::suit::Suit;
use crate::statement::{self, StatementError};
use crate::trace::{GameTrace, TraceError};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use strategy::{Choice, RoundRecord, SelectionStrategy, TurnContext};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    PlayerOne,
    PlayerTwo,
    Tie,
}

impl Winner {
    /// Trace encoding: 1 and 2 for the seats, 0 for a tie.
    pub const fn code(self) -> u8 {
        match self {
            Winner::PlayerOne => 1,
            Winner::PlayerTwo => 2,
            Winner::Tie => 0,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Winner::PlayerOne),
            2 => Some(Winner::PlayerTwo),
            0 => Some(Winner::Tie),
            _ => None,
        }
    }

    pub const fn seat(self) -> Option<Seat> {
        match self {
            Winner::PlayerOne => Some(Seat::One),
            Winner::PlayerTwo => Some(Seat::Two),
            Winner::Tie => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("the game is already over")]
    GameOver,
    #[error("{seat} played {card}, which was not taken from its hand")]
    IllegalPlay { seat: Seat, card: Card },
    #[error(transparent)]
    Arena(#[from] ArenaError),
    #[error(transparent)]
    Trace(#[from] TraceError),
    #[error(transparent)]
    Statement(#[from] StatementError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSummary {
    pub turn: u32,
    pub prize: Card,
    pub prize_value: u32,
    pub cards: [Card; 2],
    pub outcome: RoundOutcome,
    pub scores: [u32; 2],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnReport {
    Played(RoundSummary),
    /// The seat quit before the round resolved; the turn is abandoned.
    Quit(Seat),
}

#[derive(Debug, Clone)]
pub struct Game {
    players: [Player; 2],
    prize_deck: CardStack,
    arena: PlayArea,
    trace: GameTrace,
    winner: Option<Winner>,
    stranded: Vec<Card>,
}

impl Game {
    /// Hearts against Spades, bidding for a shuffled Clubs prize deck.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::with_suits(Suit::Hearts, Suit::Spades, Suit::Clubs, rng)
    }

    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::new(&mut rng)
    }

    pub fn with_suits<R: Rng + ?Sized>(one: Suit, two: Suit, prize: Suit, rng: &mut R) -> Self {
        Self {
            players: [
                Player::new(Seat::One, Hand::full(one)),
                Player::new(Seat::Two, Hand::full(two)),
            ],
            prize_deck: CardStack::shuffled_suit(prize, rng),
            arena: PlayArea::new(),
            trace: GameTrace::new(),
            winner: None,
            stranded: Vec::new(),
        }
    }

    pub fn players(&self) -> &[Player; 2] {
        &self.players
    }

    pub fn player(&self, seat: Seat) -> &Player {
        &self.players[seat.index()]
    }

    pub fn scores(&self) -> [u32; 2] {
        [self.players[0].score(), self.players[1].score()]
    }

    pub fn arena(&self) -> &PlayArea {
        &self.arena
    }

    pub fn trace(&self) -> &GameTrace {
        &self.trace
    }

    pub fn remaining_prizes(&self) -> usize {
        self.prize_deck.len()
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    /// Tie pots still unresolved when the game ended. They are awarded to no one.
    pub fn stranded_prizes(&self) -> &[Card] {
        &self.stranded
    }

    pub fn game_over(&self) -> bool {
        self.prize_deck.is_empty() || self.players.iter().any(Player::has_quit)
    }

    pub fn play_turn(
        &mut self,
        one: &mut dyn SelectionStrategy,
        two: &mut dyn SelectionStrategy,
        rng: &mut dyn RngCore,
    ) -> Result<TurnReport, GameError> {
        if self.game_over() {
            return Err(GameError::GameOver);
        }

        let prize = self.prize_deck.draw();
        self.arena.flip_prize(prize);
        self.trace.update_trace(&self.players, self.arena.prize_cards());
        let turn = self.trace.turn();
        let prize_value = self.arena.prize_value();

        let card_one = match self.ask(Seat::One, one, prize, rng)? {
            Choice::Play(card) => card,
            Choice::Quit => return Ok(self.abandon(Seat::One)),
        };
        let card_two = match self.ask(Seat::Two, two, prize, rng)? {
            Choice::Play(card) => card,
            Choice::Quit => return Ok(self.abandon(Seat::Two)),
        };

        self.trace.add_played_cards(card_one, card_two)?;
        self.arena.flip_cards(card_one, card_two);
        let outcome = self.arena.award_points(&mut self.players)?;

        let seats: [(Seat, &mut dyn SelectionStrategy, Card, Card); 2] = [
            (Seat::One, &mut *one, card_one, card_two),
            (Seat::Two, &mut *two, card_two, card_one),
        ];
        for (seat, strategy, own_card, opponent_card) in seats {
            strategy.observe(&RoundRecord {
                seat,
                turn,
                prize_value,
                own_card,
                opponent_card,
                outcome,
            });
        }

        Ok(TurnReport::Played(RoundSummary {
            turn,
            prize,
            prize_value,
            cards: [card_one, card_two],
            outcome,
            scores: self.scores(),
        }))
    }

    fn ask(
        &mut self,
        seat: Seat,
        strategy: &mut dyn SelectionStrategy,
        prize: Card,
        rng: &mut dyn RngCore,
    ) -> Result<Choice, GameError> {
        let turn = self.trace.turn();
        let record = self
            .trace
            .move_record(turn, seat)
            .ok_or(TraceError::MissingSnapshot(turn))?;
        let statement = statement::state_statement(&record)?;
        let ctx = TurnContext {
            seat,
            turn,
            prize,
            prize_cards: self.arena.prize_cards(),
            prize_value: self.arena.prize_value(),
            own_score: self.players[seat.index()].score(),
            opponent_score: self.players[seat.opponent().index()].score(),
            statement: &statement,
        };

        let hand = self.players[seat.index()].hand_mut();
        let held_before = hand.len();
        let choice = strategy.choose(hand, &ctx, rng);
        if let Choice::Play(card) = choice {
            let taken = hand.len() + 1 == held_before
                && card.suit() == hand.suit()
                && !hand.contains(card.suit(), card.rank());
            if !taken {
                return Err(GameError::IllegalPlay { seat, card });
            }
        }
        Ok(choice)
    }

    fn abandon(&mut self, seat: Seat) -> TurnReport {
        self.players[seat.index()].quit();
        TurnReport::Quit(seat)
    }

    pub fn decide_winner(&mut self) -> Winner {
        let [one, two] = self.scores();
        let winner = match one.cmp(&two) {
            core::cmp::Ordering::Greater => Winner::PlayerOne,
            core::cmp::Ordering::Less => Winner::PlayerTwo,
            core::cmp::Ordering::Equal => Winner::Tie,
        };
        self.stranded.extend_from_slice(self.arena.prize_cards());
        self.arena.clear();
        self.winner = Some(winner);
        self.trace.update_winner(winner);
        winner
    }

    pub fn run(
        &mut self,
        one: &mut dyn SelectionStrategy,
        two: &mut dyn SelectionStrategy,
        rng: &mut dyn RngCore,
    ) -> Result<Winner, GameError> {
        while !self.game_over() {
            self.play_turn(one, two, rng)?;
        }
        Ok(self.decide_winner())
    }
}
