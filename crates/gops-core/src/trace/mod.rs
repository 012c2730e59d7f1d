//! Per-turn snapshots of both players, captured before cards are chosen and
//! back-filled with the plays once both players have moved.

pub mod extract;
pub mod record;

use crate::game::Winner;
use crate::model::card::Card;
use crate::model::hand::Hand;
use crate::model::player::{Player, Seat};
use record::{MoveRecord, PostPlayData, PrePlayData, TraceFile, TurnMoves};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceError {
    #[error("no snapshot recorded for turn {0}")]
    MissingSnapshot(u32),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerTraceData {
    pub seat: Seat,
    pub hand: Hand,
    pub score: u32,
    pub prev_cards_played: Vec<Card>,
    pub card_played: Option<Card>,
}

impl PlayerTraceData {
    pub fn capture(player: &Player) -> Self {
        let hand = player.hand().clone();
        let prev_cards_played = Hand::full(hand.suit())
            .iter()
            .filter(|card| !hand.contains(card.suit(), card.rank()))
            .copied()
            .collect();
        Self {
            seat: player.seat(),
            hand,
            score: player.score(),
            prev_cards_played,
            card_played: None,
        }
    }

    fn held_symbols(&self) -> Vec<String> {
        symbols(self.hand.iter())
    }
}

fn symbols<'a>(cards: impl Iterator<Item = &'a Card>) -> Vec<String> {
    let mut values: Vec<String> = cards.map(|card| card.rank().symbol().to_string()).collect();
    values.sort();
    values
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnData {
    pub players: [PlayerTraceData; 2],
    pub prize_cards: Vec<Card>,
    /// Prizes already contested in earlier rounds of this game.
    pub previous_prize_cards: Vec<Card>,
}

impl TurnData {
    pub fn player(&self, seat: Seat) -> &PlayerTraceData {
        &self.players[seat.index()]
    }

    /// The turn as seen by `seat`, assuming perfect memory of the opponent.
    pub fn move_record(&self, seat: Seat) -> MoveRecord {
        let own = self.player(seat);
        let opponent = self.player(seat.opponent());
        MoveRecord {
            pre_play_data: PrePlayData {
                own_score: own.score.to_string(),
                own_hand: own.held_symbols(),
                opponent_score: opponent.score.to_string(),
                opponent_hand: opponent.held_symbols(),
                prize_values: symbols(self.prize_cards.iter()),
                previous_prize_values: symbols(self.previous_prize_cards.iter()),
            },
            post_play_data: PostPlayData {
                own_played_card: own.card_played.map(|card| card.rank().symbol().to_string()),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameTrace {
    turn: u32,
    turns: BTreeMap<u32, TurnData>,
    winner: Option<Winner>,
}

impl Default for GameTrace {
    fn default() -> Self {
        Self::new()
    }
}

impl GameTrace {
    pub fn new() -> Self {
        Self {
            turn: 1,
            turns: BTreeMap::new(),
            winner: None,
        }
    }

    /// The turn currently being recorded (1-based).
    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn winner(&self) -> Option<Winner> {
        self.winner
    }

    pub fn turn_data(&self, turn: u32) -> Option<&TurnData> {
        self.turns.get(&turn)
    }

    pub fn completed_turns(&self) -> impl Iterator<Item = (u32, &TurnData)> {
        self.turns.range(..self.turn).map(|(turn, data)| (*turn, data))
    }

    pub fn update_trace(&mut self, players: &[Player; 2], prize_cards: &[Card]) {
        let mut previous_prize_cards = Vec::new();
        if let Some(previous) = self.turn.checked_sub(1).and_then(|turn| self.turns.get(&turn)) {
            previous_prize_cards.extend_from_slice(&previous.previous_prize_cards);
            // A one-card pot means the last round was decided.
            if prize_cards.len() == 1 {
                previous_prize_cards.extend_from_slice(&previous.prize_cards);
            }
        }
        let data = TurnData {
            players: [
                PlayerTraceData::capture(&players[0]),
                PlayerTraceData::capture(&players[1]),
            ],
            prize_cards: prize_cards.to_vec(),
            previous_prize_cards,
        };
        self.turns.insert(self.turn, data);
    }

    pub fn add_played_cards(
        &mut self,
        player_one: Card,
        player_two: Card,
    ) -> Result<(), TraceError> {
        let data = self
            .turns
            .get_mut(&self.turn)
            .ok_or(TraceError::MissingSnapshot(self.turn))?;
        data.players[0].card_played = Some(player_one);
        data.players[1].card_played = Some(player_two);
        self.turn += 1;
        Ok(())
    }

    pub fn update_winner(&mut self, winner: Winner) {
        self.winner = Some(winner);
    }

    pub fn move_record(&self, turn: u32, seat: Seat) -> Option<MoveRecord> {
        self.turns.get(&turn).map(|data| data.move_record(seat))
    }

    /// Completed turns only; a turn abandoned by a quit is left out.
    pub fn to_file(&self) -> TraceFile {
        let turns = self
            .completed_turns()
            .map(|(turn, data)| {
                (
                    turn.to_string(),
                    TurnMoves {
                        player_1_move: data.move_record(Seat::One),
                        player_2_move: data.move_record(Seat::Two),
                    },
                )
            })
            .collect();
        TraceFile {
            turns,
            winner: self.winner.map(Winner::code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::rank::Rank;
    use crate::model::suit::Suit;

    fn players() -> [Player; 2] {
        [
            Player::new(Seat::One, Hand::full(Suit::Hearts)),
            Player::new(Seat::Two, Hand::full(Suit::Spades)),
        ]
    }

    fn clubs(rank: Rank) -> Card {
        Card::new(rank, Suit::Clubs)
    }

    fn play(players: &mut [Player; 2], rank_one: Rank, rank_two: Rank) -> (Card, Card) {
        let one = players[0].hand_mut().select_by_identity(Suit::Hearts, rank_one).unwrap();
        let two = players[1].hand_mut().select_by_identity(Suit::Spades, rank_two).unwrap();
        (one, two)
    }

    #[test]
    fn snapshot_diffs_against_full_hand() {
        let mut players = players();
        play(&mut players, Rank::Ace, Rank::King);
        let data = PlayerTraceData::capture(&players[0]);
        assert_eq!(data.prev_cards_played, vec![Card::new(Rank::Ace, Suit::Hearts)]);
        assert_eq!(data.hand.len(), 12);
        assert_eq!(data.card_played, None);
    }

    #[test]
    fn played_cards_advance_turn() {
        let mut players = players();
        let mut trace = GameTrace::new();
        assert_eq!(
            trace.add_played_cards(clubs(Rank::Two), clubs(Rank::Three)),
            Err(TraceError::MissingSnapshot(1))
        );

        trace.update_trace(&players, &[clubs(Rank::Five)]);
        let (one, two) = play(&mut players, Rank::Six, Rank::Two);
        trace.add_played_cards(one, two).unwrap();
        assert_eq!(trace.turn(), 2);

        let record = trace.move_record(1, Seat::Two).unwrap();
        assert_eq!(record.post_play_data.own_played_card.as_deref(), Some("2"));
        assert_eq!(record.pre_play_data.own_hand.len(), 13);
        assert_eq!(record.pre_play_data.prize_values, vec!["5".to_string()]);
    }

    #[test]
    fn previous_prizes_collect_decided_pots() {
        let mut players = players();
        let mut trace = GameTrace::new();

        // Turn 1: tie on the five.
        trace.update_trace(&players, &[clubs(Rank::Five)]);
        let (one, two) = play(&mut players, Rank::Four, Rank::Four);
        trace.add_played_cards(one, two).unwrap();

        // Turn 2: the five rolls forward with the nine.
        trace.update_trace(&players, &[clubs(Rank::Five), clubs(Rank::Nine)]);
        assert!(trace.turn_data(2).unwrap().previous_prize_cards.is_empty());
        let (one, two) = play(&mut players, Rank::King, Rank::Two);
        trace.add_played_cards(one, two).unwrap();

        // Turn 3: fresh pot, so turn 2's pot is now history.
        trace.update_trace(&players, &[clubs(Rank::Jack)]);
        let previous = &trace.turn_data(3).unwrap().previous_prize_cards;
        assert_eq!(previous, &vec![clubs(Rank::Five), clubs(Rank::Nine)]);

        let record = trace.move_record(3, Seat::One).unwrap();
        assert_eq!(
            record.pre_play_data.previous_prize_values,
            vec!["5".to_string(), "9".to_string()]
        );
        assert_eq!(record.pre_play_data.opponent_hand.len(), 11);
    }

    #[test]
    fn file_holds_completed_turns_and_winner_code() {
        let mut players = players();
        let mut trace = GameTrace::new();
        trace.update_trace(&players, &[clubs(Rank::Queen)]);
        let (one, two) = play(&mut players, Rank::Queen, Rank::Three);
        trace.add_played_cards(one, two).unwrap();
        // Snapshot for a turn that never completes.
        trace.update_trace(&players, &[clubs(Rank::Two)]);
        trace.update_winner(Winner::PlayerOne);

        let file = trace.to_file();
        assert_eq!(file.turns.len(), 1);
        assert_eq!(file.winner, Some(1));
        let moves = &file.turns["1"];
        assert_eq!(moves.player_1_move.post_play_data.own_played_card.as_deref(), Some("Q"));
        assert_eq!(moves.player_2_move.pre_play_data.opponent_score, "0");
    }
}
