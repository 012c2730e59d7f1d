use crate::model::hand::Hand;
use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Seat {
    One = 0,
    Two = 1,
}

impl Seat {
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Seat::One),
            2 => Some(Seat::Two),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// 1-based player number used in traces and file names.
    pub const fn id(self) -> u8 {
        self as u8 + 1
    }

    pub const fn opponent(self) -> Seat {
        match self {
            Seat::One => Seat::Two,
            Seat::Two => Seat::One,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.id())
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    seat: Seat,
    hand: Hand,
    score: u32,
    quit: bool,
}

impl Player {
    pub fn new(seat: Seat, hand: Hand) -> Self {
        Self {
            seat,
            hand,
            score: 0,
            quit: false,
        }
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn hand_mut(&mut self) -> &mut Hand {
        &mut self.hand
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn accept_points(&mut self, points: u32) {
        self.score += points;
    }

    pub fn quit(&mut self) {
        self.quit = true;
    }

    pub fn has_quit(&self) -> bool {
        self.quit
    }
}
