pub mod arena;
pub mod card;
pub mod hand;
pub mod player;
pub mod rank;
pub mod stack;
pub mod suit;
