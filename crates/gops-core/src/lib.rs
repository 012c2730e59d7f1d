#![deny(warnings)]
pub mod game;
pub mod model;
pub mod predict;
pub mod statement;
pub mod trace;
