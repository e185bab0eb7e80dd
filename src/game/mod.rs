//! Board model and game rules.

pub mod board;
pub mod rules;

pub use board::{Board, Cell, Move, Player, CELL_COUNT, CENTER, CORNERS};
pub use rules::{
    evaluate, outcome, winner, GameOutcome, LOSS_SCORE, NEUTRAL_SCORE, WINNING_LINES, WIN_SCORE,
};
