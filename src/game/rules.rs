use serde::{Deserialize, Serialize};

use super::board::{Board, Player};

/// Score of a position won by the reference player.
pub const WIN_SCORE: i32 = 10;
/// Score of a position won by the reference player's opponent.
pub const LOSS_SCORE: i32 = -WIN_SCORE;
/// Score of a draw or an unfinished position.
pub const NEUTRAL_SCORE: i32 = 0;

/// The eight winning lines as flat indices: rows, columns, diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameOutcome {
    Won { winner: Player },
    Draw,
    InProgress,
}

/// Owner of the first completed line, scanning rows, then columns, then diagonals.
pub fn winner(board: &Board) -> Option<Player> {
    let cells = board.cells();
    WINNING_LINES.iter().find_map(|&[a, b, c]| {
        let owner = cells[a].player()?;
        (cells[a] == cells[b] && cells[b] == cells[c]).then_some(owner)
    })
}

/// Terminal evaluation from `reference`'s point of view: `+10` if it owns a
/// line, `-10` if the opponent does, `0` otherwise.
pub fn evaluate(board: &Board, reference: Player) -> i32 {
    match winner(board) {
        Some(player) if player == reference => WIN_SCORE,
        Some(_) => LOSS_SCORE,
        None => NEUTRAL_SCORE,
    }
}

pub fn outcome(board: &Board) -> GameOutcome {
    if let Some(winner) = winner(board) {
        GameOutcome::Won { winner }
    } else if board.is_full() {
        GameOutcome::Draw
    } else {
        GameOutcome::InProgress
    }
}
