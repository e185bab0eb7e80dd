use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Number of cells on the grid.
pub const CELL_COUNT: usize = 9;

/// Flat indices of the four corners, row-major.
pub const CORNERS: [usize; 4] = [0, 2, 6, 8];

/// Flat index of the center cell.
pub const CENTER: usize = 4;

/// One of the two sides. `X` always moves first under alternating play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn opponent(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    pub fn to_cell(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }

    pub fn marker(self) -> &'static str {
        match self {
            Player::X => "X",
            Player::O => "O",
        }
    }
}

impl std::str::FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Player::X),
            "O" | "o" => Ok(Player::O),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
        }
    }

    pub fn is_empty(self) -> bool {
        self == Cell::Empty
    }

    /// Parses a browser-side marker. `None` and `""` are empty cells.
    pub fn from_marker(marker: Option<&str>) -> Option<Cell> {
        match marker.map(str::trim) {
            None | Some("") => Some(Cell::Empty),
            Some("X") | Some("x") => Some(Cell::X),
            Some("O") | Some("o") => Some(Cell::O),
            Some(_) => None,
        }
    }

    fn to_char(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }
}

/// A coordinate on the grid, both components in `0..3`.
///
/// Only constructible through [`Move::new`] and [`Move::from_index`], so every
/// `Move` addresses a real cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "MoveCoords")]
pub struct Move {
    row: u8,
    col: u8,
}

#[derive(Deserialize)]
struct MoveCoords {
    row: usize,
    col: usize,
}

impl TryFrom<MoveCoords> for Move {
    type Error = EngineError;

    fn try_from(coords: MoveCoords) -> Result<Self> {
        Move::new(coords.row, coords.col)
    }
}

impl Move {
    pub fn new(row: usize, col: usize) -> Result<Self> {
        if row >= 3 || col >= 3 {
            return Err(EngineError::OutOfBounds { row, col });
        }
        Ok(Self {
            row: row as u8,
            col: col as u8,
        })
    }

    /// Builds a move from its row-major index, `None` if the index is past the grid.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < CELL_COUNT).then(|| Self {
            row: (index / 3) as u8,
            col: (index % 3) as u8,
        })
    }

    pub fn row(self) -> usize {
        self.row as usize
    }

    pub fn col(self) -> usize {
        self.col as usize
    }

    pub fn index(self) -> usize {
        self.row as usize * 3 + self.col as usize
    }

    pub fn is_corner(self) -> bool {
        CORNERS.contains(&self.index())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// A 3x3 grid, stored row-major.
///
/// Boards are small `Copy` values: the search passes them by value and never
/// mutates a board it did not create.
///
/// On the wire a board is a 9-element array of `"X"`, `"O"` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Option<String>>", into = "Vec<Option<String>>")]
pub struct Board {
    cells: [Cell; CELL_COUNT],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn from_rows(rows: [[Cell; 3]; 3]) -> Self {
        let mut cells = [Cell::Empty; CELL_COUNT];
        for (r, row) in rows.iter().enumerate() {
            cells[r * 3..r * 3 + 3].copy_from_slice(row);
        }
        Self { cells }
    }

    /// Parses the browser representation: exactly nine markers, each `"X"`,
    /// `"O"`, `""` or absent. Anything else is rejected rather than read as empty.
    pub fn from_markers<S: AsRef<str>>(markers: &[Option<S>]) -> Result<Self> {
        if markers.len() != CELL_COUNT {
            return Err(EngineError::InvalidBoardLength { got: markers.len() });
        }

        let mut cells = [Cell::Empty; CELL_COUNT];
        for (index, marker) in markers.iter().enumerate() {
            let marker = marker.as_ref().map(|m| m.as_ref());
            cells[index] = Cell::from_marker(marker).ok_or_else(|| EngineError::InvalidMarker {
                index,
                marker: marker.unwrap_or_default().to_string(),
            })?;
        }
        Ok(Self { cells })
    }

    pub fn cells(&self) -> &[Cell; CELL_COUNT] {
        &self.cells
    }

    pub fn get(&self, mv: Move) -> Cell {
        self.cells[mv.index()]
    }

    pub fn cell_at(&self, index: usize) -> Cell {
        self.cells[index]
    }

    /// Returns a copy of the board with `player`'s mark at `mv`.
    ///
    /// Unchecked: the caller must pass an empty cell.
    pub fn with_move(mut self, mv: Move, player: Player) -> Board {
        self.cells[mv.index()] = player.to_cell();
        self
    }

    /// Checked placement for callers driving a game.
    pub fn play(&mut self, mv: Move, player: Player) -> Result<()> {
        if !self.get(mv).is_empty() {
            return Err(EngineError::CellOccupied {
                row: mv.row(),
                col: mv.col(),
            });
        }
        self.cells[mv.index()] = player.to_cell();
        Ok(())
    }

    /// Empty cells in row-major order. The order is the search's tie-break.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .filter_map(|(index, _)| Move::from_index(index))
            .collect()
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    pub fn mark_count(&self) -> usize {
        CELL_COUNT - self.empty_count()
    }

    pub fn count(&self, player: Player) -> usize {
        let target = player.to_cell();
        self.cells.iter().filter(|&&cell| cell == target).count()
    }

    pub fn is_empty(&self) -> bool {
        self.empty_count() == CELL_COUNT
    }

    pub fn is_full(&self) -> bool {
        self.empty_count() == 0
    }

    /// Side to move under alternating play with `X` first.
    pub fn next_player(&self) -> Player {
        if self.count(Player::X) > self.count(Player::O) {
            Player::O
        } else {
            Player::X
        }
    }

    /// Checks that the piece counts are reachable by alternating play.
    pub fn integrity_check(&self) -> Result<()> {
        let x_count = self.count(Player::X);
        let o_count = self.count(Player::O);
        if x_count.abs_diff(o_count) > 1 {
            return Err(EngineError::InvalidPieceCounts { x_count, o_count });
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.cells.chunks(3).enumerate() {
            if r > 0 {
                writeln!(f)?;
            }
            for cell in row {
                write!(f, "{}", cell.to_char())?;
            }
        }
        Ok(())
    }
}

impl TryFrom<Vec<Option<String>>> for Board {
    type Error = EngineError;

    fn try_from(markers: Vec<Option<String>>) -> Result<Self> {
        Board::from_markers(&markers)
    }
}

impl From<Board> for Vec<Option<String>> {
    fn from(board: Board) -> Self {
        board
            .cells
            .iter()
            .map(|cell| cell.player().map(|p| p.marker().to_string()))
            .collect()
    }
}
