use std::fmt;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::debug;

/*
    Rules for a single game of tic-tac-toe: the board, whose turn it is, and win/draw evaluation.
    Positions are 1-based (1..=9) and map to cells in row-major order.
    The server side owns the only mutable GameState. Everyone else works with BoardSnapshots.
 */

pub const BOARD_CELLS: usize = 9;

// 0-based cell indices of every row, column, and diagonal.
const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

// The two sides of a session. The server always plays X and moves first.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Player {
    Server,
    Client,
}

impl Player {
    pub fn mark(self) -> CellElement {
        match self {
            Player::Server => CellElement::X,
            Player::Client => CellElement::O,
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Player::Server => Player::Client,
            Player::Client => Player::Server,
        }
    }

    fn winning_result(self) -> GameResult {
        match self {
            Player::Server => GameResult::ServerWins,
            Player::Client => GameResult::ClientWins,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum CellElement {
    None,
    X,
    O,
}

impl CellElement {
    pub fn is_marked(self) -> bool {
        !matches!(self, CellElement::None)
    }

    // ASCII form used in board snapshots. Empty cells show their own position digit.
    fn to_byte(self, index: usize) -> u8 {
        match self {
            CellElement::None => b'1' + index as u8,
            CellElement::X => b'X',
            CellElement::O => b'O',
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum GameResult {
    InProgress,
    ServerWins,
    ClientWins,
    Draw,
}

impl GameResult {
    pub const SERVER_WINS_MESSAGE: &'static str = "Server (X) wins!";
    pub const CLIENT_WINS_MESSAGE: &'static str = "Client (O) wins!";
    pub const DRAW_MESSAGE: &'static str = "Draw";

    pub fn is_terminal(self) -> bool {
        !matches!(self, GameResult::InProgress)
    }

    /// The literal that ends a session on the wire, or `None` while the game is still going.
    pub fn terminal_message(self) -> Option<&'static str> {
        match self {
            GameResult::InProgress => None,
            GameResult::ServerWins => Some(Self::SERVER_WINS_MESSAGE),
            GameResult::ClientWins => Some(Self::CLIENT_WINS_MESSAGE),
            GameResult::Draw => Some(Self::DRAW_MESSAGE),
        }
    }

    /// Parses one of the three terminal literals. Trailing NUL bytes are ignored since
    /// older servers sent the win messages with their C string terminator.
    pub fn from_terminal_message(bytes: &[u8]) -> Option<Self> {
        let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        match &bytes[..end] {
            b if b == Self::SERVER_WINS_MESSAGE.as_bytes() => Some(GameResult::ServerWins),
            b if b == Self::CLIENT_WINS_MESSAGE.as_bytes() => Some(GameResult::ClientWins),
            b if b == Self::DRAW_MESSAGE.as_bytes() => Some(GameResult::Draw),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, Error)]
pub enum MoveError {
    #[display("Position {position} is out of range (1-9)")]
    OutOfRange { position: i64 },
    #[display("Position {position} is already occupied")]
    CellOccupied { position: u8 },
    #[display("It is not the {actor:?}'s turn")]
    NotYourTurn { actor: Player },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, Error)]
pub enum SnapshotError {
    #[display("Board snapshot must be 9 bytes, got {len}")]
    WrongLength { len: usize },
    #[display("Invalid byte {byte:#04x} for cell {position}")]
    InvalidCell { position: usize, byte: u8 },
}

// Maps a 1-based position to a cell index.
fn cell_index(position: i64) -> Result<usize, MoveError> {
    if (1..=BOARD_CELLS as i64).contains(&position) {
        Ok((position - 1) as usize)
    } else {
        Err(MoveError::OutOfRange { position })
    }
}

/// The 9-byte row-major ASCII form of a board: `'1'..='9'` for an empty cell, `'X'` or `'O'` for a mark.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BoardSnapshot([u8; BOARD_CELLS]);

impl BoardSnapshot {
    pub fn initial() -> Self {
        GameState::new().snapshot()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let cells: [u8; BOARD_CELLS] = bytes
            .try_into()
            .map_err(|_| SnapshotError::WrongLength { len: bytes.len() })?;

        for (index, byte) in cells.iter().enumerate() {
            let placeholder = CellElement::None.to_byte(index);
            if *byte != placeholder && *byte != b'X' && *byte != b'O' {
                return Err(SnapshotError::InvalidCell { position: index + 1, byte: *byte });
            }
        }
        Ok(Self(cells))
    }

    pub fn as_bytes(&self) -> &[u8; BOARD_CELLS] {
        &self.0
    }

    pub fn cell(&self, position: i64) -> Option<CellElement> {
        let index = cell_index(position).ok()?;
        Some(match self.0[index] {
            b'X' => CellElement::X,
            b'O' => CellElement::O,
            _ => CellElement::None,
        })
    }

    // Out-of-range positions are reported as unoccupied; range is checked separately.
    pub fn is_occupied(&self, position: i64) -> bool {
        self.cell(position).is_some_and(CellElement::is_marked)
    }
}

impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, byte) in self.0.iter().enumerate() {
            write!(f, "{} ", *byte as char)?;
            if (index + 1) % 3 == 0 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl From<BoardSnapshot> for String {
    fn from(snapshot: BoardSnapshot) -> Self {
        snapshot.0.iter().map(|b| *b as char).collect()
    }
}

impl TryFrom<String> for BoardSnapshot {
    type Error = SnapshotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_bytes(value.as_bytes())
    }
}

// Represents the game state. Only mutated through apply_move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    board: [CellElement; BOARD_CELLS],
    this_turn: Player,
    moves_played: u8,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: [CellElement::None; BOARD_CELLS],
            this_turn: Player::Server, // X goes first
            moves_played: 0,
        }
    }

    pub fn this_turn(&self) -> Player {
        self.this_turn
    }

    pub fn moves_played(&self) -> u8 {
        self.moves_played
    }

    pub fn board(&self) -> &[CellElement; BOARD_CELLS] {
        &self.board
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        let mut cells = [0; BOARD_CELLS];
        for (index, cell) in self.board.iter().enumerate() {
            cells[index] = cell.to_byte(index);
        }
        BoardSnapshot(cells)
    }

    // Returns the cell index the move would write to.
    pub fn is_valid_move(&self, actor: Player, position: i64) -> Result<usize, MoveError> {
        if actor != self.this_turn {
            return Err(MoveError::NotYourTurn { actor });
        }
        let index = cell_index(position)?;
        if self.board[index].is_marked() {
            return Err(MoveError::CellOccupied { position: position as u8 });
        }
        Ok(index)
    }

    /// Writes the actor's mark at `position` and hands the turn to the other side.
    /// A rejected move leaves the board and the turn untouched.
    pub fn apply_move(&mut self, actor: Player, position: i64) -> Result<BoardSnapshot, MoveError> {
        let index = self.is_valid_move(actor, position)?;

        self.board[index] = actor.mark();
        self.this_turn = actor.opponent();
        self.moves_played += 1;
        debug!(?actor, position, moves_played = self.moves_played, "Move applied");

        Ok(self.snapshot())
    }

    // The side that moved last is the opponent of whoever is up next.
    pub fn evaluate(&self) -> GameResult {
        evaluate(&self.board, self.this_turn.opponent())
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

fn has_line(board: &[CellElement; BOARD_CELLS], mark: CellElement) -> bool {
    WINNING_LINES
        .iter()
        .any(|line| line.iter().all(|index| board[*index] == mark))
}

/// Scores a board. Lines for `last_mover` are checked first, then the other side, and only then
/// a full board counts as a draw, so a move that completes a line on the last free cell is a win.
pub fn evaluate(board: &[CellElement; BOARD_CELLS], last_mover: Player) -> GameResult {
    for player in [last_mover, last_mover.opponent()] {
        if has_line(board, player.mark()) {
            return player.winning_result();
        }
    }

    if board.iter().all(|cell| cell.is_marked()) {
        GameResult::Draw
    } else {
        GameResult::InProgress
    }
}
