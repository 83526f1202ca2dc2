//! Text forms for squares, moves and boards.
//!
//! Squares read like `c3`: the file letter is the column, the rank digit is
//! counted from White's side (`8 - row`). Quiet moves are written `c3-d4`,
//! captures `c3xe5` optionally followed by the jumped squares in chain order,
//! `c3xg7[d4,f6]`.

use std::fmt;
use std::str::FromStr;

use crate::board::{Board, Color, Coord, Piece, BOARD_SIZE};
use crate::error::{EngineError, EngineResult};
use crate::movegen::Move;

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let file = (b'a' + self.col() as u8) as char;
        write!(f, "{}{}", file, BOARD_SIZE - self.row())
    }
}

impl FromStr for Coord {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(EngineError::InvalidNotation(format!("square '{}'", s)));
        };
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(EngineError::InvalidNotation(format!("square '{}'", s)));
        }
        let col = file as i32 - 'a' as i32;
        let row = BOARD_SIZE - (rank as i32 - '0' as i32);
        Coord::new(row, col)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.captured.is_empty() {
            return write!(f, "{}-{}", self.from, self.to);
        }
        let jumped: Vec<String> = self.captured.iter().map(Coord::to_string).collect();
        write!(f, "{}x{}[{}]", self.from, self.to, jumped.join(","))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum MoveKind {
    Quiet,
    /// `None` when the jumped squares were left out.
    Capture(Option<Vec<Coord>>),
}

/// A parsed move that still has to be matched against the legal moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveText {
    pub from: Coord,
    pub to: Coord,
    kind: MoveKind,
}

impl FromStr for MoveText {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let bad = || EngineError::InvalidNotation(format!("move '{}'", s));

        if let Some((from, to)) = s.split_once('-') {
            return Ok(MoveText {
                from: from.parse()?,
                to: to.parse()?,
                kind: MoveKind::Quiet,
            });
        }

        let (from, rest) = s.split_once('x').ok_or_else(bad)?;
        let (to, captured) = match rest.split_once('[') {
            Some((to, list)) => {
                let list = list.strip_suffix(']').ok_or_else(bad)?;
                let squares = list
                    .split(',')
                    .map(str::parse)
                    .collect::<EngineResult<Vec<Coord>>>()?;
                (to, Some(squares))
            }
            None => (rest, None),
        };

        Ok(MoveText {
            from: from.parse()?,
            to: to.parse()?,
            kind: MoveKind::Capture(captured),
        })
    }
}

impl MoveText {
    /// Picks the one move in `candidates` this text describes.
    pub fn resolve(&self, candidates: &[Move]) -> EngineResult<Move> {
        let matches: Vec<&Move> = candidates
            .iter()
            .filter(|mv| mv.from == self.from && mv.to == self.to)
            .filter(|mv| match &self.kind {
                MoveKind::Quiet => !mv.is_capture(),
                MoveKind::Capture(None) => mv.is_capture(),
                MoveKind::Capture(Some(captured)) => &mv.captured == captured,
            })
            .collect();

        match matches.as_slice() {
            [mv] => Ok((*mv).clone()),
            [] => Err(EngineError::illegal(self, "not among the legal moves")),
            _ => Err(EngineError::InvalidNotation(format!(
                "{} is ambiguous, list the captured squares",
                self
            ))),
        }
    }
}

impl fmt::Display for MoveText {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            MoveKind::Quiet => write!(f, "{}-{}", self.from, self.to),
            MoveKind::Capture(None) => write!(f, "{}x{}", self.from, self.to),
            MoveKind::Capture(Some(captured)) => {
                let jumped: Vec<String> = captured.iter().map(Coord::to_string).collect();
                write!(f, "{}x{}[{}]", self.from, self.to, jumped.join(","))
            }
        }
    }
}

impl FromStr for Color {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "w" | "white" => Ok(Color::White),
            "b" | "black" => Ok(Color::Black),
            other => Err(EngineError::InvalidNotation(format!("color '{}'", other))),
        }
    }
}

impl Board {
    /// Parses the `Display` form back: eight rows of `.`/`b`/`B`/`w`/`W`
    /// separated by newlines or `/`, optionally followed by a `w` or `b` row
    /// naming the side to move. Whitespace inside a row is ignored.
    pub fn from_diagram(diagram: &str) -> EngineResult<Board> {
        let rows: Vec<&str> = diagram
            .split(|c: char| c == '\n' || c == '/')
            .map(str::trim)
            .filter(|row| !row.is_empty())
            .collect();
        if rows.len() != 8 && rows.len() != 9 {
            return Err(EngineError::InvalidNotation(format!(
                "diagram needs 8 rows, found {}",
                rows.len()
            )));
        }

        let mut board = Board::empty();
        for (row, line) in rows.iter().take(8).enumerate() {
            let symbols: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if symbols.len() != 8 {
                return Err(EngineError::InvalidNotation(format!(
                    "diagram row {} has {} squares",
                    row,
                    symbols.len()
                )));
            }
            for (col, symbol) in symbols.into_iter().enumerate() {
                if symbol == '.' {
                    continue;
                }
                let piece = Piece::from_symbol(symbol).ok_or_else(|| {
                    EngineError::InvalidNotation(format!("unknown piece '{}'", symbol))
                })?;
                board.place_piece(Coord::new(row as i32, col as i32)?, piece)?;
            }
        }

        if let Some(side) = rows.get(8) {
            board.set_side_to_move(side.parse()?);
        }
        Ok(board)
    }
}

impl FromStr for Board {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Board::from_diagram(s)
    }
}
