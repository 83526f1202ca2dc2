use std::fmt;

use serde::Deserialize;

use crate::error::{EngineError, EngineResult};
use crate::movegen::Move;

pub const BOARD_SIZE: i32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a man's forward step.
    pub fn forward(&self) -> i32 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row a man of this color is crowned on.
    pub fn far_row(&self) -> i32 {
        match self {
            Color::White => 0,
            Color::Black => BOARD_SIZE - 1,
        }
    }

    /// Row this color starts from and defends.
    pub fn home_row(&self) -> i32 {
        self.opposite().far_row()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Man,
    King,
}

/// A single draughts piece. Color is fixed; rank only ever goes Man -> King.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    color: Color,
    rank: Rank,
}

impl Piece {
    pub fn man(color: Color) -> Self {
        Self { color, rank: Rank::Man }
    }

    pub fn king(color: Color) -> Self {
        Self { color, rank: Rank::King }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }

    pub fn crown(&mut self) {
        self.rank = Rank::King;
    }

    pub fn symbol(&self) -> char {
        match (self.color, self.rank) {
            (Color::White, Rank::Man) => 'w',
            (Color::White, Rank::King) => 'W',
            (Color::Black, Rank::Man) => 'b',
            (Color::Black, Rank::King) => 'B',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            'w' => Some(Piece::man(Color::White)),
            'W' => Some(Piece::king(Color::White)),
            'b' => Some(Piece::man(Color::Black)),
            'B' => Some(Piece::king(Color::Black)),
            _ => None,
        }
    }
}

/// A board coordinate. Always inside the 8x8 grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    row: u8,
    col: u8,
}

impl Coord {
    pub fn new(row: i32, col: i32) -> EngineResult<Self> {
        if Self::in_bounds(row, col) {
            Ok(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(EngineError::InvalidCoordinate { row, col })
        }
    }

    pub fn in_bounds(row: i32, col: i32) -> bool {
        (0..BOARD_SIZE).contains(&row) && (0..BOARD_SIZE).contains(&col)
    }

    pub fn row(&self) -> i32 {
        self.row as i32
    }

    pub fn col(&self) -> i32 {
        self.col as i32
    }

    /// Playable squares are the ones with odd `row + col`.
    pub fn is_dark(&self) -> bool {
        (self.row + self.col) % 2 == 1
    }

    /// The coordinate `steps` cells away along `(dr, dc)`, if still on the board.
    pub fn offset(&self, dr: i32, dc: i32, steps: i32) -> Option<Coord> {
        Coord::new(self.row() + dr * steps, self.col() + dc * steps).ok()
    }

    /// Row-major iteration over every square.
    pub fn all() -> impl Iterator<Item = Coord> {
        (0..BOARD_SIZE).flat_map(|row| {
            (0..BOARD_SIZE).map(move |col| Coord {
                row: row as u8,
                col: col as u8,
            })
        })
    }
}

/// One square of the board. `highlighted` belongs to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tile {
    piece: Option<Piece>,
    highlighted: bool,
}

impl Tile {
    pub fn piece(&self) -> Option<Piece> {
        self.piece
    }

    pub fn has_piece(&self) -> bool {
        self.piece.is_some()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    tiles: [[Tile; 8]; 8],
    side_to_move: Color,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// Standard starting position, White to move.
    pub fn new() -> Self {
        let mut board = Self::empty();
        board.initialize();
        board
    }

    pub fn empty() -> Self {
        Self {
            tiles: [[Tile::default(); 8]; 8],
            side_to_move: Color::White,
        }
    }

    /// Resets to the standard layout: Black men on rows 0-2, White men on rows 5-7.
    pub fn initialize(&mut self) {
        *self = Self::empty();
        for coord in Coord::all().filter(Coord::is_dark) {
            let color = match coord.row() {
                0..=2 => Color::Black,
                5..=7 => Color::White,
                _ => continue,
            };
            self.tile_mut(coord).piece = Some(Piece::man(color));
        }
    }

    pub fn tile(&self, coord: Coord) -> &Tile {
        &self.tiles[coord.row as usize][coord.col as usize]
    }

    fn tile_mut(&mut self, coord: Coord) -> &mut Tile {
        &mut self.tiles[coord.row as usize][coord.col as usize]
    }

    pub fn piece_at(&self, coord: Coord) -> Option<Piece> {
        self.tile(coord).piece
    }

    pub fn is_empty(&self, coord: Coord) -> bool {
        self.tile(coord).piece.is_none()
    }

    /// Places a piece, replacing whatever stood there. Light squares are rejected.
    pub fn place_piece(&mut self, coord: Coord, piece: Piece) -> EngineResult<()> {
        if !coord.is_dark() {
            return Err(EngineError::InvalidCoordinate {
                row: coord.row(),
                col: coord.col(),
            });
        }
        self.tile_mut(coord).piece = Some(piece);
        Ok(())
    }

    pub fn remove_piece(&mut self, coord: Coord) -> Option<Piece> {
        self.tile_mut(coord).piece.take()
    }

    /// Crowns the piece on `coord`. Returns false when the square is empty.
    pub fn promote(&mut self, coord: Coord) -> bool {
        match self.tile_mut(coord).piece.as_mut() {
            Some(piece) => {
                piece.crown();
                true
            }
            None => false,
        }
    }

    pub fn set_highlighted(&mut self, coord: Coord, value: bool) {
        self.tile_mut(coord).highlighted = value;
    }

    pub fn clear_highlights(&mut self) {
        for tile in self.tiles.iter_mut().flatten() {
            tile.highlighted = false;
        }
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn set_side_to_move(&mut self, color: Color) {
        self.side_to_move = color;
    }

    /// Pieces of `color` in row-major order.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        Coord::all().filter_map(move |coord| {
            self.piece_at(coord)
                .filter(|piece| piece.color() == color)
                .map(|piece| (coord, piece))
        })
    }

    pub fn piece_count(&self, color: Color) -> usize {
        self.pieces(color).count()
    }

    /// Executes a move produced or validated by the move generator.
    ///
    /// Relocates the piece, removes every captured piece, crowns a man that
    /// lands on its far row and passes the turn. The move is not re-validated.
    pub fn apply_move(&mut self, mv: &Move) {
        if let Some(piece) = self.remove_piece(mv.from) {
            self.tile_mut(mv.to).piece = Some(piece);
        }

        for &captured in &mv.captured {
            self.remove_piece(captured);
        }

        if let Some(piece) = self.piece_at(mv.to) {
            if !piece.is_king() && mv.to.row() == piece.color().far_row() {
                self.promote(mv.to);
            }
        }

        self.side_to_move = self.side_to_move.opposite();
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for row in self.tiles.iter() {
            let line: Vec<String> = row
                .iter()
                .map(|tile| tile.piece.map_or('.', |piece| piece.symbol()).to_string())
                .collect();
            result.push_str(&line.join(" "));
            result.push('\n');
        }
        write!(f, "{}", result)
    }
}
