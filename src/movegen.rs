use serde::Deserialize;

use crate::board::{Board, Color, Coord, Piece};
use crate::error::{EngineError, EngineResult};

/// Diagonal directions in enumeration order.
pub const DIRECTIONS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

/// One logical move. A chained capture is a single move whose `captured`
/// lists every jumped piece in the order it was taken.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
    pub captured: Vec<Coord>,
}

impl Move {
    pub fn new(from: Coord, to: Coord) -> Self {
        Self {
            from,
            to,
            captured: Vec::new(),
        }
    }

    pub fn with_captures(from: Coord, to: Coord, captured: Vec<Coord>) -> Self {
        Self { from, to, captured }
    }

    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }
}

/// Rule variants. The defaults are the permissive reference rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Men may also jump toward their own back row.
    pub men_capture_backwards: bool,
    /// Only capture sequences of maximal length are legal.
    pub longest_capture_mandatory: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MoveGenerator {
    rules: Rules,
}

impl MoveGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Rules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> Rules {
        self.rules
    }

    /// All legal moves for `color`. Captures, when any exist, are the only legal moves.
    pub fn legal_moves(&self, board: &Board, color: Color) -> Vec<Move> {
        let mut captures = self.capture_moves(board, color);
        if captures.is_empty() {
            return self.quiet_moves(board, color);
        }

        if self.rules.longest_capture_mandatory {
            let longest = captures.iter().map(|mv| mv.captured.len()).max().unwrap_or(0);
            captures.retain(|mv| mv.captured.len() == longest);
        }
        captures
    }

    /// Legal moves of the piece on `coord`; empty if the square is empty.
    pub fn legal_moves_from(&self, board: &Board, coord: Coord) -> Vec<Move> {
        match board.piece_at(coord) {
            Some(piece) => self
                .legal_moves(board, piece.color())
                .into_iter()
                .filter(|mv| mv.from == coord)
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn has_capture(&self, board: &Board, color: Color) -> bool {
        board
            .pieces(color)
            .any(|(from, piece)| !self.single_captures(board, from, piece, &[]).is_empty())
    }

    pub fn is_legal(&self, board: &Board, mv: &Move, color: Color) -> bool {
        self.validate(board, mv, color).is_ok()
    }

    /// Re-derives legality of `mv` for `color` from board occupancy alone.
    pub fn validate(&self, board: &Board, mv: &Move, color: Color) -> EngineResult<()> {
        let illegal = |reason: &str| EngineError::illegal(mv, reason);

        let piece = board
            .piece_at(mv.from)
            .ok_or_else(|| illegal("no piece on the origin square"))?;
        if piece.color() != color {
            return Err(illegal("piece belongs to the other side"));
        }
        if !board.is_empty(mv.to) {
            return Err(illegal("destination is occupied"));
        }

        if mv.captured.is_empty() {
            if self.has_capture(board, color) {
                return Err(illegal("a capture is available and mandatory"));
            }
            if !self.is_quiet_step(board, mv.from, mv.to, piece) {
                return Err(illegal("piece cannot move there"));
            }
            return Ok(());
        }

        if !self.replays_chain(board, mv.from, piece, &mv.captured, Vec::new(), mv.to) {
            return Err(illegal("capture sequence does not hold on this board"));
        }

        if self.rules.longest_capture_mandatory {
            let longest = self
                .capture_moves(board, color)
                .iter()
                .map(|candidate| candidate.captured.len())
                .max()
                .unwrap_or(0);
            if mv.captured.len() < longest {
                return Err(illegal("a longer capture sequence is mandatory"));
            }
        }
        Ok(())
    }

    /// Every complete capture chain for `color`, before any variant filtering.
    fn capture_moves(&self, board: &Board, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in board.pieces(color) {
            self.collect_captures(board, from, from, piece, Vec::new(), &mut moves);
        }
        moves
    }

    fn quiet_moves(&self, board: &Board, color: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for (from, piece) in board.pieces(color) {
            if piece.is_king() {
                for &(dr, dc) in &DIRECTIONS {
                    let mut step = 1;
                    while let Some(to) = from.offset(dr, dc, step) {
                        if !board.is_empty(to) {
                            break;
                        }
                        moves.push(Move::new(from, to));
                        step += 1;
                    }
                }
            } else {
                for dc in [-1, 1] {
                    if let Some(to) = from.offset(piece.color().forward(), dc, 1) {
                        if board.is_empty(to) {
                            moves.push(Move::new(from, to));
                        }
                    }
                }
            }
        }
        moves
    }

    /// Extends the chain that left `origin` and now stands on `at`.
    ///
    /// `captured` is this branch's own path; siblings never share it. A branch
    /// that cannot be extended is emitted as one finished move.
    fn collect_captures(
        &self,
        board: &Board,
        origin: Coord,
        at: Coord,
        piece: Piece,
        captured: Vec<Coord>,
        out: &mut Vec<Move>,
    ) {
        let jumps = self.single_captures(board, at, piece, &captured);
        if jumps.is_empty() {
            if !captured.is_empty() {
                out.push(Move::with_captures(origin, at, captured));
            }
            return;
        }

        for (jumped, landing) in jumps {
            let mut path = captured.clone();
            path.push(jumped);
            self.collect_captures(board, origin, landing, piece, path, out);
        }
    }

    /// Single jumps available from `at` as `(jumped, landing)` pairs.
    ///
    /// Occupancy is the board as it stands before the move: the moving piece
    /// still blocks its starting square, and pieces already in `captured`
    /// cannot be jumped again and nothing passes through them.
    fn single_captures(
        &self,
        board: &Board,
        at: Coord,
        piece: Piece,
        captured: &[Coord],
    ) -> Vec<(Coord, Coord)> {
        let occupied = |coord: Coord| !board.is_empty(coord);
        let is_enemy = |coord: Coord| {
            board
                .piece_at(coord)
                .map_or(false, |other| other.color() != piece.color())
        };

        let mut jumps = Vec::new();
        for &(dr, dc) in &DIRECTIONS {
            if piece.is_king() {
                let mut step = 1;
                let target = loop {
                    match at.offset(dr, dc, step) {
                        Some(coord) if occupied(coord) => break Some(coord),
                        Some(_) => step += 1,
                        None => break None,
                    }
                };
                let Some(jumped) = target else { continue };
                if captured.contains(&jumped) || !is_enemy(jumped) {
                    continue;
                }

                let mut step = 1;
                while let Some(landing) = jumped.offset(dr, dc, step) {
                    if occupied(landing) {
                        break;
                    }
                    jumps.push((jumped, landing));
                    step += 1;
                }
            } else {
                if dr != piece.color().forward() && !self.rules.men_capture_backwards {
                    continue;
                }
                let (Some(jumped), Some(landing)) = (at.offset(dr, dc, 1), at.offset(dr, dc, 2))
                else {
                    continue;
                };
                if captured.contains(&jumped) || !is_enemy(jumped) || occupied(landing) {
                    continue;
                }
                jumps.push((jumped, landing));
            }
        }
        jumps
    }

    fn is_quiet_step(&self, board: &Board, from: Coord, to: Coord, piece: Piece) -> bool {
        let dr = to.row() - from.row();
        let dc = to.col() - from.col();

        if !piece.is_king() {
            return dr == piece.color().forward() && dc.abs() == 1;
        }
        if dr == 0 || dr.abs() != dc.abs() {
            return false;
        }
        let (step_r, step_c) = (dr.signum(), dc.signum());
        (1..dr.abs()).all(|step| {
            from.offset(step_r, step_c, step)
                .map_or(false, |coord| board.is_empty(coord))
        })
    }

    /// Walks the recorded capture list, taking `remaining[0]` next, and checks
    /// that the chain ends on `to` with no further jump available.
    fn replays_chain(
        &self,
        board: &Board,
        at: Coord,
        piece: Piece,
        remaining: &[Coord],
        taken: Vec<Coord>,
        to: Coord,
    ) -> bool {
        let jumps = self.single_captures(board, at, piece, &taken);
        match remaining.split_first() {
            None => at == to && !taken.is_empty() && jumps.is_empty(),
            Some((next, rest)) => jumps
                .into_iter()
                .filter(|(jumped, _)| jumped == next)
                .any(|(jumped, landing)| {
                    let mut path = taken.clone();
                    path.push(jumped);
                    self.replays_chain(board, landing, piece, rest, path, to)
                }),
        }
    }
}

/// Counts leaf positions `depth` plies below `board`, `color` to move first.
pub fn perft(generator: &MoveGenerator, board: &Board, color: Color, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = generator.legal_moves(board, color);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0;
    for mv in moves {
        let mut new_board = board.clone();
        new_board.apply_move(&mv);
        nodes += perft(generator, &new_board, color.opposite(), depth - 1);
    }
    nodes
}
