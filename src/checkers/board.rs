use std::convert::TryFrom;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::game::{Coord, Size};
use super::rules::RuleSet;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Side {
    X,
    O,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::X => Side::O,
            Side::O => Side::X,
        }
    }

    /// Row direction of a man's forward step. X starts at the bottom.
    pub fn forward(self) -> i32 {
        match self {
            Side::X => -1,
            Side::O => 1,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "char", try_from = "char")]
pub enum Cell {
    Empty,
    Man(Side),
    King(Side),
}

impl Cell {
    pub fn side(self) -> Option<Side> {
        match self {
            Cell::Empty => None,
            Cell::Man(side) | Cell::King(side) => Some(side),
        }
    }

    pub fn is_king(self) -> bool {
        matches!(self, Cell::King(_))
    }

    pub fn code(self) -> char {
        match self {
            Cell::Empty => '.',
            Cell::Man(Side::X) => 'x',
            Cell::Man(Side::O) => 'o',
            Cell::King(Side::X) => 'X',
            Cell::King(Side::O) => 'O',
        }
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

impl From<Cell> for char {
    fn from(cell: Cell) -> Self {
        cell.code()
    }
}

impl TryFrom<char> for Cell {
    type Error = String;

    fn try_from(code: char) -> Result<Self, Self::Error> {
        match code {
            '.' => Ok(Cell::Empty),
            'x' => Ok(Cell::Man(Side::X)),
            'o' => Ok(Cell::Man(Side::O)),
            'X' => Ok(Cell::King(Side::X)),
            'O' => Ok(Cell::King(Side::O)),
            _ => Err(format!("unknown cell code {:?}", code)),
        }
    }
}

/// One step of a piece. `captured` is set for jumps.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Move {
    pub from: Coord,
    pub to: Coord,
    pub captured: Option<Coord>,
}

impl Move {
    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }
}

/// Square board, persisted as a matrix of cell codes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<Cell>>", try_from = "Vec<Vec<Cell>>")]
pub struct Board {
    size: Size,
    data: Box<[Cell]>,
}

impl Index<Coord> for Board {
    type Output = Cell;

    fn index(&self, index: Coord) -> &Self::Output {
        &self.data[self.size.index(index)]
    }
}

impl IndexMut<Coord> for Board {
    fn index_mut(&mut self, index: Coord) -> &mut Self::Output {
        let i = self.size.index(index);
        &mut self.data[i]
    }
}

impl From<Board> for Vec<Vec<Cell>> {
    fn from(board: Board) -> Self {
        board.rows().map(<[Cell]>::to_vec).collect()
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Board {
    type Error = String;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        let n = rows.len();
        if n == 0 || rows.iter().any(|row| row.len() != n) {
            return Err(format!("board must be a non-empty square matrix, got {} rows", n));
        }
        Ok(Self {
            size: Size(n as i32, n as i32),
            data: rows.into_iter().flatten().collect(),
        })
    }
}

impl Board {
    pub fn empty(size: i32) -> Self {
        Self {
            size: Size(size, size),
            data: vec![Cell::Empty; (size * size) as usize].into(),
        }
    }

    /// Starting position: men on the dark squares of all but the two middle rows.
    pub fn standard(size: i32) -> Self {
        let mut board = Self::empty(size);
        let rows_per_side = size / 2 - 1;
        for coord in board.size.valid_indices().filter(|&c| is_dark(c)) {
            if coord.row() < rows_per_side {
                board[coord] = Cell::Man(Side::O);
            } else if coord.row() >= size - rows_per_side {
                board[coord] = Cell::Man(Side::X);
            }
        }
        board
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn rows(&self) -> impl Iterator<Item=&[Cell]> {
        self.data.chunks(self.size.1 as usize)
    }

    pub fn get(&self, coord: Coord) -> Option<Cell> {
        self.size.contains(coord).then(|| self[coord])
    }

    pub fn pieces(&self, side: Side) -> impl Iterator<Item=Coord> + '_ {
        self.size.valid_indices().filter(move |&c| self[c].side() == Some(side))
    }

    pub fn count(&self, side: Side) -> usize {
        self.pieces(side).count()
    }

    fn is_empty(&self, coord: Coord) -> bool {
        self.get(coord) == Some(Cell::Empty)
    }

    fn is_opponent(&self, coord: Coord, side: Side) -> bool {
        self.get(coord).and_then(Cell::side) == Some(side.other())
    }

    fn promotion_row(&self, side: Side) -> i32 {
        match side {
            Side::X => 0,
            Side::O => self.size.0 - 1,
        }
    }

    /// Every move the piece on `from` could make, ignoring the forced-capture rule.
    pub fn possible_moves(&self, rules: &RuleSet, from: Coord) -> Vec<Move> {
        let cell = match self.get(from) {
            Some(cell) => cell,
            None => return Vec::new(),
        };
        let side = match cell.side() {
            Some(side) => side,
            None => return Vec::new(),
        };
        if cell.is_king() {
            if rules.flying_kings {
                self.flying_moves(from, side)
            } else {
                self.step_moves(from, side, &Coord::DIAGONALS, &Coord::DIAGONALS)
            }
        } else {
            let forward = [Coord(side.forward(), -1), Coord(side.forward(), 1)];
            let jumps: &[Coord] = if rules.backward_captures { &Coord::DIAGONALS } else { &forward };
            self.step_moves(from, side, &forward, jumps)
        }
    }

    fn step_moves(&self, from: Coord, side: Side, steps: &[Coord], jumps: &[Coord]) -> Vec<Move> {
        let mut moves: Vec<Move> = steps.iter()
            .map(|&d| from + d)
            .filter(|&to| self.is_empty(to))
            .map(|to| Move { from, to, captured: None })
            .collect();
        for &d in jumps {
            let over = from + d;
            let to = over + d;
            if self.is_opponent(over, side) && self.is_empty(to) {
                moves.push(Move { from, to, captured: Some(over) });
            }
        }
        moves
    }

    fn flying_moves(&self, from: Coord, side: Side) -> Vec<Move> {
        let mut moves = Vec::new();
        for &d in &Coord::DIAGONALS {
            let mut to = from + d;
            while self.is_empty(to) {
                moves.push(Move { from, to, captured: None });
                to += d;
            }
            // only the cell right behind the first piece met can be a landing
            if self.is_opponent(to, side) && self.is_empty(to + d) {
                moves.push(Move { from, to: to + d, captured: Some(to) });
            }
        }
        moves
    }

    pub fn can_capture_from(&self, rules: &RuleSet, from: Coord) -> bool {
        self.possible_moves(rules, from).iter().any(Move::is_capture)
    }

    /// Whether any piece of `side` has a jump available.
    pub fn can_capture(&self, rules: &RuleSet, side: Side) -> bool {
        self.pieces(side).any(|c| self.can_capture_from(rules, c))
    }

    /// Moves of the piece on `from` that the forced-capture rule allows.
    pub fn legal_moves(&self, rules: &RuleSet, from: Coord) -> Vec<Move> {
        let mut moves = self.possible_moves(rules, from);
        if let Some(side) = self.get(from).and_then(Cell::side) {
            if self.can_capture(rules, side) {
                moves.retain(Move::is_capture);
            }
        }
        moves
    }

    pub fn has_legal_move(&self, rules: &RuleSet, side: Side) -> bool {
        self.pieces(side).any(|c| !self.possible_moves(rules, c).is_empty())
    }

    /// Executes a move, crowning a man that reaches the far row. Returns whether it was crowned.
    pub fn apply(&mut self, mv: Move) -> bool {
        let piece = self[mv.from];
        self[mv.from] = Cell::Empty;
        if let Some(captured) = mv.captured {
            self[captured] = Cell::Empty;
        }
        match piece {
            Cell::Man(side) if mv.to.row() == self.promotion_row(side) => {
                self[mv.to] = Cell::King(side);
                true
            }
            _ => {
                self[mv.to] = piece;
                false
            }
        }
    }
}

pub fn is_dark(coord: Coord) -> bool {
    (coord.row() + coord.column()) % 2 == 1
}
