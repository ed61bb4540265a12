use std::fmt;
use std::ops::{Add, AddAssign};

use itertools::iproduct;
use serde::{Deserialize, Serialize};

/// A (row, column) position on a grid board.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Coord(pub i32, pub i32);

impl Coord {
    pub const DIAGONALS: [Coord; 4] = [
        Coord(-1, -1),
        Coord(-1, 1),
        Coord(1, -1),
        Coord(1, 1),
    ];

    pub fn row(self) -> i32 {
        self.0
    }

    pub fn column(self) -> i32 {
        self.1
    }

    /// Parses the `"<row>-<column>"` form used in button payloads.
    pub fn parse(s: &str) -> Option<Self> {
        let mut iter = s.trim().splitn(2, '-');
        let row = iter.next()?.parse().ok()?;
        let column = iter.next()?.parse().ok()?;
        Some(Coord(row, column))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

impl Add for Coord {
    type Output = Coord;

    fn add(self, rhs: Self) -> Self::Output {
        Coord(self.0 + rhs.0, self.1 + rhs.1)
    }
}

impl AddAssign for Coord {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
        self.1 += rhs.1;
    }
}

/// Board dimensions as (rows, columns).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Size(pub i32, pub i32);

impl Size {
    pub fn contains(self, coord: Coord) -> bool {
        (0..self.0).contains(&coord.0) && (0..self.1).contains(&coord.1)
    }

    pub fn index(self, coord: Coord) -> usize {
        (coord.0 * self.1 + coord.1) as usize
    }

    pub fn valid_indices(self) -> impl Iterator<Item=Coord> {
        iproduct!(0..self.0, 0..self.1).map(|(i, j)| Coord(i, j))
    }
}

/// A chat user as seen by the games: a stable id plus a display name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self { id: id.into(), name: name.into() }
    }
}

/// One of the two chairs at a table.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seat {
    Host,
    Guest,
}

/// The two seats of a session, as the engines see them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Table {
    pub host: Option<Player>,
    pub guest: Option<Player>,
}

impl Table {
    pub fn player(&self, seat: Seat) -> Option<&Player> {
        match seat {
            Seat::Host => self.host.as_ref(),
            Seat::Guest => self.guest.as_ref(),
        }
    }

    pub fn name(&self, seat: Seat) -> &str {
        self.player(seat).map_or("?", |p| p.name.as_str())
    }
}
