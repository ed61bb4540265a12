use std::cmp::Ordering;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::game::{Coord, Seat};
use crate::keyboard::Notice;
use super::board::{Board, Move, Side};
use super::rules::{RuleSet, STALL_LIMIT};

/// Turn marker; `E` once the game has ended.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Turn {
    X,
    O,
    E,
}

impl Turn {
    pub fn side(self) -> Option<Side> {
        match self {
            Turn::X => Some(Side::X),
            Turn::O => Some(Side::O),
            Turn::E => None,
        }
    }
}

impl From<Side> for Turn {
    fn from(side: Side) -> Self {
        match side {
            Side::X => Turn::X,
            Side::O => Turn::O,
        }
    }
}

/// Which seat plays which colour.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(rename = "X")]
    pub x: Seat,
    #[serde(rename = "O")]
    pub o: Seat,
}

impl Default for Settings {
    fn default() -> Self {
        Self { x: Seat::Host, o: Seat::Guest }
    }
}

impl Settings {
    pub fn seat(self, side: Side) -> Seat {
        match side {
            Side::X => self.x,
            Side::O => self.o,
        }
    }

    pub fn side(self, seat: Seat) -> Side {
        if self.x == seat { Side::X } else { Side::O }
    }

    pub fn swapped(self) -> Self {
        Self { x: self.o, o: self.x }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub draw: bool,
    pub surrender: bool,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Votes {
    pub host: Vote,
    pub guest: Vote,
}

impl Votes {
    pub fn get(&self, seat: Seat) -> Vote {
        match seat {
            Seat::Host => self.host,
            Seat::Guest => self.guest,
        }
    }

    fn get_mut(&mut self, seat: Seat) -> &mut Vote {
        match seat {
            Seat::Host => &mut self.host,
            Seat::Guest => &mut self.guest,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WinReason {
    NoPieces,
    NoMoves,
    Surrender,
    Stall,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawReason {
    Agreement,
    Stall,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Win { side: Side, reason: WinReason },
    Draw { reason: DrawReason },
}

/// Engine payloads: a board press, or one of the vote buttons.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Command {
    Cell(Coord),
    Draw,
    Surrender,
}

impl FromStr for Command {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draw" => Ok(Command::Draw),
            "surrender" => Ok(Command::Surrender),
            _ => Coord::parse(s).map(Command::Cell).ok_or(ValidationError::UnknownCommand),
        }
    }
}

// "" when nothing is selected, otherwise the row and column digits
mod selection {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::game::Coord;

    pub fn serialize<S: Serializer>(selection: &Option<Coord>, serializer: S) -> Result<S::Ok, S::Error> {
        match selection {
            Some(c) => serializer.serialize_str(&format!("{}{}", c.0, c.1)),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Coord>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits: Vec<i32> = s.chars()
            .map(|ch| ch.to_digit(10).map(|d| d as i32))
            .collect::<Option<_>>()
            .ok_or_else(|| D::Error::custom(format!("invalid selection {:?}", s)))?;
        match digits.as_slice() {
            [] => Ok(None),
            &[row, column] => Ok(Some(Coord(row, column))),
            _ => Err(D::Error::custom(format!("invalid selection {:?}", s))),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub settings: Settings,
    pub current_turn: Turn,
    pub board: Board,
    #[serde(with = "selection")]
    pub current_selection: Option<Coord>,
    pub current_selection_lock: bool,
    pub move_counter: u32,
    pub vote: Votes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

impl GameState {
    pub fn new(rules: &RuleSet, settings: Settings) -> Self {
        Self {
            settings,
            current_turn: Turn::X,
            board: Board::standard(rules.size),
            current_selection: None,
            current_selection_lock: false,
            move_counter: 0,
            vote: Votes::default(),
            outcome: None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.current_turn == Turn::E
    }

    pub fn seat_to_move(&self) -> Option<Seat> {
        self.current_turn.side().map(|side| self.settings.seat(side))
    }

    /// Destinations the current selection may move to.
    pub fn destinations(&self, rules: &RuleSet) -> Vec<Coord> {
        self.current_selection
            .map(|from| self.board.legal_moves(rules, from).iter().map(|m| m.to).collect())
            .unwrap_or_default()
    }

    /// Applies `command` for the player on `seat`. Errors leave the state untouched.
    pub fn apply(&mut self, rules: &RuleSet, seat: Seat, command: Command) -> Result<Option<Notice>, ValidationError> {
        if self.is_over() {
            return Err(ValidationError::GameEnded);
        }
        match command {
            Command::Draw => Ok(Some(self.vote_draw(seat))),
            Command::Surrender => Ok(self.vote_surrender(seat)),
            Command::Cell(at) => {
                let side = self.settings.side(seat);
                if self.current_turn.side() != Some(side) {
                    return Err(ValidationError::NotYourTurn);
                }
                self.press(rules, side, at).map(|_| None)
            }
        }
    }

    fn vote_draw(&mut self, seat: Seat) -> Notice {
        let vote = self.vote.get_mut(seat);
        vote.draw = !vote.draw;
        let offered = vote.draw;
        if self.vote.host.draw && self.vote.guest.draw {
            self.end(Outcome::Draw { reason: DrawReason::Agreement });
            Notice::toast("Draw agreed.")
        } else if offered {
            Notice::toast("You offered a draw.")
        } else {
            Notice::toast("You withdrew your draw offer.")
        }
    }

    fn vote_surrender(&mut self, seat: Seat) -> Option<Notice> {
        let vote = self.vote.get_mut(seat);
        if !vote.surrender {
            vote.surrender = true;
            return Some(Notice::alert("Press surrender again to confirm."));
        }
        let loser = self.settings.side(seat);
        self.end(Outcome::Win { side: loser.other(), reason: WinReason::Surrender });
        None
    }

    fn press(&mut self, rules: &RuleSet, side: Side, at: Coord) -> Result<(), ValidationError> {
        let cell = self.board.get(at).ok_or(ValidationError::InvalidSelection)?;
        match self.current_selection {
            None => self.select(rules, side, at),
            Some(selected) if selected == at => {
                if self.current_selection_lock {
                    return Err(ValidationError::InvalidSelection);
                }
                self.current_selection = None;
                Ok(())
            }
            Some(_) if cell.side() == Some(side) => {
                if self.current_selection_lock {
                    return Err(ValidationError::InvalidSelection);
                }
                self.select(rules, side, at)
            }
            Some(selected) => self.move_piece(rules, side, selected, at),
        }
    }

    fn select(&mut self, rules: &RuleSet, side: Side, at: Coord) -> Result<(), ValidationError> {
        if self.board[at].side() != Some(side) {
            return Err(ValidationError::InvalidSelection);
        }
        let moves = self.board.possible_moves(rules, at);
        if self.board.can_capture(rules, side) && !moves.iter().any(Move::is_capture) {
            return Err(ValidationError::MustCapture);
        }
        if moves.is_empty() {
            return Err(ValidationError::InvalidSelection);
        }
        self.current_selection = Some(at);
        Ok(())
    }

    fn move_piece(&mut self, rules: &RuleSet, side: Side, from: Coord, to: Coord) -> Result<(), ValidationError> {
        let mv = self.board.possible_moves(rules, from)
            .into_iter()
            .find(|m| m.to == to)
            .ok_or(ValidationError::InvalidMove)?;
        if !mv.is_capture() && self.board.can_capture(rules, side) {
            return Err(ValidationError::MustCapture);
        }
        self.board.apply(mv);
        if mv.is_capture() && self.board.can_capture_from(rules, to) {
            self.current_selection = Some(to);
            self.current_selection_lock = true;
            return Ok(());
        }
        self.finish_turn(rules, side, mv.is_capture());
        Ok(())
    }

    fn finish_turn(&mut self, rules: &RuleSet, side: Side, captured: bool) {
        self.current_selection = None;
        self.current_selection_lock = false;
        self.vote.get_mut(self.settings.seat(side)).surrender = false;
        self.move_counter = if captured { 0 } else { self.move_counter + 1 };
        let next = side.other();
        match outcome(&self.board, rules, next, self.move_counter) {
            Some(result) => self.end(result),
            None => self.current_turn = next.into(),
        }
    }

    fn end(&mut self, result: Outcome) {
        self.current_turn = Turn::E;
        self.current_selection = None;
        self.current_selection_lock = false;
        self.outcome = Some(result);
    }
}

/// Decides whether the game is over with `to_move` about to play.
pub fn outcome(board: &Board, rules: &RuleSet, to_move: Side, move_counter: u32) -> Option<Outcome> {
    let moved = to_move.other();
    let waiting_count = board.count(to_move);
    let moved_count = board.count(moved);
    if waiting_count == 0 {
        return Some(Outcome::Win { side: moved, reason: WinReason::NoPieces });
    }
    if moved_count == 0 {
        return Some(Outcome::Win { side: to_move, reason: WinReason::NoPieces });
    }
    if !board.has_legal_move(rules, to_move) {
        return Some(Outcome::Win { side: moved, reason: WinReason::NoMoves });
    }
    if (waiting_count == 1 || moved_count == 1) && move_counter >= STALL_LIMIT {
        return Some(match waiting_count.cmp(&moved_count) {
            Ordering::Greater => Outcome::Win { side: to_move, reason: WinReason::Stall },
            Ordering::Less => Outcome::Win { side: moved, reason: WinReason::Stall },
            Ordering::Equal => Outcome::Draw { reason: DrawReason::Stall },
        });
    }
    None
}
