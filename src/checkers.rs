use itertools::Itertools;

use crate::action::GameKind;
use crate::engine::Rules;
use crate::error::ValidationError;
use crate::game::{Coord, Seat, Table};
use crate::keyboard::{self, Button, Caption, Keyboard, Labels, Notice, Screen};

pub use self::board::{Board, Cell, Move, Side};
pub use self::rules::{RuleSet, STALL_LIMIT};
pub use self::state::{outcome, Command, DrawReason, GameState, Outcome, Settings, Turn, WinReason};

pub mod board;
pub mod rules;
pub mod state;

/// The checkers family, one engine per [`RuleSet`].
pub struct Checkers {
    kind: GameKind,
    rules: RuleSet,
}

impl Checkers {
    pub fn new(kind: GameKind, rules: RuleSet) -> Self {
        Self { kind, rules }
    }

    fn get_text(&self, state: &GameState, table: &Table, labels: &dyn Labels) -> String {
        let name = move |side: Side| table.name(state.settings.seat(side));
        let piece = move |side: Side| labels.cell(Cell::Man(side).code());
        let header = format!("{} {} {} vs {} {} {}",
                             piece(Side::X), name(Side::X), state.board.count(Side::X),
                             state.board.count(Side::O), name(Side::O), piece(Side::O));

        let status = match state.outcome {
            Some(Outcome::Win { side, reason }) => {
                let why = match reason {
                    WinReason::NoPieces => "no pieces left",
                    WinReason::NoMoves => "no moves left",
                    WinReason::Surrender => "surrender",
                    WinReason::Stall => "more pieces",
                };
                format!("Winner: {} {} ({})", piece(side), name(side), why)
            }
            Some(Outcome::Draw { reason: DrawReason::Agreement }) => "Draw game by agreement.".to_owned(),
            Some(Outcome::Draw { reason: DrawReason::Stall }) => "Draw game.".to_owned(),
            None => match state.current_turn.side() {
                Some(side) if state.current_selection_lock => {
                    format!("Turn: {} {}, keep capturing!", piece(side), name(side))
                }
                Some(side) => format!("Turn: {} {}", piece(side), name(side)),
                None => String::new(),
            },
        };

        let offers = if state.is_over() {
            String::new()
        } else {
            [Seat::Host, Seat::Guest].iter()
                .filter(|&&seat| state.vote.get(seat).draw)
                .map(|&seat| format!("{} offers a draw.", table.name(seat)))
                .join("\n")
        };

        keyboard::lines(vec![Rules::title(self), header.as_str(), status.as_str(), offers.as_str()])
    }

    fn to_inline_keyboard(&self, state: &GameState, labels: &dyn Labels) -> Keyboard {
        let code = self.kind.code();
        let destinations = state.destinations(&self.rules);
        let mut inline_keyboard: Keyboard = state.board.rows()
            .enumerate()
            .map(|(i, row)| row.iter()
                .enumerate()
                .map(|(j, &cell)| {
                    let coord = Coord(i as i32, j as i32);
                    let shown = if state.current_selection == Some(coord) {
                        '*'
                    } else if destinations.contains(&coord) {
                        '+'
                    } else {
                        cell.code()
                    };
                    Button::callback(labels.cell(shown), keyboard::token(code, "game", Some(&coord.to_string())))
                })
                .collect()
            ).collect::<Vec<Vec<_>>>().into();

        if state.is_over() {
            inline_keyboard.add_row(vec![
                keyboard::caption_button(labels, Caption::Restart, code, "start"),
                keyboard::caption_button(labels, Caption::Quit, code, "quit"),
            ]);
        } else {
            inline_keyboard.add_row(vec![
                Button::callback(labels.caption(Caption::Draw), keyboard::token(code, "game", Some("draw"))),
                Button::callback(labels.caption(Caption::Surrender), keyboard::token(code, "game", Some("surrender"))),
            ]);
        }
        inline_keyboard
    }
}

impl Rules for Checkers {
    type State = GameState;

    fn kind(&self) -> GameKind {
        self.kind
    }

    fn title(&self) -> &str {
        match self.kind {
            GameKind::Checkers => "Checkers",
            GameKind::PoolCheckers => "Pool checkers",
        }
    }

    // sides swap on every rematch
    fn start(&self, previous: Option<GameState>) -> GameState {
        let settings = previous.map_or_else(Settings::default, |p| p.settings.swapped());
        GameState::new(&self.rules, settings)
    }

    fn is_over(&self, state: &GameState) -> bool {
        state.is_over()
    }

    fn seat_to_move(&self, state: &GameState) -> Option<Seat> {
        state.seat_to_move()
    }

    fn play(&self, state: &mut GameState, seat: Seat, payload: &str) -> Result<Option<Notice>, ValidationError> {
        let command: Command = payload.parse()?;
        state.apply(&self.rules, seat, command)
    }

    fn render(&self, state: &GameState, table: &Table, labels: &dyn Labels) -> Screen {
        Screen {
            text: self.get_text(state, table, labels),
            keyboard: self.to_inline_keyboard(state, labels),
        }
    }
}
