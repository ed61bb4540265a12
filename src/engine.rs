use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::action::GameKind;
use crate::checkers::{Checkers, RuleSet};
use crate::error::{SessionError, ValidationError};
use crate::game::{Seat, Table};
use crate::keyboard::{Labels, Notice, Screen};

/// A game family's transition function over its own typed state.
pub trait Rules: Send + Sync {
    type State: Serialize + DeserializeOwned;

    fn kind(&self) -> GameKind;

    fn title(&self) -> &str;

    /// Fresh state for a new round. `previous` is the finished round, if any.
    fn start(&self, previous: Option<Self::State>) -> Self::State;

    fn is_over(&self, state: &Self::State) -> bool;

    /// The seat whose turn it is, or `None` once the game is over.
    fn seat_to_move(&self, state: &Self::State) -> Option<Seat>;

    /// Applies one engine payload. On error the state must be left as it was.
    fn play(&self, state: &mut Self::State, seat: Seat, payload: &str) -> Result<Option<Notice>, ValidationError>;

    fn render(&self, state: &Self::State, table: &Table, labels: &dyn Labels) -> Screen;
}

/// Object-safe view of [`Rules`] over the persisted JSON payload.
pub trait Engine: Send + Sync {
    fn kind(&self) -> GameKind;
    fn title(&self) -> &str;
    fn start(&self, previous: Option<&Value>) -> Result<Value, SessionError>;
    fn is_over(&self, state: &Value) -> Result<bool, SessionError>;
    fn seat_to_move(&self, state: &Value) -> Result<Option<Seat>, SessionError>;
    fn play(&self, state: &mut Value, seat: Seat, payload: &str) -> Result<Option<Notice>, SessionError>;
    fn render(&self, state: &Value, table: &Table, labels: &dyn Labels) -> Result<Screen, SessionError>;
}

fn decode<T: DeserializeOwned>(state: &Value) -> Result<T, SessionError> {
    Ok(T::deserialize(state)?)
}

impl<R: Rules> Engine for R {
    fn kind(&self) -> GameKind {
        Rules::kind(self)
    }

    fn title(&self) -> &str {
        Rules::title(self)
    }

    fn start(&self, previous: Option<&Value>) -> Result<Value, SessionError> {
        let previous = previous.map(decode::<R::State>).transpose()?;
        Ok(serde_json::to_value(Rules::start(self, previous))?)
    }

    fn is_over(&self, state: &Value) -> Result<bool, SessionError> {
        Ok(Rules::is_over(self, &decode(state)?))
    }

    fn seat_to_move(&self, state: &Value) -> Result<Option<Seat>, SessionError> {
        Ok(Rules::seat_to_move(self, &decode(state)?))
    }

    fn play(&self, state: &mut Value, seat: Seat, payload: &str) -> Result<Option<Notice>, SessionError> {
        let mut typed: R::State = decode(state)?;
        let notice = Rules::play(self, &mut typed, seat, payload)?;
        *state = serde_json::to_value(typed)?;
        Ok(notice)
    }

    fn render(&self, state: &Value, table: &Table, labels: &dyn Labels) -> Result<Screen, SessionError> {
        Ok(Rules::render(self, &decode(state)?, table, labels))
    }
}

/// Game kind → engine, built once at startup and handed to the session manager.
#[derive(Default)]
pub struct Registry {
    engines: HashMap<GameKind, Box<dyn Engine>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every shipped engine.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry
            .register(Box::new(Checkers::new(GameKind::Checkers, RuleSet::checkers())))
            .register(Box::new(Checkers::new(GameKind::PoolCheckers, RuleSet::pool())));
        registry
    }

    pub fn register(&mut self, engine: Box<dyn Engine>) -> &mut Self {
        self.engines.insert(engine.kind(), engine);
        self
    }

    pub fn get(&self, kind: GameKind) -> Option<&dyn Engine> {
        self.engines.get(&kind).map(|e| e.as_ref())
    }
}
