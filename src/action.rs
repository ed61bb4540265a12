use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Game families known to the bot, by their wire code.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum GameKind {
    #[serde(rename = "ck")]
    Checkers,
    #[serde(rename = "pc")]
    PoolCheckers,
}

impl GameKind {
    pub const ALL: [GameKind; 2] = [GameKind::Checkers, GameKind::PoolCheckers];

    pub fn code(self) -> &'static str {
        match self {
            GameKind::Checkers => "ck",
            GameKind::PoolCheckers => "pc",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for GameKind {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameKind::ALL.iter()
            .copied()
            .find(|k| k.code() == s)
            .ok_or_else(|| SessionError::UnknownGameKind(s.to_owned()))
    }
}

/// Verbs of the shared lobby state machine; `Game` carries the engine payload.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Verb {
    New,
    Join,
    Quit,
    Kick,
    Start,
    Game(String),
}

/// A parsed `"<code>;<verb>[;<payload>]"` token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Action {
    pub kind: GameKind,
    pub verb: Verb,
}

impl FromStr for Action {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || SessionError::MalformedAction(s.to_owned());
        let mut parts = s.splitn(3, ';');
        let kind = parts.next().ok_or_else(malformed)?.parse()?;
        let verb = match (parts.next(), parts.next()) {
            (Some("new"), None) => Verb::New,
            (Some("join"), None) => Verb::Join,
            (Some("quit"), None) => Verb::Quit,
            (Some("kick"), None) => Verb::Kick,
            (Some("start"), None) => Verb::Start,
            (Some("game"), Some(payload)) if !payload.is_empty() => Verb::Game(payload.to_owned()),
            _ => return Err(malformed()),
        };
        Ok(Action { kind, verb })
    }
}
