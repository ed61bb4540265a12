//! Two-player board games played through edits of a single chat message.
//!
//! Every button press arrives as an action token (`"ck;game;5-2"`), is
//! serialized per session by [`session::SessionManager`], runs through the
//! shared lobby in [`lobby`] and ends up in a game engine such as
//! [`checkers::Checkers`].

pub mod action;
pub mod checkers;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod keyboard;
pub mod lobby;
pub mod session;
pub mod store;

pub use crate::action::{Action, GameKind, Verb};
pub use crate::config::Config;
pub use crate::engine::{Engine, Registry, Rules};
pub use crate::error::{SessionError, StoreError, ValidationError};
pub use crate::game::Player;
pub use crate::session::{Reply, SessionManager};
pub use crate::store::{FileStore, LockToken, MemoryStore, Record, SessionStore};
