use thiserror::Error;

use crate::keyboard::Notice;

/// Rule violations. Always answered to the presser, never persisted.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ValidationError {
    // lobby
    #[error("Only the host can do that.")]
    NotHost,
    #[error("You are already in this game.")]
    AlreadySeated,
    #[error("The game is full.")]
    GameFull,
    #[error("You are not in this game.")]
    NotSeated,
    #[error("There is nobody to kick.")]
    NoGuest,
    #[error("Waiting for a second player.")]
    NotEnoughPlayers,
    #[error("The game is already running.")]
    GameInProgress,
    #[error("The game has not started yet.")]
    NotStarted,
    #[error("You are not playing in this game.")]
    NotAPlayer,
    #[error("This button belongs to another game.")]
    StaleButton,
    // in game
    #[error("Pick one of your pieces that can move.")]
    InvalidSelection,
    #[error("That piece cannot move there.")]
    InvalidMove,
    #[error("You must jump when possible.")]
    MustCapture,
    #[error("It is not your turn.")]
    NotYourTurn,
    #[error("The game is over.")]
    GameEnded,
    #[error("Unknown command.")]
    UnknownCommand,
}

/// Failures of the session store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("invalid session id: {0:?}")]
    InvalidId(String),
}

/// Everything that can go wrong while handling one button press.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("unknown game kind: {0:?}")]
    UnknownGameKind(String),
    #[error("malformed action: {0:?}")]
    MalformedAction(String),
    #[error("session {0} is busy")]
    Busy(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StoreError),
    #[error("corrupt game state: {0}")]
    CorruptState(#[from] serde_json::Error),
    #[error("engine crashed: {0}")]
    EngineCrash(String),
}

impl SessionError {
    /// Whether the failure belongs in operator logs rather than only in a user notice.
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            SessionError::Storage(_) | SessionError::CorruptState(_) | SessionError::EngineCrash(_)
        )
    }

    /// The user-visible answer for this failure.
    pub fn notice(&self) -> Notice {
        match self {
            SessionError::Validation(e) => Notice::toast(e.to_string()),
            SessionError::Busy(_) => Notice::toast("Busy, try again in a moment."),
            SessionError::UnknownGameKind(_) | SessionError::MalformedAction(_) => {
                Notice::toast("This button is not supported anymore.")
            }
            SessionError::Storage(_) => Notice::alert("Something went wrong, please try again later."),
            SessionError::CorruptState(_) | SessionError::EngineCrash(_) => {
                Notice::alert("A critical error occurred in this game.")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
