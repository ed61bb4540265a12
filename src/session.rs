use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::action::{Action, GameKind};
use crate::config::Config;
use crate::engine::{Engine, Registry};
use crate::error::{SessionError, ValidationError};
use crate::game::Player;
use crate::keyboard::{DefaultLabels, Labels, Notice, Screen};
use crate::lobby::{self, Policy};
use crate::store::{LockGuard, Record, SessionStore};

/// What the gateway should do after a button press.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Reply {
    pub notice: Option<Notice>,
    pub screen: Option<Screen>,
}

impl Reply {
    pub fn notice(notice: Notice) -> Self {
        Self { notice: Some(notice), screen: None }
    }
}

/// Serializes button presses per session and runs them through the lobby and the engines.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    registry: Registry,
    labels: Box<dyn Labels>,
    policy: Policy,
    lock_ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, registry: Registry) -> Self {
        Self {
            store,
            registry,
            labels: Box::new(DefaultLabels),
            policy: Policy::default(),
            lock_ttl: Duration::from_secs(10),
        }
    }

    pub fn from_config(store: Arc<dyn SessionStore>, registry: Registry, config: &Config) -> Self {
        Self::new(store, registry)
            .with_policy(Policy { allow_self_play: config.allow_self_play })
            .with_lock_ttl(config.lock_ttl)
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Duration) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    pub fn with_labels(mut self, labels: Box<dyn Labels>) -> Self {
        self.labels = labels;
        self
    }

    fn engine(&self, kind: GameKind) -> Result<&dyn Engine, SessionError> {
        self.registry.get(kind).ok_or_else(|| SessionError::UnknownGameKind(kind.code().to_owned()))
    }

    /// The screen of a session nobody has touched yet.
    pub fn preview(&self, kind: GameKind) -> Result<Screen, SessionError> {
        lobby::render(&Record::new(kind), self.engine(kind)?, self.labels.as_ref())
    }

    /// Opens a lobby hosted by `host` under a fresh session id.
    pub fn open(&self, kind: GameKind, host: &Player) -> Result<(String, Screen), SessionError> {
        let engine = self.engine(kind)?;
        let id = self.store.create(host, kind)?;
        let record = Record::hosted_by(host.clone(), kind);
        Ok((id, lobby::render(&record, engine, self.labels.as_ref())?))
    }

    /// Handles one button press: lock, load, transition, persist, unlock.
    pub fn handle(&self, session_id: &str, token: &str, actor: &Player) -> Result<Reply, SessionError> {
        let action: Action = token.parse()?;
        let engine = self.engine(action.kind)?;

        let _guard = match LockGuard::try_acquire(self.store.as_ref(), session_id, self.lock_ttl)? {
            Some(guard) => guard,
            None => {
                debug!(session = session_id, "session busy");
                return Err(SessionError::Busy(session_id.to_owned()));
            }
        };

        let mut record = self.store.get(session_id)?.unwrap_or_else(|| Record::new(action.kind));
        if record.game_kind != action.kind {
            return Err(ValidationError::StaleButton.into());
        }

        let policy = self.policy;
        let notice = panic::catch_unwind(AssertUnwindSafe(|| {
            lobby::transition(&mut record, engine, &action.verb, actor, policy)
        })).map_err(|cause| {
            let message = cause.downcast_ref::<&str>().map(|s| s.to_string())
                .or_else(|| cause.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            SessionError::EngineCrash(message)
        })??;

        self.store.put(session_id, &record)?;
        debug!(session = session_id, actor = %actor.id, verb = ?action.verb, "transition applied");

        let screen = lobby::render(&record, engine, self.labels.as_ref())?;
        Ok(Reply { notice, screen: Some(screen) })
    }

    /// Like [`handle`](Self::handle), but folds every failure into a notice for the presser.
    pub fn receive_action(&self, session_id: &str, token: &str, actor: &Player) -> Reply {
        match self.handle(session_id, token, actor) {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_operational() {
                    error!(session = session_id, token, error = %e, "failed to handle action");
                } else if let SessionError::Busy(_) = e {
                    warn!(session = session_id, token, "dropped press on busy session");
                }
                Reply::notice(e.notice())
            }
        }
    }
}
