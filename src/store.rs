use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::action::GameKind;
use crate::error::StoreError;
use crate::game::{Player, Table};

pub use self::file::FileStore;
pub use self::memory::MemoryStore;

mod file;
mod memory;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub host: Option<Player>,
    pub guest: Option<Player>,
    pub game_kind: GameKind,
    pub game_state: Option<Value>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    pub fn new(game_kind: GameKind) -> Self {
        Self {
            host: None,
            guest: None,
            game_kind,
            game_state: None,
            updated_at: Utc::now(),
        }
    }

    pub fn hosted_by(host: Player, game_kind: GameKind) -> Self {
        Self { host: Some(host), ..Self::new(game_kind) }
    }

    pub fn table(&self) -> Table {
        Table { host: self.host.clone(), guest: self.guest.clone() }
    }
}

pub trait SessionStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Record>, StoreError>;

    // stamps `updated_at`
    fn put(&self, id: &str, record: &Record) -> Result<(), StoreError>;

    fn create(&self, host: &Player, kind: GameKind) -> Result<String, StoreError>;

    /// Takes the lock without waiting. A lock older than `ttl` counts as free.
    fn try_lock(&self, id: &str, ttl: Duration) -> Result<Option<LockToken>, StoreError>;

    /// Releases the lock, unless it has since passed to another holder.
    fn unlock(&self, id: &str, token: &LockToken) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub fn new_session_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct LockToken(String);

impl LockToken {
    pub fn generate() -> Self {
        LockToken(new_session_id())
    }
}

pub struct LockGuard<'a> {
    store: &'a dyn SessionStore,
    id: &'a str,
    token: LockToken,
}

impl<'a> LockGuard<'a> {
    pub fn try_acquire(store: &'a dyn SessionStore, id: &'a str, ttl: Duration) -> Result<Option<Self>, StoreError> {
        Ok(store.try_lock(id, ttl)?.map(|token| LockGuard { store, id, token }))
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.store.unlock(self.id, &self.token) {
            warn!(session = self.id, error = %e, "failed to release session lock");
        }
    }
}
