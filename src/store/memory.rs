use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::warn;

use crate::action::GameKind;
use crate::error::StoreError;
use crate::game::Player;
use super::{lock, new_session_id, LockToken, Record, SessionStore};

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Record>>,
    locks: Mutex<HashMap<String, (LockToken, Instant)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        Ok(lock(&self.records).get(id).cloned())
    }

    fn put(&self, id: &str, record: &Record) -> Result<(), StoreError> {
        let mut record = record.clone();
        record.updated_at = Utc::now();
        lock(&self.records).insert(id.to_owned(), record);
        Ok(())
    }

    fn create(&self, host: &Player, kind: GameKind) -> Result<String, StoreError> {
        let mut records = lock(&self.records);
        let mut id = new_session_id();
        while records.contains_key(&id) {
            id = new_session_id();
        }
        records.insert(id.clone(), Record::hosted_by(host.clone(), kind));
        Ok(id)
    }

    fn try_lock(&self, id: &str, ttl: Duration) -> Result<Option<LockToken>, StoreError> {
        let mut locks = lock(&self.locks);
        let now = Instant::now();
        if let Some((_, taken)) = locks.get(id) {
            if now.duration_since(*taken) < ttl {
                return Ok(None);
            }
            warn!(session = id, "breaking expired session lock");
        }
        let token = LockToken::generate();
        locks.insert(id.to_owned(), (token.clone(), now));
        Ok(Some(token))
    }

    fn unlock(&self, id: &str, token: &LockToken) -> Result<(), StoreError> {
        let mut locks = lock(&self.locks);
        if locks.get(id).map_or(false, |(held, _)| held == token) {
            locks.remove(id);
        } else {
            warn!(session = id, "session lock was broken while held");
        }
        Ok(())
    }
}
