use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use fs2::FileExt;
use tracing::{debug, warn};

use crate::action::GameKind;
use crate::error::StoreError;
use crate::game::Player;
use super::{lock, new_session_id, LockToken, Record, SessionStore};

/// One JSON file per session plus a `<id>.lock` file carrying an OS lock.
///
/// Every process sharing the directory contends for the same exclusive file
/// lock. The OS releases it when the holder's process dies, so lock files
/// never expire and are never deleted.
pub struct FileStore {
    dir: PathBuf,
    held: Mutex<HashMap<String, (LockToken, File)>>,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, held: Mutex::new(HashMap::new()) })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, id: &str, extension: &str) -> Result<PathBuf, StoreError> {
        let valid = !id.is_empty()
            && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':');
        if !valid {
            return Err(StoreError::InvalidId(id.to_owned()));
        }
        // ':' is not portable in file names; '%' never occurs in a valid id
        Ok(self.dir.join(format!("{}.{}", id.replace(':', "%3A"), extension)))
    }
}

impl SessionStore for FileStore {
    fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        match fs::read(self.path(id, "json")?) {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, id: &str, record: &Record) -> Result<(), StoreError> {
        let path = self.path(id, "json")?;
        let mut record = record.clone();
        record.updated_at = Utc::now();
        let bytes = serde_json::to_vec(&record)?;

        // readers never see a half-written record
        let tmp = self.dir.join(format!(".{}.tmp", new_session_id()));
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn create(&self, host: &Player, kind: GameKind) -> Result<String, StoreError> {
        let record = serde_json::to_vec(&Record::hosted_by(host.clone(), kind))?;
        loop {
            let id = new_session_id();
            let path = self.path(&id, "json")?;
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(&record)?;
                    debug!(session = %id, kind = %kind, "created session");
                    return Ok(id);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn try_lock(&self, id: &str, _ttl: Duration) -> Result<Option<LockToken>, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(self.path(id, "lock")?)?;
        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Ok(None);
            }
            return Err(e.into());
        }
        let token = LockToken::generate();
        lock(&self.held).insert(id.to_owned(), (token.clone(), file));
        Ok(Some(token))
    }

    fn unlock(&self, id: &str, token: &LockToken) -> Result<(), StoreError> {
        let mut held = lock(&self.held);
        if !held.get(id).map_or(false, |(owner, _)| owner == token) {
            warn!(session = id, "unlock with a token that does not hold the lock");
            return Ok(());
        }
        if let Some((_, file)) = held.remove(id) {
            file.unlock()?;
        }
        Ok(())
    }
}
