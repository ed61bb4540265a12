use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use inline_games::game::{Seat, Table};
use inline_games::keyboard::{Keyboard, Labels, Notice, Screen};
use inline_games::store::LockToken;
use inline_games::{
    FileStore, GameKind, MemoryStore, Player, Record, Registry, Rules, SessionError, SessionManager, SessionStore,
    StoreError, ValidationError,
};

/// Counts presses, so a lost update shows up as a short tally.
struct Tally;

impl Rules for Tally {
    type State = u64;

    fn kind(&self) -> GameKind {
        GameKind::PoolCheckers
    }

    fn title(&self) -> &str {
        "Tally"
    }

    fn start(&self, _previous: Option<u64>) -> u64 {
        0
    }

    fn is_over(&self, _state: &u64) -> bool {
        false
    }

    fn seat_to_move(&self, _state: &u64) -> Option<Seat> {
        Some(Seat::Host)
    }

    fn play(&self, state: &mut u64, _seat: Seat, payload: &str) -> Result<Option<Notice>, ValidationError> {
        match payload {
            "+" => {
                let seen = *state;
                thread::sleep(Duration::from_millis(1));
                *state = seen + 1;
                Ok(None)
            }
            "boom" => panic!("tally exploded"),
            _ => Err(ValidationError::UnknownCommand),
        }
    }

    fn render(&self, state: &u64, _table: &Table, _labels: &dyn Labels) -> Screen {
        Screen { text: state.to_string(), keyboard: Keyboard::new() }
    }
}

fn registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(Box::new(Tally));
    registry
}

fn seat_players(manager: &SessionManager) {
    let p1 = Player::new("1", "alice");
    manager.handle("s", "pc;join", &p1).unwrap();
    manager.handle("s", "pc;join", &Player::new("2", "bob")).unwrap();
    manager.handle("s", "pc;start", &p1).unwrap();
}

fn hammer(managers: Vec<Arc<SessionManager>>, threads: usize, presses: usize) -> u64 {
    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let manager = managers[i % managers.len()].clone();
            thread::spawn(move || {
                let alice = Player::new("1", "alice");
                let mut applied = 0;
                for _ in 0..presses {
                    match manager.handle("s", "pc;game;+", &alice) {
                        Ok(_) => applied += 1,
                        Err(SessionError::Busy(_)) => thread::yield_now(),
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                }
                applied
            })
        })
        .collect();
    handles.into_iter().map(|h| h.join().unwrap()).sum()
}

#[test]
fn memory_store_serializes_presses() {
    let store = Arc::new(MemoryStore::new());
    let manager = Arc::new(SessionManager::new(store.clone(), registry()));
    seat_players(&manager);

    let applied = hammer(vec![manager], 8, 25);
    assert!(applied > 0);
    let record = store.get("s").unwrap().unwrap();
    assert_eq!(record.game_state, Some(serde_json::json!(applied)));
}

#[test]
fn file_stores_sharing_a_directory_serialize_presses() {
    let dir = tempfile::tempdir().unwrap();
    let managers: Vec<_> = (0..2)
        .map(|_| {
            let store: Arc<dyn SessionStore> = Arc::new(FileStore::open(dir.path()).unwrap());
            Arc::new(SessionManager::new(store, registry()))
        })
        .collect();
    seat_players(&managers[0]);

    let applied = hammer(managers, 6, 15);
    assert!(applied > 0);
    let reader = FileStore::open(dir.path()).unwrap();
    let record = reader.get("s").unwrap().unwrap();
    assert_eq!(record.game_state, Some(serde_json::json!(applied)));
}

#[test]
fn held_lock_turns_presses_away() {
    let store = Arc::new(MemoryStore::new());
    let manager = SessionManager::new(store.clone(), registry());
    seat_players(&manager);
    let before = store.get("s").unwrap();

    assert!(store.try_lock("s", Duration::from_secs(60)).unwrap().is_some());
    let reply = manager.receive_action("s", "pc;game;+", &Player::new("1", "alice"));
    assert_eq!(reply.notice, Some(Notice::toast("Busy, try again in a moment.")));
    assert!(reply.screen.is_none());
    assert_eq!(store.get("s").unwrap(), before);
}

#[test]
fn expired_lock_is_broken() {
    let store = Arc::new(MemoryStore::new());
    let manager = SessionManager::new(store.clone(), registry()).with_lock_ttl(Duration::from_millis(20));
    seat_players(&manager);

    assert!(store.try_lock("s", Duration::from_millis(20)).unwrap().is_some());
    thread::sleep(Duration::from_millis(50));
    manager.handle("s", "pc;game;+", &Player::new("1", "alice")).unwrap();
    assert_eq!(store.get("s").unwrap().unwrap().game_state, Some(serde_json::json!(1)));
}

#[test]
fn engine_panic_is_contained() {
    let store = Arc::new(MemoryStore::new());
    let manager = SessionManager::new(store.clone(), registry());
    seat_players(&manager);
    let before = store.get("s").unwrap();

    let alice = Player::new("1", "alice");
    let err = manager.handle("s", "pc;game;boom", &alice).unwrap_err();
    assert!(matches!(err, SessionError::EngineCrash(ref message) if message == "tally exploded"));
    assert_eq!(store.get("s").unwrap(), before);

    // the lock was released while unwinding
    manager.handle("s", "pc;game;+", &alice).unwrap();
    assert_eq!(store.get("s").unwrap().unwrap().game_state, Some(serde_json::json!(1)));
}

/// A memory store whose disk has gone away.
struct BrokenStore {
    inner: MemoryStore,
    reads_fail: bool,
}

fn disk_error() -> StoreError {
    StoreError::Io(io::Error::new(io::ErrorKind::Other, "disk unavailable"))
}

impl SessionStore for BrokenStore {
    fn get(&self, id: &str) -> Result<Option<Record>, StoreError> {
        if self.reads_fail {
            return Err(disk_error());
        }
        self.inner.get(id)
    }

    fn put(&self, _id: &str, _record: &Record) -> Result<(), StoreError> {
        Err(disk_error())
    }

    fn create(&self, host: &Player, kind: GameKind) -> Result<String, StoreError> {
        self.inner.create(host, kind)
    }

    fn try_lock(&self, id: &str, ttl: Duration) -> Result<Option<LockToken>, StoreError> {
        self.inner.try_lock(id, ttl)
    }

    fn unlock(&self, id: &str, token: &LockToken) -> Result<(), StoreError> {
        self.inner.unlock(id, token)
    }
}

#[test]
fn storage_failure_aborts_the_transition() {
    for &reads_fail in &[false, true] {
        let store = Arc::new(BrokenStore { inner: MemoryStore::new(), reads_fail });
        let manager = SessionManager::new(store.clone(), Registry::standard());
        let alice = Player::new("1", "alice");

        let err = manager.handle("s", "ck;join", &alice).unwrap_err();
        assert!(matches!(err, SessionError::Storage(StoreError::Io(_))));
        assert!(err.is_operational());

        let reply = manager.receive_action("s", "ck;join", &alice);
        assert!(reply.notice.unwrap().alert);
        assert!(reply.screen.is_none());

        assert!(store.inner.get("s").unwrap().is_none());
        assert!(store.try_lock("s", Duration::from_secs(60)).unwrap().is_some());
    }
}
