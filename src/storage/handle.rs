//! Shared connection handle
//!
//! One [`SqliteStore`] per process, opened off the calling thread the first
//! time anyone needs it. Callers that arrive before the store is ready block
//! on a readiness gate; once it is ready every operation runs under a single
//! mutex, so mutations are linearized and a query issued after a mutation
//! returns sees it.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Once, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use super::schema::SeedPolicy;
use super::sqlite::SqliteStore;
use crate::{Error, Result};

/// Opens (and seeds) the backing store. Runs once, on the init thread.
pub type StoreFactory = Box<dyn FnOnce() -> Result<SqliteStore> + Send + 'static>;

enum InitState {
    Pending,
    Ready(Arc<Mutex<SqliteStore>>),
    Failed(String),
}

/// One-shot readiness gate shared with the init thread.
struct Gate {
    state: Mutex<InitState>,
    changed: Condvar,
}

impl Gate {
    fn new(state: InitState) -> Self {
        Self {
            state: Mutex::new(state),
            changed: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move out of `Pending`; later calls are ignored.
    fn finish(&self, outcome: Result<SqliteStore>) {
        let mut state = self.lock();
        if !matches!(*state, InitState::Pending) {
            return;
        }
        *state = match outcome {
            Ok(store) => {
                tracing::info!("store ready");
                InitState::Ready(Arc::new(Mutex::new(store)))
            }
            Err(e) => {
                tracing::error!(error = %e, "store initialization failed");
                match e {
                    Error::StoreUnavailable(msg) => InitState::Failed(msg),
                    other => InitState::Failed(other.to_string()),
                }
            }
        };
        self.changed.notify_all();
    }

    fn wait(&self, timeout: Option<Duration>) -> Result<Arc<Mutex<SqliteStore>>> {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut state = self.lock();
        loop {
            match &*state {
                InitState::Ready(store) => return Ok(Arc::clone(store)),
                InitState::Failed(msg) => return Err(Error::StoreUnavailable(msg.clone())),
                InitState::Pending => {}
            }

            state = match deadline {
                None => self.changed.wait(state).unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::StoreUnavailable(format!(
                            "timed out after {:?} waiting for the store",
                            timeout.unwrap_or_default()
                        )));
                    }
                    self.changed
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner)
                        .0
                }
            };
        }
    }
}

/// Lazily initialized, serialized access point to the backing store.
pub struct ConnectionHandle {
    gate: Arc<Gate>,
    factory: Mutex<Option<StoreFactory>>,
    started: Once,
    ready_timeout: Option<Duration>,
}

impl ConnectionHandle {
    /// Create a handle; nothing is opened until [`start`](Self::start) or the first operation.
    pub fn new(factory: StoreFactory) -> Self {
        Self {
            gate: Arc::new(Gate::new(InitState::Pending)),
            factory: Mutex::new(Some(factory)),
            started: Once::new(),
            ready_timeout: None,
        }
    }

    /// Handle over a store that is already open
    pub fn ready(store: SqliteStore) -> Self {
        let handle = Self {
            gate: Arc::new(Gate::new(InitState::Ready(Arc::new(Mutex::new(store))))),
            factory: Mutex::new(None),
            started: Once::new(),
            ready_timeout: None,
        };
        handle.started.call_once(|| {});
        handle
    }

    /// File-backed store with the baseline schema, seeded per `seed`
    pub fn open(path: impl Into<PathBuf>, seed: SeedPolicy) -> Self {
        let path = path.into();
        Self::new(Box::new(move || {
            let store = SqliteStore::open(&path)?;
            store.seed(seed)?;
            Ok(store)
        }))
    }

    /// In-memory store with the baseline schema, seeded per `seed`
    pub fn open_in_memory(seed: SeedPolicy) -> Self {
        Self::new(Box::new(move || {
            let store = SqliteStore::open_in_memory()?;
            store.seed(seed)?;
            Ok(store)
        }))
    }

    /// Give up waiting for initialization after `timeout`.
    pub fn with_ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    /// Kick off initialization on a background thread. Idempotent; returns immediately.
    pub fn start(&self) {
        self.started.call_once(|| {
            let factory = self
                .factory
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            let Some(factory) = factory else {
                self.gate
                    .finish(Err(Error::StoreUnavailable("no store factory".to_string())));
                return;
            };

            let gate = Arc::clone(&self.gate);
            let spawned = thread::Builder::new()
                .name("store-init".to_string())
                .spawn(move || {
                    let outcome = panic::catch_unwind(AssertUnwindSafe(factory)).unwrap_or_else(|_| {
                        Err(Error::StoreUnavailable("store factory panicked".to_string()))
                    });
                    gate.finish(outcome);
                });

            if let Err(e) = spawned {
                self.gate.finish(Err(Error::StoreUnavailable(format!(
                    "could not spawn init thread: {}",
                    e
                ))));
            }
        });
    }

    /// Whether initialization has completed, successfully or not
    pub fn is_settled(&self) -> bool {
        !matches!(*self.gate.lock(), InitState::Pending)
    }

    /// Block until the store is ready (starting it if needed).
    pub fn wait_ready(&self) -> Result<()> {
        self.start();
        self.gate.wait(self.ready_timeout).map(drop)
    }

    /// Run `f` against the store while holding the store lock.
    ///
    /// Every access goes through here, so at most one operation touches the
    /// connection at a time.
    pub fn with_store<T>(&self, f: impl FnOnce(&SqliteStore) -> Result<T>) -> Result<T> {
        self.start();
        let store = self.gate.wait(self.ready_timeout)?;
        let guard = store.lock().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}
