//! Client-side state store
//!
//! The store follows the reducer pattern:
//! - Actions: what can happen (`actions.rs`)
//! - State: what is true right now (`state.rs`, one slice per concern)
//! - Reducer: pure function `(State, Action) -> State` (`reducer.rs`)
//!
//! A [`Store`] is constructed explicitly and handed to whatever owns the
//! application lifecycle; there is no global instance. Clones share the same
//! state. All mutation goes through [`Store::dispatch`]; readers take
//! immutable [`Arc<AppState>`] snapshots and may [`subscribe`](Store::subscribe)
//! to be told when to re-read.
//!
//! # Example
//!
//! ```no_run
//! use libwayfarer::store::{Action, Store, Tab};
//!
//! # async fn example() -> libwayfarer::Result<()> {
//! let config = libwayfarer::Config::load()?;
//! let store = Store::open(&config).await?;
//!
//! let subscription = store.subscribe(|state| {
//!     println!("active tab: {}", state.tab.active_tab);
//! });
//!
//! store.dispatch(Action::SelectTab(Tab::Explore));
//! subscription.unsubscribe();
//!
//! // Make sure the write reached storage before exiting
//! store.flush().await;
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod auth;
pub mod middleware;
pub mod reducer;
pub mod state;
pub mod tab;

pub use actions::{
    Action, ActionType, AuthStatusPayload, FailurePayload, LoginPayload, UserProfile,
};
pub use auth::AuthState;
pub use middleware::{LoggingMiddleware, Middleware, Next};
pub use reducer::{reduce, RootReducer, Slice};
pub use state::AppState;
pub use tab::{Tab, TabState};

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::{Config, PersistSettings};
use crate::error::Result;
use crate::persist::{open_storage, MemoryStorage, PersistWriter, Storage};

type Listener = Arc<dyn Fn(&AppState) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    state: RwLock<Arc<AppState>>,
    /// Serializes reduce-and-replace
    dispatch_lock: Mutex<()>,
    reducer: RootReducer,
    middleware: Vec<Box<dyn Middleware>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    storage: Option<Arc<dyn Storage>>,
    writer: Option<PersistWriter>,
    /// Writes are only queued once stored slices have been read back
    rehydrated: AtomicBool,
    ready: watch::Sender<bool>,
}

/// Handle to the application state container
#[derive(Clone)]
pub struct Store {
    inner: Arc<Inner>,
}

/// Builder for [`Store`]
pub struct StoreBuilder {
    storage: Option<Arc<dyn Storage>>,
    persist: PersistSettings,
    middleware: Vec<Box<dyn Middleware>>,
}

impl StoreBuilder {
    /// Persist slices to `storage` and rehydrate from it on build
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Per-slice persistence options (defaults to [`PersistSettings::default`])
    pub fn persist(mut self, persist: PersistSettings) -> Self {
        self.persist = persist;
        self
    }

    /// Append a middleware; middleware runs in the order it was added
    pub fn middleware(mut self, middleware: impl Middleware + 'static) -> Self {
        self.middleware.push(Box::new(middleware));
        self
    }

    /// Build the store
    ///
    /// With storage configured, rehydration and the persistence writer are
    /// spawned on the current tokio runtime, so this must be called from
    /// within one. Await [`Store::ready`] before relying on restored state.
    ///
    /// # Errors
    ///
    /// Returns an error if a whitelist names a field the slice does not have.
    pub fn build(self) -> Result<Store> {
        let reducer = match self.storage {
            Some(_) => RootReducer::new(&self.persist)?,
            None => RootReducer::unpersisted(),
        };
        let persistent = self.storage.is_some();
        let writer = self.storage.clone().map(PersistWriter::spawn);
        let (ready, _) = watch::channel(!persistent);

        let store = Store {
            inner: Arc::new(Inner {
                state: RwLock::new(Arc::new(AppState::default())),
                dispatch_lock: Mutex::new(()),
                reducer,
                middleware: self.middleware,
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                storage: self.storage.clone(),
                writer,
                rehydrated: AtomicBool::new(!persistent),
                ready,
            }),
        };

        if let Some(storage) = self.storage {
            let handle = store.clone();
            tokio::spawn(async move { handle.rehydrate(storage).await });
        }

        Ok(store)
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// In-memory store without persistence; ready immediately
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                state: RwLock::new(Arc::new(AppState::default())),
                dispatch_lock: Mutex::new(()),
                reducer: RootReducer::unpersisted(),
                middleware: Vec::new(),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                storage: None,
                writer: None,
                rehydrated: AtomicBool::new(true),
                ready: watch::channel(true).0,
            }),
        }
    }

    pub fn builder() -> StoreBuilder {
        StoreBuilder {
            storage: None,
            persist: PersistSettings::default(),
            middleware: Vec::new(),
        }
    }

    /// Open the configured storage, build a logging store and wait for
    /// rehydration to finish
    ///
    /// If the storage backend cannot be opened, the store runs on process
    /// memory instead: it starts from defaults (logged out) and nothing it
    /// holds survives the process.
    ///
    /// # Errors
    ///
    /// Returns an error only for invalid persistence settings.
    pub async fn open(config: &Config) -> Result<Self> {
        let storage: Arc<dyn Storage> = match open_storage(&config.storage).await {
            Ok(storage) => storage,
            Err(e) => {
                tracing::warn!(
                    backend = ?config.storage.backend,
                    path = %config.storage.path,
                    error = %e,
                    "Storage unavailable; state will not be persisted"
                );
                Arc::new(MemoryStorage::new())
            }
        };
        let store = Self::builder()
            .storage(storage)
            .persist(config.persist.clone())
            .middleware(LoggingMiddleware)
            .build()?;
        store.ready().await;
        Ok(store)
    }

    /// Current state snapshot
    pub fn get_state(&self) -> Arc<AppState> {
        let state = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&state)
    }

    /// Apply `action` and notify subscribers
    ///
    /// Runs synchronously: when this returns, [`get_state`](Self::get_state)
    /// reflects the action. Persistence writes are queued but not awaited.
    /// Returns the action unchanged.
    pub fn dispatch(&self, action: Action) -> Action {
        let current = self.get_state();
        for middleware in &self.inner.middleware {
            if middleware.before_dispatch(&action, &current) == Next::Stop {
                tracing::debug!(action = action.type_name(), "Dispatch stopped by middleware");
                return action;
            }
        }

        let snapshot = {
            let _guard = lock(&self.inner.dispatch_lock);
            let current = self.get_state();
            let reduction = self.inner.reducer.reduce(&current, &action);
            let has_writes = reduction.has_writes();
            let next = Arc::new(reduction.state);
            self.replace_state(Arc::clone(&next));

            if has_writes && self.inner.rehydrated.load(Ordering::SeqCst) {
                if let Some(writer) = &self.inner.writer {
                    for write in reduction.writes {
                        writer.submit(write);
                    }
                }
            }
            next
        };

        for middleware in &self.inner.middleware {
            middleware.after_dispatch(&action, &snapshot);
        }
        self.notify(&snapshot);
        action
    }

    /// Register `listener`, called after every dispatch and after rehydration
    ///
    /// Listeners run synchronously, in registration order. They may read or
    /// dispatch; a dispatch from a listener triggers its own notification
    /// round.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&AppState) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.inner.listeners).push((id, Arc::new(listener)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Run an asynchronous side effect that may dispatch follow-up actions
    ///
    /// The thunk is spawned on the tokio runtime and receives a
    /// [`Dispatcher`]. Its own dispatches apply in the order it issues them;
    /// no ordering is promised between separate thunks.
    pub fn dispatch_thunk<F, Fut>(&self, thunk: F) -> JoinHandle<Fut::Output>
    where
        F: FnOnce(Dispatcher) -> Fut,
        Fut: Future + Send + 'static,
        Fut::Output: Send + 'static,
    {
        tokio::spawn(thunk(self.dispatcher()))
    }

    /// Narrowed handle that can only read and dispatch
    pub fn dispatcher(&self) -> Dispatcher {
        Dispatcher {
            store: self.clone(),
        }
    }

    /// Whether persisted slices have been restored
    pub fn is_ready(&self) -> bool {
        *self.inner.ready.borrow()
    }

    /// Wait until persisted slices have been restored
    pub async fn ready(&self) {
        let mut receiver = self.inner.ready.subscribe();
        let _ = receiver.wait_for(|ready| *ready).await;
    }

    /// Wait until every queued persistence write has been attempted
    pub async fn flush(&self) {
        if let Some(writer) = &self.inner.writer {
            writer.flush().await;
        }
    }

    /// Delete every persisted slice from storage
    ///
    /// In-memory state is left as is. Pending writes are flushed first so
    /// they cannot land after the purge.
    pub async fn purge(&self) -> Result<()> {
        let Some(storage) = &self.inner.storage else {
            return Ok(());
        };
        self.flush().await;

        let reducer = &self.inner.reducer;
        for (key, enabled) in [
            (reducer.auth.key(), reducer.auth.is_enabled()),
            (reducer.tab.key(), reducer.tab.is_enabled()),
        ] {
            if enabled {
                storage.remove_item(key).await?;
            }
        }
        tracing::info!(backend = storage.backend_name(), "Purged persisted state");
        Ok(())
    }

    fn replace_state(&self, next: Arc<AppState>) {
        *self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn notify(&self, state: &AppState) {
        let listeners: Vec<Listener> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(state);
        }
    }

    async fn rehydrate(&self, storage: Arc<dyn Storage>) {
        let reducer = &self.inner.reducer;
        let (auth, tab) = futures::join!(
            reducer.auth.rehydrate(storage.as_ref()),
            reducer.tab.rehydrate(storage.as_ref())
        );

        let snapshot = {
            let _guard = lock(&self.inner.dispatch_lock);
            let mut next = (*self.get_state()).clone();
            let mut writes = Vec::new();

            // Slices with nothing stored keep their in-memory value, which
            // may come from a dispatch made before rehydration. Write it out
            // unless it is still the default.
            match auth {
                Some(auth) => next.auth = auth,
                None => writes.extend(
                    reducer
                        .auth
                        .after_transition(&AuthState::default(), &next.auth),
                ),
            }
            match tab {
                Some(tab) => next.tab = tab,
                None => writes.extend(
                    reducer
                        .tab
                        .after_transition(&TabState::default(), &next.tab),
                ),
            }

            let next = Arc::new(next);
            self.replace_state(Arc::clone(&next));
            self.inner.rehydrated.store(true, Ordering::SeqCst);
            if let Some(writer) = &self.inner.writer {
                for write in writes {
                    writer.submit(write);
                }
            }
            next
        };

        tracing::debug!(
            backend = storage.backend_name(),
            logged_in = snapshot.auth.is_logged_in,
            tab = %snapshot.tab.active_tab,
            "Store rehydrated"
        );
        self.notify(&snapshot);
        self.inner.ready.send_replace(true);
    }
}

/// Registration returned by [`Store::subscribe`]
///
/// Dropping it keeps the listener registered; call
/// [`unsubscribe`](Self::unsubscribe) to remove it.
pub struct Subscription {
    id: u64,
    inner: Weak<Inner>,
}

impl Subscription {
    /// Remove the listener; returns false if it was already gone
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.inner.upgrade() else {
            return false;
        };
        let mut listeners = lock(&inner.listeners);
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != self.id);
        listeners.len() != before
    }
}

/// Read-and-dispatch view of a [`Store`], handed to thunks
#[derive(Clone)]
pub struct Dispatcher {
    store: Store,
}

impl Dispatcher {
    pub fn dispatch(&self, action: Action) -> Action {
        self.store.dispatch(action)
    }

    pub fn get_state(&self) -> Arc<AppState> {
        self.store.get_state()
    }
}
