//! Reducer composition
//!
//! Each slice of [`AppState`] has its own pure reducer, exposed through the
//! [`Slice`] trait. [`RootReducer`] runs every slice reducer on its named
//! field and reassembles the aggregate. Every action is offered to every
//! slice; a slice that does not recognize an action returns its state
//! unchanged.
//!
//! The reducer has NO side effects. Persistence is expressed as data: the
//! [`Reduction`] lists the slice writes the store should queue.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use super::actions::Action;
use super::auth::{reduce_auth, AuthState};
use super::state::AppState;
use super::tab::{reduce_tab, TabState};
use crate::config::PersistSettings;
use crate::error::Result;
use crate::persist::{PendingWrite, Persisted};

/// One named slice of the aggregate state
pub trait Slice {
    type State: Debug + Clone + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static;

    /// Slice name; also the storage key
    const KEY: &'static str;

    /// Pure transition function; an absent state means the slice default
    fn reduce(state: Option<Self::State>, action: &Action) -> Self::State;
}

#[derive(Debug, Clone, Copy)]
pub struct AuthSlice;

impl Slice for AuthSlice {
    type State = AuthState;
    const KEY: &'static str = "auth";

    fn reduce(state: Option<AuthState>, action: &Action) -> AuthState {
        reduce_auth(state, action)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TabSlice;

impl Slice for TabSlice {
    type State = TabState;
    const KEY: &'static str = "tab";

    fn reduce(state: Option<TabState>, action: &Action) -> TabState {
        reduce_tab(state, action)
    }
}

/// Result of running the root reducer
#[derive(Debug, Clone)]
pub struct Reduction {
    pub state: AppState,
    /// Writes for changed, persisted slices
    pub writes: Vec<PendingWrite>,
}

impl Reduction {
    pub fn has_writes(&self) -> bool {
        !self.writes.is_empty()
    }
}

/// Applies one slice reducer to its field, collecting its persistence write
fn apply<S: Slice>(
    persisted: &Persisted<S>,
    current: &S::State,
    action: &Action,
    writes: &mut Vec<PendingWrite>,
) -> S::State {
    let next = S::reduce(Some(current.clone()), action);
    writes.extend(persisted.after_transition(current, &next));
    next
}

/// Root reducer over [`AppState`], with each slice wrapped for persistence
#[derive(Debug, Clone)]
pub struct RootReducer {
    pub(crate) auth: Persisted<AuthSlice>,
    pub(crate) tab: Persisted<TabSlice>,
}

impl RootReducer {
    pub fn new(settings: &PersistSettings) -> Result<Self> {
        Ok(Self {
            auth: Persisted::new(&settings.auth)?,
            tab: Persisted::new(&settings.tab)?,
        })
    }

    /// Root reducer with persistence switched off for every slice
    pub fn unpersisted() -> Self {
        Self {
            auth: Persisted::disabled(),
            tab: Persisted::disabled(),
        }
    }

    /// Compute the next aggregate state for `action`
    pub fn reduce(&self, state: &AppState, action: &Action) -> Reduction {
        let mut writes = Vec::new();
        let next = AppState {
            auth: apply(&self.auth, &state.auth, action, &mut writes),
            tab: apply(&self.tab, &state.tab, action, &mut writes),
        };
        Reduction {
            state: next,
            writes,
        }
    }
}

/// Reduce without persistence
///
/// Convenience for callers that only need the pure state transition.
pub fn reduce(state: &AppState, action: &Action) -> AppState {
    AppState {
        auth: AuthSlice::reduce(Some(state.auth.clone()), action),
        tab: TabSlice::reduce(Some(state.tab.clone()), action),
    }
}
