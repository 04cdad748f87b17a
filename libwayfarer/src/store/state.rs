//! Aggregate application state
//!
//! The single source of truth consumed by the presentation layer. It is owned
//! by the [`Store`](super::Store); everyone else reads `Arc<AppState>`
//! snapshots and requests changes through dispatch.

use serde::{Deserialize, Serialize};

use super::auth::AuthState;
use super::tab::{Tab, TabState};

/// Root application state, one field per slice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppState {
    /// Login session
    pub auth: AuthState,

    /// Top-level navigation
    pub tab: TabState,
}

impl AppState {
    /// Create new application state with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.is_logged_in
    }

    pub fn active_tab(&self) -> Tab {
        self.tab.active_tab
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = AppState::new();
        assert!(!state.is_logged_in());
        assert_eq!(state.active_tab(), Tab::Home);
        assert!(state.auth.token.is_none());
    }

    #[test]
    fn test_serialized_layout() {
        let json = serde_json::to_value(AppState::new()).unwrap();
        assert_eq!(json["tab"]["activeTab"], "home");
        assert_eq!(json["auth"]["isLoggedIn"], false);
        assert_eq!(json["auth"]["msg"], "");
    }
}
