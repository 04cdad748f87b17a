//! Dispatch middleware
//!
//! Middleware sees every action before and after it reaches the reducer.
//! `before_dispatch` may stop an action, in which case the reducer and the
//! subscribers never see it. Asynchronous side effects do not belong here;
//! they go through [`Store::dispatch_thunk`](super::Store::dispatch_thunk).

use super::actions::Action;
use super::state::AppState;

/// Decision returned by [`Middleware::before_dispatch`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Hand the action to the next middleware and then the reducer
    Continue,
    /// Drop the action; state is left untouched and no one is notified
    Stop,
}

pub trait Middleware: Send + Sync {
    fn before_dispatch(&self, _action: &Action, _state: &AppState) -> Next {
        Next::Continue
    }

    fn after_dispatch(&self, _action: &Action, _state: &AppState) {}
}

/// Logs every dispatched action through `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn before_dispatch(&self, action: &Action, _state: &AppState) -> Next {
        if action.action_type().is_none() {
            tracing::debug!(
                action = action.type_name(),
                "Unrecognized action type; all slices will ignore it"
            );
        }
        Next::Continue
    }

    fn after_dispatch(&self, action: &Action, state: &AppState) {
        tracing::debug!(
            action = action.type_name(),
            logged_in = state.auth.is_logged_in,
            tab = %state.tab.active_tab,
            "Dispatched action"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Passive;
    impl Middleware for Passive {}

    #[test]
    fn test_default_hooks_continue() {
        let state = AppState::new();
        assert_eq!(Passive.before_dispatch(&Action::Logout, &state), Next::Continue);
        Passive.after_dispatch(&Action::Logout, &state);
    }

    #[test]
    fn test_logging_middleware_never_stops() {
        let state = AppState::new();
        let unknown = Action::Unrecognized("feed/refresh".to_string());
        assert_eq!(LoggingMiddleware.before_dispatch(&unknown, &state), Next::Continue);
        assert_eq!(LoggingMiddleware.before_dispatch(&Action::Logout, &state), Next::Continue);
    }
}
