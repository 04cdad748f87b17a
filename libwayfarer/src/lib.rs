//! Wayfarer - client-side state for the Wayfarer travel app
//!
//! This library holds the state the presentation layer renders from: the
//! login session and the active navigation tab. State changes only through
//! dispatched actions, and selected slices are persisted so a session
//! survives restarts.

pub mod config;
pub mod error;
pub mod logging;
pub mod persist;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, WayfarerError};
pub use persist::{FileStorage, MemoryStorage, SqliteStorage, Storage};
pub use store::{Action, ActionType, AppState, Dispatcher, Store, Tab};
