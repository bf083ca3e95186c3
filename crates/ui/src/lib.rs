//! Spreadsheet client UI layer.
//!
//! - [`lifecycle`]: the open/refresh/close protocol every history-aware
//!   component follows
//! - [`AppContext`]: the session (history, metadata, viewport cache,
//!   fetchers) passed to every component
//! - [`HistoryTokenActions`]: performs the server call a token asks for
//! - [`components`]: headless dialog and grid models
//! - [`App`]: wires the above together

mod actions;
mod app;
pub mod components;
mod context;
pub mod lifecycle;

pub use actions::HistoryTokenActions;
pub use app::App;
pub use context::{AppContext, Notifier, Spawner, StatusNotifier};
pub use lifecycle::{
    component_lifecycle_history_token_query, refresh_if_open, ComponentLifecycle, HistoryTokenMatcher,
    LifecycleContext, Openable, Refreshable,
};
