//! The viewport: which cells are visible, and what the client knows about them.
//!
//! [`ViewportCache`] holds the cells and label mappings received from the
//! server. Every delta is scoped to one or more window ranges; a delta for a
//! different window replaces the cache instead of merging into it.

mod cache;
mod window;

pub use cache::{ViewportCache, ViewportCacheError, MAX_LABEL_EXPANSION};
pub use window::Viewport;
