// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod error;
pub mod feed;
pub mod notify;
pub mod reconcile;
pub mod runner;
pub mod state;

// ---- Re-exports for stable public API ----
pub use crate::config::{Config, FeedMode, TelegramConfig};
pub use crate::error::Error;
pub use crate::notify::{Alert, Delivery, Notify};
pub use crate::runner::RunSummary;
pub use crate::state::{Cursor, CursorKind, StateStore};
