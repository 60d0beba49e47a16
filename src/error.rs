use std::io;

use thiserror::Error;

/// Failure taxonomy for a single tracker pass.
///
/// `CorruptState` never leaves the state module: an unreadable state file
/// degrades to the zero cursor and is only logged. The others surface to the
/// binary, which decides whether a kind is a soft failure (fetch) or not.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("feed fetch failed: {0}")]
    Fetch(String),

    #[error("state file unreadable: {0}")]
    CorruptState(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("state persist failed: {0}")]
    Persist(#[from] io::Error),
}
