//! Errors surfaced while constructing the engine.
//!
//! Runtime filesystem trouble (missing folders, failed scans, backend errors)
//! never surfaces here; it degrades to "no activity" and is logged instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    /// A background scheduler thread could not be started.
    #[error("failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
}
