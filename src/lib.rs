//! Dark mode file server with a bounded request pipeline.
//!
//! Serves files and styled directory listings from a single root directory.
//! A counting admission gate limits how many requests are in flight at once;
//! everything past the gate is plain axum routing over the resolver, the
//! listing renderer, and a file-transfer service.

pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod listing;
pub mod resolve;
pub mod routes;
pub mod status;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::Config;
pub use error::ServeError;
pub use gate::AdmissionGate;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Root directory files are served from, canonicalized at startup
    pub root_dir: PathBuf,
    /// Gate bounding concurrent request handling
    pub gate: AdmissionGate,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create state for serving `root_dir` under the given configuration.
    pub fn new(root_dir: PathBuf, config: Config) -> Self {
        let gate = AdmissionGate::new(config.max_concurrent);
        Self {
            root_dir,
            gate,
            config: Arc::new(config),
        }
    }
}
