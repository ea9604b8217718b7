//! Cyclewatch - monthly NAV cycle detection and projection for short-duration Treasury ETFs

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod sources;
pub mod types;

use config::Config;
use services::{ProfileRegistry, RefreshService, SeriesCache, SqliteStore};
use std::sync::Arc;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<SqliteStore>,
    pub profiles: Arc<ProfileRegistry>,
    pub cache: Arc<SeriesCache>,
    pub refresher: Arc<RefreshService>,
}

// Re-export commonly used types
pub use error::{AppError, Result};
pub use types::*;
