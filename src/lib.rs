//! LDH visit admission server
//!
//! Turns approved help requests into dated visit tickets under a per-day,
//! per-category capacity, exposed as a REST JSON API.

use std::sync::Arc;

use chrono::{DateTime, Utc};

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub started_at: DateTime<Utc>,
}
