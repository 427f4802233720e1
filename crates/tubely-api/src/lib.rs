//! Axum HTTP API server for Tubely.
//!
//! This crate provides:
//! - Authenticated video upload with geometry-based storage placement
//! - Signed, expiring playback URLs on every read
//! - Thumbnail attachment as inline data URLs
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AuthUser, JwtKeys};
pub use config::{ApiConfig, IngestConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{PresignedLinkIssuer, UploadCoordinator};
pub use state::AppState;
