//! HTTP API for QuoteReel.
//!
//! Thin by design: validation, credit deduction, row creation, enqueue.
//! The HTTP response never waits on pipeline completion.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
