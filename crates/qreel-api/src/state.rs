//! Application state.

use sqlx::PgPool;

use qreel_db::{CreditLedger, UserRepository, VideoRepository};
use qreel_queue::JobQueue;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub pool: PgPool,
    pub videos: VideoRepository,
    pub users: UserRepository,
    pub ledger: CreditLedger,
    pub queue: JobQueue,
}

impl AppState {
    /// Create new application state over an existing pool.
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        Self {
            videos: VideoRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            ledger: CreditLedger::new(pool.clone()),
            queue: JobQueue::new(pool.clone()),
            pool,
            config,
        }
    }
}
