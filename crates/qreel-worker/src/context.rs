//! Shared processing context.

use sqlx::PgPool;

use qreel_db::{CreditLedger, UserRepository, VideoRepository};
use qreel_media::FfmpegRunner;
use qreel_notify::Mailer;
use qreel_storage::DriveClient;

use crate::config::WorkerConfig;
use crate::error::WorkerResult;

/// Dependency-injected handles the pipeline works against.
///
/// Constructed once at process start and shared by reference; nothing
/// in here is a global.
pub struct ProcessingContext {
    pub config: WorkerConfig,
    pub videos: VideoRepository,
    pub users: UserRepository,
    pub ledger: CreditLedger,
    pub storage: DriveClient,
    pub mailer: Mailer,
    pub runner: FfmpegRunner,
}

impl ProcessingContext {
    /// Create a new processing context over an existing pool.
    pub fn new(config: WorkerConfig, pool: PgPool) -> WorkerResult<Self> {
        let storage = DriveClient::from_env()?;
        let mailer = Mailer::from_env()?;

        let runner = match config.ffmpeg_timeout_secs {
            Some(secs) => FfmpegRunner::new().with_timeout(secs),
            None => FfmpegRunner::new(),
        };

        Ok(Self {
            videos: VideoRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            ledger: CreditLedger::new(pool),
            storage,
            mailer,
            runner,
            config,
        })
    }
}
