//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Unknown job type: {0}")]
    UnknownJobType(String),

    #[error("Invalid job payload: {0}")]
    InvalidPayload(String),

    #[error("Queue error: {0}")]
    Queue(#[from] qreel_queue::QueueError),

    #[error("Database error: {0}")]
    Db(#[from] qreel_db::DbError),

    #[error("Media error: {0}")]
    Media(#[from] qreel_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] qreel_storage::StorageError),

    #[error("Notify error: {0}")]
    Notify(#[from] qreel_notify::NotifyError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn unknown_job_type(tag: impl Into<String>) -> Self {
        Self::UnknownJobType(tag.into())
    }

    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }
}
