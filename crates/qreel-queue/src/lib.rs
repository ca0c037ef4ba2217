//! Postgres-backed durable job queue.
//!
//! This crate provides:
//! - Job enqueueing into a relational table
//! - Transactional claim-one-job semantics (`FOR UPDATE SKIP LOCKED`)
//! - Idempotent terminal status updates
//! - A stale-job sweep for jobs orphaned by a crashed worker

pub mod error;
pub mod job;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use job::{ComposeVideoJob, QueueJob, QueuedJob, COMPOSE_VIDEO_JOB_TYPE};
pub use queue::JobQueue;
