//! External drive storage client.
//!
//! This crate provides:
//! - File upload to an S3-compatible drive
//! - Shareable (presigned) link generation
//!
//! The contract is deliberately simple: upload succeeds or fails, and a
//! failure never takes the pipeline down — callers fall back to a
//! locally-servable link.

pub mod client;
pub mod error;

pub use client::{DriveClient, DriveConfig};
pub use error::{StorageError, StorageResult};
