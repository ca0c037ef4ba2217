//! Relational persistence for QuoteReel.
//!
//! This crate provides:
//! - Pool construction and schema migration
//! - Video request repository
//! - User repository
//! - Credit ledger (conditional-atomic deduction, refund)

pub mod credits;
pub mod error;
pub mod pool;
pub mod users;
pub mod videos;

pub use credits::CreditLedger;
pub use error::{DbError, DbResult};
pub use pool::{connect, connect_and_migrate};
pub use users::UserRepository;
pub use videos::{NewVideoRequest, VideoRepository};
