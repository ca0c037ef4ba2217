//! FFmpeg CLI wrapper for QuoteReel.
//!
//! This crate provides:
//! - A command builder and runner for FFmpeg invocations
//! - Text-clip rendering (plain text and receipt cards) over a gradient
//!   background
//! - Receipt layout math with overflow scaling
//! - Normalization and concatenation of heterogeneous clips

pub mod command;
pub mod concat;
pub mod error;
pub mod layout;
pub mod text_clip;

pub use command::{FfmpegCommand, FfmpegRunner};
pub use concat::{build_concat_filter, merge_clips};
pub use error::{MediaError, MediaResult};
pub use layout::ReceiptLayout;
pub use text_clip::{generate_text_clip, TextClipOptions};
