//! Transactional email notifications.
//!
//! A thin client for an HTTP mail API. Delivery is fire-and-forget from
//! the pipeline's point of view: failures are logged by the caller and
//! never affect the job outcome.

pub mod error;
pub mod mailer;

pub use error::{NotifyError, NotifyResult};
pub use mailer::{Mailer, MailerConfig};
