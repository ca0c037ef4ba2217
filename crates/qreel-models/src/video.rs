//! Video request models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::content::TextContent;
use crate::user::UserId;

/// Unique identifier for a video request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(pub Uuid);

impl VideoId {
    /// Generate a new random video ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for VideoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for VideoId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

/// Video request processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    /// Request accepted, job not yet claimed
    #[default]
    Pending,
    /// Pipeline is running
    Processing,
    /// Final artifact produced and linked
    Done,
    /// Pipeline failed; credit refunded
    Failed,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "PENDING",
            VideoStatus::Processing => "PROCESSING",
            VideoStatus::Done => "DONE",
            VideoStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for VideoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unrecognized status string.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized video status: {0}")]
pub struct ParseVideoStatusError(String);

impl FromStr for VideoStatus {
    type Err = ParseVideoStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(VideoStatus::Pending),
            "PROCESSING" => Ok(VideoStatus::Processing),
            "DONE" => Ok(VideoStatus::Done),
            "FAILED" => Ok(VideoStatus::Failed),
            other => Err(ParseVideoStatusError(other.to_string())),
        }
    }
}

/// A persisted video request.
///
/// Created when the API accepts a request; mutated exclusively by the
/// worker (and the stale sweep) as processing advances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoRequest {
    /// Unique video ID
    pub id: VideoId,

    /// Owning user
    pub user_id: UserId,

    /// Name rendered into the leading text clip
    pub display_name: String,

    /// Quote text for the trailing clip (also kept when a receipt is used)
    pub quote: String,

    /// Structured receipt content, when the trailing clip is a receipt card
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<TextContent>,

    /// Supplementary clip references, in caller order
    pub selected_clips: Vec<i16>,

    /// Path of the base clip to splice between the text clips
    pub base_clip_path: String,

    /// Processing status
    #[serde(default)]
    pub status: VideoStatus,

    /// Path of the final artifact (set when status is DONE)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// Shareable link: external drive URL, or the local fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl VideoRequest {
    /// Content for the trailing text clip: the receipt when present,
    /// otherwise the plain quote.
    pub fn trailing_content(&self) -> TextContent {
        match &self.receipt {
            Some(receipt) => receipt.clone(),
            None => TextContent::Plain {
                text: self.quote.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_status_round_trips() {
        for status in [
            VideoStatus::Pending,
            VideoStatus::Processing,
            VideoStatus::Done,
            VideoStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<VideoStatus>().unwrap(), status);
        }
    }
}
