//! Job payload types and the persisted job row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use qreel_models::{JobStatus, TextContent, UserId, VideoId};

use crate::error::{QueueError, QueueResult};

/// Type tag for compose-video jobs, as stored in the `job_type` column.
pub const COMPOSE_VIDEO_JOB_TYPE: &str = "compose_video";

/// Job to compose a video: text clips + base clip + selected clips,
/// merged, uploaded, and the requester notified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComposeVideoJob {
    /// Video request this job drives
    pub video_id: VideoId,
    /// Requesting user (credited back if the pipeline fails)
    pub user_id: UserId,
    /// Name rendered into the leading text clip
    pub display_name: String,
    /// Content of the trailing text clip (plain quote or receipt card)
    pub content: TextContent,
    /// Supplementary clip references, in caller order
    #[serde(default)]
    pub selected_clips: Vec<i16>,
    /// Path of the base clip
    pub base_clip_path: String,
}

impl ComposeVideoJob {
    /// Create a new compose job with no supplementary clips.
    pub fn new(
        video_id: VideoId,
        user_id: UserId,
        display_name: impl Into<String>,
        content: TextContent,
        base_clip_path: impl Into<String>,
    ) -> Self {
        Self {
            video_id,
            user_id,
            display_name: display_name.into(),
            content,
            selected_clips: Vec::new(),
            base_clip_path: base_clip_path.into(),
        }
    }

    /// Set the supplementary clip selection.
    pub fn with_selected_clips(mut self, clips: Vec<i16>) -> Self {
        self.selected_clips = clips;
        self
    }
}

/// Tagged wrapper over all job payloads.
///
/// The payload column is only ever written through this enum, so a row
/// that deserializes is structurally valid by construction; anything
/// else fails dispatch deterministically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueJob {
    ComposeVideo(ComposeVideoJob),
}

impl QueueJob {
    /// The `job_type` column value for this payload.
    pub fn job_type(&self) -> &'static str {
        match self {
            QueueJob::ComposeVideo(_) => COMPOSE_VIDEO_JOB_TYPE,
        }
    }

    pub fn video_id(&self) -> VideoId {
        match self {
            QueueJob::ComposeVideo(j) => j.video_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            QueueJob::ComposeVideo(j) => j.user_id,
        }
    }
}

/// Raw row shape, one-to-one with the `job_queue` table.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct JobRow {
    pub id: i64,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: String,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// A job as read back from the queue table.
#[derive(Debug, Clone)]
pub struct QueuedJob {
    pub id: i64,
    pub job_type: String,
    pub payload: serde_json::Value,
    pub status: JobStatus,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl QueuedJob {
    /// Deserialize the payload into the typed job enum.
    pub fn parse_payload(&self) -> QueueResult<QueueJob> {
        serde_json::from_value(self.payload.clone()).map_err(QueueError::Json)
    }
}

impl TryFrom<JobRow> for QueuedJob {
    type Error = QueueError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(|e| QueueError::serialization(e.to_string()))?;
        Ok(Self {
            id: row.id,
            job_type: row.job_type,
            payload: row.payload,
            status,
            attempts: row.attempts,
            created_at: row.created_at,
            updated_at: row.updated_at,
            locked_at: row.locked_at,
            last_error: row.last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_job_serde_round_trip() {
        let job = ComposeVideoJob::new(
            VideoId::new(),
            UserId::new(),
            "Jane",
            TextContent::plain("Drive safe, pay less."),
            "/srv/assets/default_base.mp4",
        )
        .with_selected_clips(vec![2, 5]);

        let wrapper = QueueJob::ComposeVideo(job.clone());
        let json = serde_json::to_string(&wrapper).expect("serialize QueueJob");
        assert!(json.contains("\"type\":\"compose_video\""));

        let decoded: QueueJob = serde_json::from_str(&json).expect("deserialize QueueJob");
        match decoded {
            QueueJob::ComposeVideo(j) => assert_eq!(j, job),
        }
    }

    #[test]
    fn job_type_tag_matches_constant() {
        let job = QueueJob::ComposeVideo(ComposeVideoJob::new(
            VideoId::new(),
            UserId::new(),
            "Jane",
            TextContent::plain("quote"),
            "base.mp4",
        ));
        assert_eq!(job.job_type(), COMPOSE_VIDEO_JOB_TYPE);
    }
}
