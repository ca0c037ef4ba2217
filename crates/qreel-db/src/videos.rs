//! Video request repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use qreel_models::{TextContent, UserId, VideoId, VideoRequest, VideoStatus};

use crate::error::{DbError, DbResult};

const VIDEO_COLUMNS: &str = "id, user_id, display_name, quote, receipt, selected_clips, \
     base_clip_path, status, output_path, external_link, created_at";

#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    user_id: Uuid,
    display_name: String,
    quote: String,
    receipt: Option<serde_json::Value>,
    selected_clips: Vec<i16>,
    base_clip_path: String,
    status: String,
    output_path: Option<String>,
    external_link: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<VideoRow> for VideoRequest {
    type Error = DbError;

    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<VideoStatus>()
            .map_err(|e| DbError::corrupt_row(e.to_string()))?;
        let receipt = row
            .receipt
            .map(serde_json::from_value::<TextContent>)
            .transpose()?;
        Ok(Self {
            id: VideoId(row.id),
            user_id: UserId(row.user_id),
            display_name: row.display_name,
            quote: row.quote,
            receipt,
            selected_clips: row.selected_clips,
            base_clip_path: row.base_clip_path,
            status,
            output_path: row.output_path,
            external_link: row.external_link,
            created_at: row.created_at,
        })
    }
}

/// Fields for a new video request row.
#[derive(Debug, Clone)]
pub struct NewVideoRequest {
    pub user_id: UserId,
    pub display_name: String,
    pub quote: String,
    pub receipt: Option<TextContent>,
    pub selected_clips: Vec<i16>,
    pub base_clip_path: String,
}

/// Repository for video request rows.
#[derive(Clone)]
pub struct VideoRepository {
    pool: PgPool,
}

impl VideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new PENDING request and return it.
    pub async fn create(&self, new: NewVideoRequest) -> DbResult<VideoRequest> {
        let receipt = new.receipt.as_ref().map(serde_json::to_value).transpose()?;

        let row = sqlx::query_as::<_, VideoRow>(&format!(
            r"
            INSERT INTO videos (user_id, display_name, quote, receipt, selected_clips, base_clip_path, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'PENDING')
            RETURNING {VIDEO_COLUMNS}
            ",
        ))
        .bind(new.user_id.as_uuid())
        .bind(&new.display_name)
        .bind(&new.quote)
        .bind(receipt)
        .bind(&new.selected_clips)
        .bind(&new.base_clip_path)
        .fetch_one(&self.pool)
        .await?;

        let video = VideoRequest::try_from(row)?;
        debug!(video_id = %video.id, user_id = %video.user_id, "Created video request");
        Ok(video)
    }

    pub async fn find_by_id(&self, id: VideoId) -> DbResult<Option<VideoRequest>> {
        let row = sqlx::query_as::<_, VideoRow>(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1",
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.map(VideoRequest::try_from).transpose()
    }

    /// A user's requests, newest first, with the total count.
    pub async fn list_by_user(
        &self,
        user_id: UserId,
        limit: i64,
        offset: i64,
    ) -> DbResult<(Vec<VideoRequest>, i64)> {
        let rows = sqlx::query_as::<_, VideoRow>(&format!(
            r"
            SELECT {VIDEO_COLUMNS} FROM videos
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        ))
        .bind(user_id.as_uuid())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM videos WHERE user_id = $1")
            .bind(user_id.as_uuid())
            .fetch_one(&self.pool)
            .await?;

        let videos = rows
            .into_iter()
            .map(VideoRequest::try_from)
            .collect::<DbResult<Vec<_>>>()?;
        Ok((videos, total))
    }

    /// Mark the request PROCESSING (first observable pipeline action).
    pub async fn mark_processing(&self, id: VideoId) -> DbResult<()> {
        self.set_status(id, VideoStatus::Processing).await
    }

    /// Mark the request DONE with the artifact path and shareable link.
    pub async fn mark_done(&self, id: VideoId, output_path: &str, link: &str) -> DbResult<()> {
        sqlx::query(
            "UPDATE videos SET status = 'DONE', output_path = $2, external_link = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(output_path)
        .bind(link)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark the request FAILED.
    pub async fn mark_failed(&self, id: VideoId) -> DbResult<()> {
        self.set_status(id, VideoStatus::Failed).await
    }

    async fn set_status(&self, id: VideoId, status: VideoStatus) -> DbResult<()> {
        sqlx::query("UPDATE videos SET status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
