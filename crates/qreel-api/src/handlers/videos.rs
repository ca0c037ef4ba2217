//! Video request handlers.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use qreel_db::NewVideoRequest;
use qreel_models::{ReceiptLine, TextContent, VideoId, VideoRequest};
use qreel_queue::{ComposeVideoJob, QueueJob};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Structured receipt content as accepted over the wire.
#[derive(Debug, Deserialize)]
pub struct ReceiptBody {
    pub header: String,
    pub lines: Vec<ReceiptLineBody>,
    pub total: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptLineBody {
    pub label: String,
    pub value: String,
}

impl From<ReceiptBody> for TextContent {
    fn from(body: ReceiptBody) -> Self {
        TextContent::Receipt {
            header: body.header,
            lines: body
                .lines
                .into_iter()
                .map(|l| ReceiptLine::new(l.label, l.value))
                .collect(),
            total: body.total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateVideoBody {
    pub name: String,
    pub quote: String,
    /// Optional structured receipt; replaces the quote on the trailing clip
    pub receipt: Option<ReceiptBody>,
    /// Supplementary clips to splice in, by reference (1-7), in order
    #[serde(default)]
    pub clips: Vec<i16>,
}

impl CreateVideoBody {
    /// Reject malformed requests before any row exists.
    fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().len() < 3 {
            return Err(ApiError::Validation(
                "name must be at least 3 characters".to_string(),
            ));
        }
        if self.quote.trim().len() < 3 {
            return Err(ApiError::Validation(
                "quote must be at least 3 characters".to_string(),
            ));
        }
        if !self.clips.iter().all(|c| (1..=7).contains(c)) {
            return Err(ApiError::Validation(
                "clip references must be between 1 and 7".to_string(),
            ));
        }
        if let Some(receipt) = &self.receipt {
            if receipt.header.trim().is_empty() || receipt.total.trim().is_empty() {
                return Err(ApiError::Validation(
                    "receipt header and total must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct CreateVideoResponse {
    pub video_id: VideoId,
    pub status: String,
}

/// `POST /api/videos` — accept a composition request.
///
/// Deducts a credit, creates the PENDING entity, and enqueues the job.
/// Responds 202 immediately; the pipeline runs in the worker.
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreateVideoBody>,
) -> ApiResult<(StatusCode, Json<CreateVideoResponse>)> {
    body.validate()?;

    let base_clip_path = state.config.base_clip_path();
    if !base_clip_path.exists() {
        return Err(ApiError::internal(
            "Server configuration error: default base video not found in assets",
        ));
    }

    // Deduction gates the request; nothing is created when it fails.
    if !state.ledger.deduct(auth.user_id).await? {
        return Err(ApiError::forbidden(
            "Insufficient credits. Please contact support to purchase more.",
        ));
    }

    let content = match body.receipt {
        Some(receipt) => TextContent::from(receipt),
        None => TextContent::plain(body.quote.clone()),
    };

    let video = match state
        .videos
        .create(NewVideoRequest {
            user_id: auth.user_id,
            display_name: body.name.clone(),
            quote: body.quote.clone(),
            receipt: matches!(content, TextContent::Receipt { .. }).then(|| content.clone()),
            selected_clips: body.clips.clone(),
            base_clip_path: base_clip_path.to_string_lossy().to_string(),
        })
        .await
    {
        Ok(video) => video,
        Err(e) => {
            // The credit is already held: give it back before failing.
            refund_quietly(&state, auth).await;
            return Err(e.into());
        }
    };

    let job = QueueJob::ComposeVideo(
        ComposeVideoJob::new(
            video.id,
            auth.user_id,
            body.name,
            content,
            base_clip_path.to_string_lossy().to_string(),
        )
        .with_selected_clips(body.clips),
    );

    if let Err(e) = state.queue.enqueue(&job).await {
        // No job will ever pick this entity up; roll both effects back.
        refund_quietly(&state, auth).await;
        if let Err(db_err) = state.videos.mark_failed(video.id).await {
            error!(video_id = %video.id, error = %db_err, "Failed to mark video FAILED");
        }
        return Err(e.into());
    }

    info!(video_id = %video.id, user_id = %auth.user_id, "Video generation request accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateVideoResponse {
            video_id: video.id,
            status: video.status.to_string(),
        }),
    ))
}

async fn refund_quietly(state: &AppState, auth: AuthUser) {
    if let Err(e) = state.ledger.refund(auth.user_id).await {
        error!(user_id = %auth.user_id, error = %e, "Failed to refund credit after rejected request");
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

#[derive(Serialize)]
pub struct VideoListResponse {
    pub videos: Vec<VideoRequest>,
    pub total: i64,
}

/// `GET /api/videos` — the caller's requests, newest first.
pub async fn list(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<VideoListResponse>> {
    let limit = query.limit.clamp(1, 100);
    let offset = query.offset.max(0);

    let (videos, total) = state.videos.list_by_user(auth.user_id, limit, offset).await?;
    Ok(Json(VideoListResponse { videos, total }))
}

/// `GET /api/videos/{id}` — ownership-checked detail.
pub async fn get_one(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VideoRequest>> {
    let video = state
        .videos
        .find_by_id(VideoId(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Video not found"))?;

    if video.user_id != auth.user_id {
        return Err(ApiError::forbidden("Forbidden"));
    }

    Ok(Json(video))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(name: &str, quote: &str, clips: Vec<i16>) -> CreateVideoBody {
        CreateVideoBody {
            name: name.to_string(),
            quote: quote.to_string(),
            receipt: None,
            clips,
        }
    }

    #[test]
    fn accepts_well_formed_requests() {
        assert!(body("Jane", "Drive safe, pay less.", vec![2, 5]).validate().is_ok());
    }

    #[test]
    fn rejects_short_name_and_quote() {
        assert!(body("J", "A fine quote", vec![]).validate().is_err());
        assert!(body("Jane", "no", vec![]).validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_clip_references() {
        assert!(body("Jane", "A fine quote", vec![0]).validate().is_err());
        assert!(body("Jane", "A fine quote", vec![8]).validate().is_err());
        assert!(body("Jane", "A fine quote", vec![1, 7]).validate().is_ok());
    }

    #[test]
    fn receipt_maps_to_structured_content() {
        let receipt = ReceiptBody {
            header: "Your Quote".to_string(),
            lines: vec![ReceiptLineBody {
                label: "Base cover".to_string(),
                value: "$120.00".to_string(),
            }],
            total: "$120.00".to_string(),
        };

        match TextContent::from(receipt) {
            TextContent::Receipt { header, lines, total } => {
                assert_eq!(header, "Your Quote");
                assert_eq!(lines.len(), 1);
                assert_eq!(total, "$120.00");
            }
            other => panic!("unexpected content: {other:?}"),
        }
    }
}
