//! The compose pipeline.
//!
//! Transforms one video request into a final artifact: render the text
//! clips, assemble the sequence, merge, upload (with local fallback),
//! finalize the entity, and notify the requester. On a stage failure the
//! side effects are rolled back symmetrically: entity FAILED, exactly
//! one credit refund, error recorded on the job by the executor.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info, warn};

use qreel_media::{generate_text_clip, merge_clips, TextClipOptions};
use qreel_models::TextContent;
use qreel_queue::{ComposeVideoJob, COMPOSE_VIDEO_JOB_TYPE};

use crate::context::ProcessingContext;
use crate::error::{WorkerError, WorkerResult};
use crate::registry::JobHandler;

/// Per-job scratch directory.
///
/// Named with the video id plus a timestamp so concurrent workers never
/// collide on disk. Removed unconditionally once the job reaches a
/// terminal state; leakage on a crash is tolerated.
pub struct JobWorkspace {
    dir: PathBuf,
}

impl JobWorkspace {
    pub async fn create(work_dir: &str, tag: impl std::fmt::Display) -> std::io::Result<Self> {
        let dir = Path::new(work_dir).join(format!("job_{}_{}", tag, Utc::now().timestamp_millis()));
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    /// Best-effort removal of the whole workspace.
    pub async fn cleanup(&self) {
        if let Err(e) = tokio::fs::remove_dir_all(&self.dir).await {
            warn!("Failed to clean up workspace {}: {}", self.dir.display(), e);
        }
    }
}

/// Resolve supplementary clip references to asset paths, in caller
/// order, dropping references that do not resolve to an existing file.
pub fn resolve_selected(assets_dir: &Path, refs: &[i16]) -> Vec<PathBuf> {
    refs.iter()
        .filter_map(|r| {
            let path = assets_dir.join(format!("clip_{r}.mp4"));
            if path.exists() {
                Some(path)
            } else {
                warn!("Selected clip {} has no asset at {}, skipping", r, path.display());
                None
            }
        })
        .collect()
}

/// The final clip sequence. The ordering is a hard contract:
/// `[lead text, base, selected..., trail text]`.
pub fn assemble_sequence(
    lead: PathBuf,
    base: PathBuf,
    selected: Vec<PathBuf>,
    trail: PathBuf,
) -> Vec<PathBuf> {
    let mut sequence = Vec::with_capacity(selected.len() + 3);
    sequence.push(lead);
    sequence.push(base);
    sequence.extend(selected);
    sequence.push(trail);
    sequence
}

/// Locally-servable link used when the drive upload fails. Always
/// non-empty: the entity is never marked DONE without a link.
pub fn fallback_link(public_base_url: &str, file_name: &str) -> String {
    format!("{}/downloads/{}", public_base_url.trim_end_matches('/'), file_name)
}

/// Drive object key for a final artifact.
fn drive_key(job: &ComposeVideoJob, file_name: &str) -> String {
    format!("videos/{}/{}", job.video_id, file_name)
}

/// The produced artifact: local path plus distribution link.
struct Artifact {
    output_path: PathBuf,
    link: String,
}

/// Handler for `compose_video` jobs.
pub struct ComposeVideoHandler {
    ctx: Arc<ProcessingContext>,
}

impl ComposeVideoHandler {
    pub fn new(ctx: Arc<ProcessingContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl JobHandler for ComposeVideoHandler {
    fn job_type(&self) -> &'static str {
        COMPOSE_VIDEO_JOB_TYPE
    }

    async fn handle(&self, payload: &serde_json::Value) -> WorkerResult<()> {
        let job: ComposeVideoJob = serde_json::from_value(payload.clone())
            .map_err(|e| WorkerError::invalid_payload(e.to_string()))?;
        compose_video(&self.ctx, &job).await
    }
}

/// Run the full pipeline for one job, applying compensation on failure.
pub async fn compose_video(ctx: &ProcessingContext, job: &ComposeVideoJob) -> WorkerResult<()> {
    info!(video_id = %job.video_id, user_id = %job.user_id, "Composing video");

    let workspace = JobWorkspace::create(&ctx.config.work_dir, job.video_id).await?;

    let result = run_stages(ctx, job, &workspace).await;

    // Intermediates are removed on both paths; only the final artifact
    // survives in the output directory.
    workspace.cleanup().await;

    match result {
        Ok(artifact) => {
            notify_requester(ctx, job, &artifact.link).await;
            info!(
                video_id = %job.video_id,
                output = %artifact.output_path.display(),
                "Video composed"
            );
            Ok(())
        }
        Err(e) => {
            error!(video_id = %job.video_id, error = %e, "Pipeline failed, rolling back");

            if let Err(db_err) = ctx.videos.mark_failed(job.video_id).await {
                error!(video_id = %job.video_id, error = %db_err, "Failed to mark video FAILED");
            }
            // Exactly one refund per failed execution; the job is not
            // retried after a pipeline failure.
            if let Err(refund_err) = ctx.ledger.refund(job.user_id).await {
                error!(user_id = %job.user_id, error = %refund_err, "Failed to refund credit");
            }

            Err(e)
        }
    }
}

/// Stages 1-6. Any error propagates to the compensation block above.
async fn run_stages(
    ctx: &ProcessingContext,
    job: &ComposeVideoJob,
    workspace: &JobWorkspace,
) -> WorkerResult<Artifact> {
    // Stage 1: the first observable side effect.
    ctx.videos.mark_processing(job.video_id).await?;

    let opts = TextClipOptions::new(&ctx.config.font_file);

    // Stage 2: text clips.
    let lead = generate_text_clip(
        &ctx.runner,
        &TextContent::plain(job.display_name.clone()),
        workspace.path("name_clip.mp4"),
        &opts,
    )
    .await?;

    let trail = generate_text_clip(
        &ctx.runner,
        &job.content,
        workspace.path("quote_clip.mp4"),
        &opts,
    )
    .await?;

    // Stage 3: assembly in contract order.
    let base = PathBuf::from(&job.base_clip_path);
    if !base.exists() {
        return Err(qreel_media::MediaError::FileNotFound(base).into());
    }
    let selected = resolve_selected(Path::new(&ctx.config.assets_dir), &job.selected_clips);
    let sequence = assemble_sequence(lead, base, selected, trail);

    // Stage 4: merge.
    tokio::fs::create_dir_all(&ctx.config.output_dir).await?;
    let file_name = format!("final_{}_{}.mp4", job.video_id, Utc::now().timestamp_millis());
    let output_path = Path::new(&ctx.config.output_dir).join(&file_name);
    merge_clips(&ctx.runner, &sequence, &output_path).await?;

    // Stage 5: upload, falling back to a local link.
    let link = match ctx
        .storage
        .upload_and_share(&output_path, &drive_key(job, &file_name))
        .await
    {
        Ok(url) => url,
        Err(e) => {
            warn!(video_id = %job.video_id, error = %e, "Drive upload failed, using local link");
            fallback_link(&ctx.config.public_base_url, &file_name)
        }
    };

    // Stage 6: finalize.
    ctx.videos
        .mark_done(job.video_id, &output_path.to_string_lossy(), &link)
        .await?;

    Ok(Artifact { output_path, link })
}

/// Stage 7: email the requester. Never affects the job outcome.
async fn notify_requester(ctx: &ProcessingContext, job: &ComposeVideoJob, link: &str) {
    match ctx.users.find_by_id(job.user_id).await {
        Ok(Some(user)) => {
            let body = format!(
                "<p>Your video has been generated successfully.</p>\
                 <p><a href=\"{link}\">Click here to download</a></p>"
            );
            if let Err(e) = ctx.mailer.send(&user.email, "Your Video is Ready!", &body).await {
                warn!(user_id = %job.user_id, error = %e, "Failed to send completion email");
            }
        }
        Ok(None) => {
            warn!(user_id = %job.user_id, "User not found, skipping completion email");
        }
        Err(e) => {
            warn!(user_id = %job.user_id, error = %e, "User lookup failed, skipping email");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_order_is_lead_base_selected_trail() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = tmp.path();
        std::fs::write(assets.join("clip_2.mp4"), b"x").unwrap();
        std::fs::write(assets.join("clip_5.mp4"), b"x").unwrap();

        let selected = resolve_selected(assets, &[2, 5]);
        let sequence = assemble_sequence(
            PathBuf::from("name.mp4"),
            PathBuf::from("base.mp4"),
            selected,
            PathBuf::from("quote.mp4"),
        );

        assert_eq!(
            sequence,
            vec![
                PathBuf::from("name.mp4"),
                PathBuf::from("base.mp4"),
                assets.join("clip_2.mp4"),
                assets.join("clip_5.mp4"),
                PathBuf::from("quote.mp4"),
            ]
        );
    }

    #[test]
    fn missing_selected_assets_are_skipped_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = tmp.path();
        // Only clip 2 exists; clip 5 must be dropped without reordering.
        std::fs::write(assets.join("clip_2.mp4"), b"x").unwrap();

        let selected = resolve_selected(assets, &[2, 5]);
        let sequence = assemble_sequence(
            PathBuf::from("name.mp4"),
            PathBuf::from("base.mp4"),
            selected,
            PathBuf::from("quote.mp4"),
        );

        assert_eq!(
            sequence,
            vec![
                PathBuf::from("name.mp4"),
                PathBuf::from("base.mp4"),
                assets.join("clip_2.mp4"),
                PathBuf::from("quote.mp4"),
            ]
        );
    }

    #[test]
    fn selection_order_follows_the_caller_not_the_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = tmp.path();
        std::fs::write(assets.join("clip_1.mp4"), b"x").unwrap();
        std::fs::write(assets.join("clip_7.mp4"), b"x").unwrap();

        let selected = resolve_selected(assets, &[7, 1]);
        assert_eq!(selected, vec![assets.join("clip_7.mp4"), assets.join("clip_1.mp4")]);
    }

    #[test]
    fn fallback_link_is_never_empty_and_joins_cleanly() {
        let link = fallback_link("http://localhost:3000/", "final_abc_1.mp4");
        assert_eq!(link, "http://localhost:3000/downloads/final_abc_1.mp4");
        assert!(!fallback_link("", "f.mp4").is_empty());
    }
}
