//! Worker configuration.

use std::time::Duration;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Sleep between polls when the queue is empty
    pub poll_interval: Duration,
    /// Sleep after a loop-level error before resuming
    pub error_backoff: Duration,
    /// Directory for per-job temporary workspaces
    pub work_dir: String,
    /// Directory final artifacts are written to
    pub output_dir: String,
    /// Directory holding the base clip and selectable clips
    pub assets_dir: String,
    /// Base URL for locally-servable fallback links
    pub public_base_url: String,
    /// Font file used by text-clip rendering
    pub font_file: String,
    /// Hard timeout for a single FFmpeg invocation, if any
    pub ffmpeg_timeout_secs: Option<u64>,
    /// Age after which a PROCESSING claim is considered lost
    pub stale_after: Duration,
    /// How often the stale sweep runs
    pub stale_sweep_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            error_backoff: Duration::from_secs(5),
            work_dir: "/tmp/qreel".to_string(),
            output_dir: "./uploads".to_string(),
            assets_dir: "./assets".to_string(),
            public_base_url: "http://localhost:3000".to_string(),
            font_file: "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf".to_string(),
            ffmpeg_timeout_secs: None,
            stale_after: Duration::from_secs(3600),
            stale_sweep_interval: Duration::from_secs(60),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            poll_interval: Duration::from_millis(
                std::env::var("WORKER_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            error_backoff: Duration::from_millis(
                std::env::var("WORKER_ERROR_BACKOFF_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5000),
            ),
            work_dir: std::env::var("WORKER_WORK_DIR").unwrap_or(defaults.work_dir),
            output_dir: std::env::var("WORKER_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            assets_dir: std::env::var("ASSETS_DIR").unwrap_or(defaults.assets_dir),
            public_base_url: std::env::var("PUBLIC_BASE_URL").unwrap_or(defaults.public_base_url),
            font_file: std::env::var("TEXT_CLIP_FONT_FILE").unwrap_or(defaults.font_file),
            ffmpeg_timeout_secs: std::env::var("WORKER_FFMPEG_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok()),
            stale_after: Duration::from_secs(
                std::env::var("WORKER_STALE_AFTER_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(3600),
            ),
            stale_sweep_interval: Duration::from_secs(
                std::env::var("WORKER_STALE_SWEEP_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(60),
            ),
        }
    }
}
