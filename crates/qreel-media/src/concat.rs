//! Clip normalization and concatenation.
//!
//! Inputs arrive with arbitrary resolutions and frame rates; every one
//! is normalized to a single canonical format before `concat` so
//! heterogeneous inputs cannot corrupt the output.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Canonical output format.
pub const TARGET_WIDTH: u32 = 1280;
pub const TARGET_HEIGHT: u32 = 720;
pub const TARGET_FPS: u32 = 30;

/// Normalization chain for input `index`: scale preserving aspect
/// ratio, pad to the canonical frame, square pixels, fixed rate.
fn normalize_chain(index: usize) -> String {
    format!(
        "[{index}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,\
         pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p[v{index}]",
        w = TARGET_WIDTH,
        h = TARGET_HEIGHT,
        fps = TARGET_FPS,
    )
}

/// Build the full normalize-and-concat filter graph for `n` inputs.
pub fn build_concat_filter(n: usize) -> String {
    let mut parts: Vec<String> = (0..n).map(normalize_chain).collect();

    let concat_inputs: String = (0..n).map(|i| format!("[v{i}]")).collect();
    parts.push(format!("{concat_inputs}concat=n={n}:v=1:a=0[v]"));

    parts.join(";")
}

/// Concatenate `inputs` in order into `output`.
///
/// Every input path must exist; the caller is responsible for dropping
/// unresolvable references before this point.
pub async fn merge_clips(
    runner: &FfmpegRunner,
    inputs: &[PathBuf],
    output: impl AsRef<Path>,
) -> MediaResult<PathBuf> {
    if inputs.is_empty() {
        return Err(MediaError::NoInputs);
    }

    for input in inputs {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.clone()));
        }
    }

    let output = output.as_ref().to_path_buf();
    let mut cmd = FfmpegCommand::new(&output);
    for input in inputs {
        cmd = cmd.input(input);
    }
    cmd = cmd.filter_complex(build_concat_filter(inputs.len())).map("[v]");

    runner.run(&cmd).await?;
    info!(
        "Merged {} clips into {}",
        inputs.len(),
        output.display()
    );
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_filter_normalizes_every_input() {
        let filter = build_concat_filter(3);
        for i in 0..3 {
            assert!(filter.contains(&format!("[{i}:v]scale=1280:720")));
            assert!(filter.contains(&format!("fps=30,format=yuv420p[v{i}]")));
        }
        assert!(filter.ends_with("[v0][v1][v2]concat=n=3:v=1:a=0[v]"));
    }

    #[test]
    fn concat_filter_single_input() {
        let filter = build_concat_filter(1);
        assert!(filter.ends_with("[v0]concat=n=1:v=1:a=0[v]"));
    }

    #[tokio::test]
    async fn merge_rejects_empty_input_list() {
        let runner = FfmpegRunner::new();
        let result = merge_clips(&runner, &[], "/tmp/out.mp4").await;
        assert!(matches!(result, Err(MediaError::NoInputs)));
    }

    #[tokio::test]
    async fn merge_rejects_missing_files() {
        let runner = FfmpegRunner::new();
        let missing = PathBuf::from("/definitely/not/here.mp4");
        let result = merge_clips(&runner, &[missing.clone()], "/tmp/out.mp4").await;
        match result {
            Err(MediaError::FileNotFound(path)) => assert_eq!(path, missing),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
