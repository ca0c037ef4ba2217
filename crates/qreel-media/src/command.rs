//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// How many trailing stderr lines to keep for diagnostics.
const STDERR_TAIL_LINES: usize = 24;

/// One FFmpeg input: a file on disk or a lavfi-generated source.
#[derive(Debug, Clone)]
enum InputSource {
    File(PathBuf),
    Lavfi(String),
}

/// Builder for FFmpeg commands.
///
/// Supports any number of file and lavfi inputs, a filter graph, and
/// explicit stream mapping, which is what text-clip rendering and
/// concatenation need.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<InputSource>,
    filter_complex: Option<String>,
    maps: Vec<String>,
    output_args: Vec<String>,
    output: PathBuf,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            filter_complex: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add a file input.
    pub fn input(mut self, path: impl AsRef<Path>) -> Self {
        self.inputs.push(InputSource::File(path.as_ref().to_path_buf()));
        self
    }

    /// Add a lavfi-generated input (e.g. `color=c=#FFA500:s=1280x720:d=5`).
    pub fn lavfi(mut self, spec: impl Into<String>) -> Self {
        self.inputs.push(InputSource::Lavfi(spec.into()));
        self
    }

    /// Set the filter graph.
    pub fn filter_complex(mut self, filter: impl Into<String>) -> Self {
        self.filter_complex = Some(filter.into());
        self
    }

    /// Map an output stream label (e.g. `[outv]`).
    pub fn map(mut self, label: impl Into<String>) -> Self {
        self.maps.push(label.into());
        self
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set the output pixel format.
    pub fn pix_fmt(self, fmt: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(fmt)
    }

    /// Build the argument vector.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for input in &self.inputs {
            match input {
                InputSource::File(path) => {
                    args.push("-i".to_string());
                    args.push(path.to_string_lossy().to_string());
                }
                InputSource::Lavfi(spec) => {
                    args.push("-f".to_string());
                    args.push("lavfi".to_string());
                    args.push("-i".to_string());
                    args.push(spec.clone());
                }
            }
        }

        if let Some(filter) = &self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(filter.clone());
        }

        for label in &self.maps {
            args.push("-map".to_string());
            args.push(label.clone());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with stderr capture and optional timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout_secs: Option<u64>,
}

impl FfmpegRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a hard timeout; the process is killed when it elapses.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        // Drain stderr concurrently so a chatty process cannot fill the
        // pipe and deadlock against wait().
        let stderr = child.stderr.take();
        let tail_handle = tokio::spawn(async move {
            let mut tail: Vec<String> = Vec::new();
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tail.len() == STDERR_TAIL_LINES {
                        tail.remove(0);
                    }
                    tail.push(line);
                }
            }
            tail
        });

        let status = self.wait_for_completion(&mut child).await;
        let tail = tail_handle.await.unwrap_or_default();

        let status = match status {
            Ok(status) => status,
            Err(e) => {
                if !tail.is_empty() {
                    warn!("FFmpeg stderr tail:\n{}", tail.join("\n"));
                }
                return Err(e);
            }
        };

        if status.success() {
            Ok(())
        } else {
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                if tail.is_empty() {
                    None
                } else {
                    Some(tail.join("\n"))
                },
                status.code(),
            ))
        }
    }

    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        match self.timeout_secs {
            Some(timeout_secs) => {
                let timeout = tokio::time::timeout(
                    std::time::Duration::from_secs(timeout_secs),
                    child.wait(),
                );
                match timeout.await {
                    Ok(result) => Ok(result?),
                    Err(_) => {
                        warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                        let _ = child.kill().await;
                        Err(MediaError::Timeout(timeout_secs))
                    }
                }
            }
            None => Ok(child.wait().await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_args_orders_inputs_and_filter() {
        let cmd = FfmpegCommand::new("/tmp/out.mp4")
            .lavfi("color=c=#FFA500:s=1280x720:d=5")
            .input("/tmp/in.mp4")
            .filter_complex("[0:v][1:v]overlay[outv]")
            .map("[outv]")
            .pix_fmt("yuv420p");

        let args = cmd.build_args();
        let joined = args.join(" ");

        assert!(joined.starts_with("-y -v error"));
        assert!(joined.contains("-f lavfi -i color=c=#FFA500:s=1280x720:d=5"));
        assert!(joined.contains("-i /tmp/in.mp4"));
        assert!(joined.contains("-filter_complex [0:v][1:v]overlay[outv]"));
        assert!(joined.contains("-map [outv]"));
        assert!(joined.contains("-pix_fmt yuv420p"));
        assert!(joined.ends_with("/tmp/out.mp4"));

        // lavfi flags must precede the file input they belong to
        let lavfi_pos = args.iter().position(|a| a == "lavfi").unwrap();
        let file_pos = args.iter().position(|a| a == "/tmp/in.mp4").unwrap();
        assert!(lavfi_pos < file_pos);
    }
}
