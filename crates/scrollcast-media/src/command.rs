//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// One FFmpeg input: a file or a lavfi source, with per-input arguments
/// (the ones that go before its `-i`).
#[derive(Debug, Clone)]
pub struct FfmpegInput {
    args: Vec<String>,
    source: InputSource,
}

#[derive(Debug, Clone)]
enum InputSource {
    File(PathBuf),
    Lavfi(String),
}

impl FfmpegInput {
    /// A file input.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self {
            args: Vec::new(),
            source: InputSource::File(path.as_ref().to_path_buf()),
        }
    }

    /// A lavfi source input (e.g. `color=c=black:s=854x480:r=15`).
    pub fn lavfi(description: impl Into<String>) -> Self {
        Self {
            args: Vec::new(),
            source: InputSource::Lavfi(description.into()),
        }
    }

    /// Add a per-input argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple per-input arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Loop a still image at the given frame rate for `seconds`.
    pub fn loop_image(self, fps: u32, seconds: f64) -> Self {
        self.args(["-loop", "1"])
            .arg("-framerate")
            .arg(fps.to_string())
            .arg("-t")
            .arg(format!("{:.3}", seconds))
    }

    /// Repeat the whole stream `extra_loops` additional times.
    pub fn stream_loop(self, extra_loops: u32) -> Self {
        self.arg("-stream_loop").arg(extra_loops.to_string())
    }

    /// Cap the input duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(format!("{:.3}", seconds))
    }
}

/// Builder for multi-input FFmpeg invocations with a filter graph.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<FfmpegInput>,
    output: PathBuf,
    filter_complex: Option<String>,
    maps: Vec<String>,
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            filter_complex: None,
            maps: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input.
    pub fn input(mut self, input: FfmpegInput) -> Self {
        self.inputs.push(input);
        self
    }

    /// Set the filter graph.
    pub fn filter_complex(mut self, filter: impl Into<String>) -> Self {
        self.filter_complex = Some(filter.into());
        self
    }

    /// Map a stream or filter label into the output (e.g. `[vout]`, `0:a`).
    pub fn map(mut self, stream: impl Into<String>) -> Self {
        self.maps.push(stream.into());
        self
    }

    /// Add an output argument (after all inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Add multiple output arguments.
    pub fn output_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.output_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set output frame rate.
    pub fn frame_rate(self, fps: u32) -> Self {
        self.output_arg("-r").output_arg(fps.to_string())
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        // Progress output to stderr
        args.push("-progress".to_string());
        args.push("pipe:2".to_string());

        for input in &self.inputs {
            args.extend(input.args.clone());
            match &input.source {
                InputSource::File(path) => {
                    args.push("-i".to_string());
                    args.push(path.to_string_lossy().to_string());
                }
                InputSource::Lavfi(desc) => {
                    args.push("-f".to_string());
                    args.push("lavfi".to_string());
                    args.push("-i".to_string());
                    args.push(desc.clone());
                }
            }
        }

        if let Some(filter) = &self.filter_complex {
            args.push("-filter_complex".to_string());
            args.push(filter.clone());
        }

        for map in &self.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with progress tracking and cancellation.
pub struct FfmpegRunner {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self {
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Set cancellation signal. A `true` on the channel kills the encoder.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        self.run_with_progress(cmd, |_| {}).await
    }

    /// Run an FFmpeg command with a progress callback.
    pub async fn run_with_progress<F>(
        &self,
        cmd: &FfmpegCommand,
        progress_callback: F,
    ) -> MediaResult<()>
    where
        F: Fn(FfmpegProgress) + Send + 'static,
    {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::internal("stderr not captured"))?;
        let mut reader = BufReader::new(stderr).lines();

        let progress_handle = tokio::spawn(async move {
            let mut current_progress = FfmpegProgress::default();
            let mut tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if let Some(progress) = parse_progress_line(&line, &mut current_progress) {
                    progress_callback(progress.clone());
                } else if !line.contains('=') {
                    // Non-progress stderr output; keep a short tail for errors
                    if tail.len() >= 20 {
                        tail.remove(0);
                    }
                    tail.push(line);
                }
            }

            tail.join("\n")
        });

        let result = self.wait_for_completion(&mut child).await;
        let stderr_tail = progress_handle.await.unwrap_or_default();

        match result {
            Err(MediaError::FfmpegFailed {
                message, exit_code, ..
            }) => Err(MediaError::FfmpegFailed {
                message,
                stderr: Some(stderr_tail),
                exit_code,
            }),
            other => other,
        }
    }

    /// Wait for the child process, honoring cancellation and timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<()> {
        let timeout = self.timeout_secs;
        let mut cancel_rx = self.cancel_rx.clone();

        let cancelled = async {
            match cancel_rx.as_mut() {
                Some(rx) => {
                    // Already-cancelled channels must not start the encode
                    while !*rx.borrow() {
                        if rx.changed().await.is_err() {
                            // Sender dropped; no cancellation will ever come
                            std::future::pending::<()>().await;
                        }
                    }
                }
                None => std::future::pending::<()>().await,
            }
        };

        let timed_out = async {
            match timeout {
                Some(secs) => tokio::time::sleep(std::time::Duration::from_secs(secs)).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            status = child.wait() => {
                let status = status?;
                if status.success() {
                    Ok(())
                } else {
                    Err(MediaError::ffmpeg_failed(
                        "FFmpeg exited with non-zero status",
                        None,
                        status.code(),
                    ))
                }
            }
            _ = cancelled => {
                info!("FFmpeg cancelled, killing process");
                let _ = child.kill().await;
                Err(MediaError::Cancelled)
            }
            _ = timed_out => {
                let secs = timeout.unwrap_or(0);
                warn!("FFmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(secs))
            }
        }
    }
}

/// Parse a progress line from FFmpeg's `-progress` output.
fn parse_progress_line(line: &str, current: &mut FfmpegProgress) -> Option<FfmpegProgress> {
    let line = line.trim();

    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" | "out_time_us" => {
                // Both keys report microseconds in practice
                if let Ok(us) = value.parse::<i64>() {
                    current.out_time_ms = us / 1000;
                }
            }
            "frame" => {
                if let Ok(frame) = value.parse() {
                    current.frame = frame;
                }
            }
            "fps" => {
                if let Ok(fps) = value.parse() {
                    current.fps = fps;
                }
            }
            "speed" => {
                if value != "N/A" {
                    if let Some(speed_str) = value.strip_suffix('x') {
                        if let Ok(speed) = speed_str.parse() {
                            current.speed = speed;
                        }
                    }
                }
            }
            "progress" => {
                // "continue" or "end"
                if value == "end" {
                    current.is_complete = true;
                }
                return Some(current.clone());
            }
            _ => {}
        }
    }

    None
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

/// Check if FFprobe is available.
pub fn check_ffprobe() -> MediaResult<PathBuf> {
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)
}
