//! FFmpeg-based transcoder implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::TranscoderConfig;
use super::error::TranscodeError;
use super::traits::Transcoder;
use super::types::{
    MediaInfo, QualityPreset, TargetFormat, TranscodeProgress, TranscodeRequest,
    TranscodeSuccess, AUDIO_INPUT_FORMATS, VIDEO_INPUT_FORMATS,
};
use crate::outcome::Outcome;

/// Bitrate of the audio track in video targets.
const VIDEO_AUDIO_BITRATE: &str = "128k";

/// FFmpeg-based transcoder implementation.
pub struct FfmpegTranscoder {
    config: TranscoderConfig,
}

impl FfmpegTranscoder {
    /// Creates a new FFmpeg transcoder with the given configuration.
    pub fn new(config: TranscoderConfig) -> Self {
        Self { config }
    }

    /// Creates a transcoder with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(TranscoderConfig::default())
    }

    /// Output path for a request: `<output_dir>/<input stem>.<ext>`.
    ///
    /// Gets a `_converted` suffix when it would overwrite the input.
    fn output_path(input_path: &Path, output_dir: &Path, target: TargetFormat) -> PathBuf {
        let stem = input_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "output".to_string());

        let candidate = output_dir.join(format!("{}.{}", stem, target.extension()));
        if candidate == input_path {
            output_dir.join(format!("{}_converted.{}", stem, target.extension()))
        } else {
            candidate
        }
    }

    /// Builds ffmpeg arguments for a conversion.
    fn build_args(
        &self,
        input_path: &Path,
        output_path: &Path,
        target: TargetFormat,
        preset: QualityPreset,
    ) -> Vec<String> {
        let mut args = vec![
            "-y".to_string(), // Overwrite output
            "-i".to_string(),
            input_path.to_string_lossy().to_string(),
        ];

        if let Some((video_codec, audio_codec)) = target.video_codecs() {
            args.extend(["-c:v".to_string(), video_codec.to_string()]);
            match video_codec {
                "libx264" => args.extend([
                    "-crf".to_string(),
                    preset.crf().to_string(),
                    "-preset".to_string(),
                    preset.x264_preset().to_string(),
                ]),
                // VP9 constant quality mode needs a zero target bitrate
                "libvpx-vp9" => args.extend([
                    "-crf".to_string(),
                    (preset.crf() + 8).to_string(),
                    "-b:v".to_string(),
                    "0".to_string(),
                ]),
                _ => {}
            }
            args.extend([
                "-c:a".to_string(),
                audio_codec.to_string(),
                "-b:a".to_string(),
                VIDEO_AUDIO_BITRATE.to_string(),
            ]);
        } else if let Some(audio_codec) = target.audio_codec() {
            args.extend([
                "-vn".to_string(),
                "-c:a".to_string(),
                audio_codec.to_string(),
            ]);
            if target == TargetFormat::Mp3 {
                args.extend([
                    "-b:a".to_string(),
                    format!("{}k", preset.mp3_bitrate_kbps()),
                ]);
            }
        }

        // Log level and progress
        args.extend([
            "-loglevel".to_string(),
            self.config.ffmpeg_log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        args.extend(self.config.extra_ffmpeg_args.iter().cloned());
        args.push(output_path.to_string_lossy().to_string());
        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, TranscodeError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            width: Option<u32>,
            height: Option<u32>,
        }

        let probe: ProbeOutput = serde_json::from_str(output).map_err(|e| {
            TranscodeError::probe_failed(format!("Failed to parse ffprobe output: {}", e))
        })?;

        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes: probe
                .format
                .size
                .as_ref()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
            duration_secs: probe
                .format
                .duration
                .as_ref()
                .and_then(|d| d.parse::<f64>().ok())
                .unwrap_or(0.0),
            format: probe
                .format
                .format_name
                .split(',')
                .next()
                .unwrap_or("unknown")
                .to_string(),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
        })
    }

    /// Checks the request and resolves the target format and output path.
    fn prepare(&self, request: &TranscodeRequest) -> Result<(TargetFormat, PathBuf), TranscodeError> {
        if !request.input_path.is_file() {
            return Err(TranscodeError::InputNotFound {
                path: request.input_path.clone(),
            });
        }

        let input_ext = request
            .input_path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if !VIDEO_INPUT_FORMATS.contains(&input_ext.as_str())
            && !AUDIO_INPUT_FORMATS.contains(&input_ext.as_str())
        {
            return Err(TranscodeError::UnsupportedInputFormat { format: input_ext });
        }

        let target = TargetFormat::from_extension(&request.format_ext).ok_or_else(|| {
            TranscodeError::UnsupportedOutputFormat {
                format: request.format_ext.clone(),
            }
        })?;

        let output_path = Self::output_path(&request.input_path, &request.output_dir, target);
        Ok((target, output_path))
    }

    async fn run_transcode(
        &self,
        request: &TranscodeRequest,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<TranscodeSuccess>, TranscodeError> {
        let start = Instant::now();
        let (target, output_path) = self.prepare(request)?;
        let preset = QualityPreset::from_label(&request.quality);

        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|_| TranscodeError::OutputDirectoryFailed {
                path: request.output_dir.clone(),
            })?;

        // Get input duration for progress calculation
        let input_info = self.probe(&request.input_path).await.ok();
        let total_time = input_info
            .as_ref()
            .map(|i| i.duration_secs)
            .filter(|d| *d > 0.0);

        let args = self.build_args(&request.input_path, &output_path, target, preset);
        debug!(job_id = %request.job_id, ?args, "Spawning ffmpeg");

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfmpegNotFound {
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| TranscodeError::conversion_failed("stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();
        let mut current_time = 0.0;
        let mut error_output = String::new();
        let mut last_send = Instant::now();
        let progress_interval = Duration::from_millis(500);

        let deadline = tokio::time::sleep(Duration::from_secs(self.config.timeout_secs));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(job_id = %request.job_id, "Cancelling ffmpeg");
                    let _ = child.kill().await;
                    let _ = tokio::fs::remove_file(&output_path).await;
                    return Ok(Outcome::Cancelled);
                }
                _ = &mut deadline => {
                    warn!(job_id = %request.job_id, "ffmpeg timed out");
                    let _ = child.kill().await;
                    return Err(TranscodeError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    });
                }
                line = reader.next_line() => {
                    let Some(line) = line? else { break };

                    if line.contains("Error") || line.contains("error") {
                        error_output.push_str(&line);
                        error_output.push('\n');
                    }

                    // out_time_ms is in microseconds despite the name
                    if let Some(ms) = time_regex
                        .as_ref()
                        .and_then(|re| re.captures(&line))
                        .and_then(|caps| caps.get(1))
                        .and_then(|m| m.as_str().parse::<f64>().ok())
                    {
                        current_time = ms / 1_000_000.0;
                    }

                    if last_send.elapsed() >= progress_interval {
                        let fraction = match total_time {
                            Some(total) => (current_time / total).clamp(0.0, 1.0) as f32,
                            None => 0.0,
                        };
                        // Non-blocking send
                        let _ = progress_tx.try_send(TranscodeProgress {
                            fraction_complete: fraction,
                            current_time_seconds: current_time,
                            total_time_seconds: total_time,
                        });
                        last_send = Instant::now();
                    }
                }
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                let _ = tokio::fs::remove_file(&output_path).await;
                return Ok(Outcome::Cancelled);
            }
            status = child.wait() => status?,
        };

        if !status.success() {
            return Err(TranscodeError::conversion_failed(
                format!("FFmpeg exited with code: {:?}", status.code()),
                if error_output.is_empty() {
                    None
                } else {
                    Some(error_output)
                },
            ));
        }

        let output_meta = tokio::fs::metadata(&output_path)
            .await
            .map_err(|_| TranscodeError::conversion_failed("Output file not created", None))?;

        Ok(Outcome::Finished(TranscodeSuccess {
            output_path,
            output_size_bytes: output_meta.len(),
            duration_ms: start.elapsed().as_millis() as u64,
            input_format: input_info
                .map(|i| i.format)
                .unwrap_or_else(|| "unknown".to_string()),
            output_format: target.extension().to_string(),
        }))
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, TranscodeError> {
        if !path.exists() {
            return Err(TranscodeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let output = Command::new(&self.config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    TranscodeError::FfprobeNotFound {
                        path: self.config.ffprobe_path.clone(),
                    }
                } else {
                    TranscodeError::Io(e)
                }
            })?;

        if !output.status.success() {
            return Err(TranscodeError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        Self::parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))
    }

    async fn transcode(
        &self,
        request: TranscodeRequest,
        progress_tx: mpsc::Sender<TranscodeProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<TranscodeSuccess>, TranscodeError> {
        self.run_transcode(&request, progress_tx, cancel).await
    }

    async fn validate(&self) -> Result<(), TranscodeError> {
        for (binary, missing) in [
            (
                &self.config.ffmpeg_path,
                TranscodeError::FfmpegNotFound {
                    path: self.config.ffmpeg_path.clone(),
                },
            ),
            (
                &self.config.ffprobe_path,
                TranscodeError::FfprobeNotFound {
                    path: self.config.ffprobe_path.clone(),
                },
            ),
        ] {
            match Command::new(binary).arg("-version").output().await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(missing),
                Err(e) => return Err(TranscodeError::Io(e)),
            }
        }
        Ok(())
    }
}
