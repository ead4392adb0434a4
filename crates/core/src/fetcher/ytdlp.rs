//! yt-dlp based fetcher implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::config::FetcherConfig;
use super::error::FetchError;
use super::traits::Fetcher;
use super::types::{
    FetchProgress, FetchRequest, FetchSuccess, FormatDetails, FormatKind, MediaDetails, MediaKind,
    SubtitleOptions,
};
use crate::outcome::Outcome;

/// Prefix of the machine-readable progress lines we ask yt-dlp to print.
const PROGRESS_PREFIX: &str = "ytdl-progress ";
/// Prefix of the line carrying the final file path.
const FILE_PREFIX: &str = "ytdl-file ";

const PROGRESS_TEMPLATE: &str = "download:ytdl-progress %(progress.downloaded_bytes)s|%(progress.total_bytes)s|%(progress.total_bytes_estimate)s|%(progress.speed)s|%(progress.eta)s|%(progress.filename)s";
const FILE_TEMPLATE: &str = "after_move:ytdl-file %(filepath)s";

/// Upper bound for a metadata lookup.
const INFO_TIMEOUT: Duration = Duration::from_secs(60);

/// Stderr lines kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// Containers yt-dlp can remux into without re-encoding.
const REMUX_CONTAINERS: &[&str] = &["mp4", "mkv", "webm", "mov"];
/// Containers that need a re-encode.
const RECODE_CONTAINERS: &[&str] = &["avi"];
/// Formats produced by audio extraction.
const AUDIO_FORMATS: &[&str] = &["mp3", "wav", "flac", "m4a", "ogg", "aac", "opus"];

/// Fetcher that drives the `yt-dlp` command-line tool.
pub struct YtDlpFetcher {
    config: FetcherConfig,
    subtitles: SubtitleOptions,
    audio_quality: String,
}

impl YtDlpFetcher {
    /// Creates a new fetcher with the given configuration.
    pub fn new(config: FetcherConfig) -> Self {
        Self {
            config,
            subtitles: SubtitleOptions::default(),
            audio_quality: "192".to_string(),
        }
    }

    /// Creates a fetcher with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(FetcherConfig::default())
    }

    /// Sets subtitle handling for video fetches.
    pub fn with_subtitles(mut self, subtitles: SubtitleOptions) -> Self {
        self.subtitles = subtitles;
        self
    }

    /// Bitrate used when a video fetch asks for an audio format.
    pub fn with_audio_quality(mut self, audio_quality: impl Into<String>) -> Self {
        self.audio_quality = audio_quality.into();
        self
    }

    /// Maps a quality label and target format to a yt-dlp format selector.
    fn format_selector(quality: &str, format_ext: &str) -> String {
        let wants_audio = AUDIO_FORMATS.contains(&format_ext);
        let quality = quality.trim().to_ascii_lowercase();

        if quality == "audio only" || wants_audio {
            return "bestaudio/best".to_string();
        }

        match crate::platform::parse_height(&quality) {
            Some(height) => format!("best[height<={}]", height),
            None => "best".to_string(),
        }
    }

    /// yt-dlp wants an explicit unit for bitrates (`192K`); VBR levels pass through.
    fn audio_quality_arg(quality: &str) -> String {
        let trimmed = quality.trim();
        match trimmed.parse::<u32>() {
            Ok(kbps) if kbps > 10 => format!("{}K", kbps),
            _ => trimmed.to_string(),
        }
    }

    fn push_extract_audio(args: &mut Vec<String>, format_ext: &str, quality: &str) {
        args.extend([
            "-x".to_string(),
            "--audio-format".to_string(),
            format_ext.to_string(),
            "--audio-quality".to_string(),
            Self::audio_quality_arg(quality),
        ]);
    }

    fn spawn_error(&self, e: std::io::Error) -> FetchError {
        if e.kind() == std::io::ErrorKind::NotFound {
            FetchError::BinaryNotFound {
                path: self.config.ytdlp_path.clone(),
            }
        } else {
            FetchError::Io(e)
        }
    }

    /// Arguments for a metadata-only lookup.
    fn info_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-json".to_string(),
            "--skip-download".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    /// Parses the JSON document printed by `--dump-json`.
    fn parse_info_output(output: &str) -> Result<MediaDetails, FetchError> {
        #[derive(Deserialize)]
        struct InfoJson {
            title: Option<String>,
            uploader: Option<String>,
            artist: Option<String>,
            duration: Option<f64>,
            view_count: Option<u64>,
            thumbnail: Option<String>,
            upload_date: Option<String>,
            #[serde(default)]
            formats: Vec<FormatJson>,
        }

        #[derive(Deserialize)]
        struct FormatJson {
            format_id: String,
            #[serde(default)]
            ext: String,
            vcodec: Option<String>,
            acodec: Option<String>,
            height: Option<u32>,
            fps: Option<f64>,
            abr: Option<f64>,
            tbr: Option<f64>,
            filesize: Option<u64>,
            filesize_approx: Option<u64>,
        }

        fn has_stream(codec: &Option<String>) -> bool {
            codec.as_deref().is_some_and(|c| c != "none")
        }

        let document = output
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| FetchError::process_failed("yt-dlp printed no metadata", None))?;
        let info: InfoJson = serde_json::from_str(document).map_err(|e| {
            FetchError::process_failed(format!("Failed to parse yt-dlp metadata: {}", e), None)
        })?;

        let formats = info
            .formats
            .into_iter()
            .filter_map(|f| {
                let kind = match (has_stream(&f.vcodec), has_stream(&f.acodec)) {
                    (true, true) => FormatKind::Muxed,
                    (true, false) => FormatKind::VideoOnly,
                    (false, true) => FormatKind::AudioOnly,
                    (false, false) => return None,
                };
                Some(FormatDetails {
                    format_id: f.format_id,
                    ext: f.ext,
                    kind,
                    height: f.height,
                    fps: f.fps,
                    bitrate_kbps: f.abr.or(f.tbr),
                    filesize: f.filesize.or(f.filesize_approx),
                })
            })
            .collect();

        Ok(MediaDetails {
            title: info.title.unwrap_or_else(|| "Unknown".to_string()),
            uploader: info
                .uploader
                .or(info.artist)
                .unwrap_or_else(|| "Unknown".to_string()),
            duration_secs: info.duration,
            view_count: info.view_count,
            thumbnail: info.thumbnail,
            upload_date: info.upload_date,
            formats,
        })
    }

    /// Builds yt-dlp arguments for a request.
    fn build_args(&self, request: &FetchRequest) -> Vec<String> {
        let format_ext = request.format_ext.to_ascii_lowercase();
        let mut args = vec![
            "--newline".to_string(),
            "--no-simulate".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            PROGRESS_TEMPLATE.to_string(),
            "--print".to_string(),
            FILE_TEMPLATE.to_string(),
            "-o".to_string(),
            request
                .output_dir
                .join("%(title)s.%(ext)s")
                .to_string_lossy()
                .to_string(),
        ];

        match request.kind {
            MediaKind::Video => {
                args.extend([
                    "-f".to_string(),
                    Self::format_selector(&request.quality, &format_ext),
                ]);

                if AUDIO_FORMATS.contains(&format_ext.as_str()) {
                    Self::push_extract_audio(&mut args, &format_ext, &self.audio_quality);
                } else if REMUX_CONTAINERS.contains(&format_ext.as_str()) {
                    args.extend([
                        "--merge-output-format".to_string(),
                        format_ext.clone(),
                        "--remux-video".to_string(),
                        format_ext.clone(),
                    ]);
                } else if RECODE_CONTAINERS.contains(&format_ext.as_str()) {
                    args.extend(["--recode-video".to_string(), format_ext.clone()]);
                }

                if self.subtitles.enabled {
                    args.push("--write-subs".to_string());
                    if self.subtitles.auto_generated {
                        args.push("--write-auto-subs".to_string());
                    }
                    if !self.subtitles.languages.is_empty() {
                        args.extend([
                            "--sub-langs".to_string(),
                            self.subtitles.languages.join(","),
                        ]);
                    }
                }
            }
            MediaKind::Audio => {
                args.extend(["-f".to_string(), "bestaudio/best".to_string()]);
                Self::push_extract_audio(&mut args, &format_ext, &request.quality);

                if request.add_metadata {
                    args.extend([
                        "--add-metadata".to_string(),
                        "--write-info-json".to_string(),
                        "--write-thumbnail".to_string(),
                    ]);
                    if format_ext == "mp3" {
                        args.push("--embed-thumbnail".to_string());
                    }
                }
            }
        }

        args.extend(self.config.extra_args.iter().cloned());
        args.push("--".to_string());
        args.push(request.url.clone());
        args
    }

    /// Parses one of our progress template lines.
    fn parse_progress_line(line: &str) -> Option<FetchProgress> {
        let body = line.trim().strip_prefix(PROGRESS_PREFIX)?;
        let fields: Vec<&str> = body.splitn(6, '|').collect();
        if fields.len() != 6 {
            return None;
        }

        fn number(field: &str) -> Option<f64> {
            match field.trim() {
                "" | "NA" | "None" => None,
                value => value.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0),
            }
        }

        let bytes_done = number(fields[0]).map(|v| v as u64);
        let bytes_total = number(fields[1]).or_else(|| number(fields[2])).map(|v| v as u64);
        let fraction_complete = match (bytes_done, bytes_total) {
            (Some(done), Some(total)) if total > 0 => {
                Some((done as f64 / total as f64).clamp(0.0, 1.0) as f32)
            }
            _ => None,
        };

        let filename = fields[5].trim();
        let resolved_filename = match filename {
            "" | "NA" => None,
            path => PathBuf::from(path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string()),
        };

        Some(FetchProgress {
            fraction_complete,
            bytes_done,
            bytes_total,
            bytes_per_second: number(fields[3]),
            eta_seconds: number(fields[4]).map(|v| v as u64),
            resolved_filename,
        })
    }

    async fn run_fetch(
        &self,
        request: &FetchRequest,
        progress_tx: mpsc::Sender<FetchProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<FetchSuccess>, FetchError> {
        let start = Instant::now();

        if request.url.trim().is_empty() {
            return Err(FetchError::invalid_request("URL is empty"));
        }

        tokio::fs::create_dir_all(&request.output_dir)
            .await
            .map_err(|_| FetchError::OutputDirectoryFailed {
                path: request.output_dir.clone(),
            })?;

        let args = self.build_args(request);
        debug!(job_id = %request.job_id, ?args, "Spawning yt-dlp");

        let mut child = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| FetchError::process_failed("stdout was not captured", None))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| FetchError::process_failed("stderr was not captured", None))?;
        let stderr_task = tokio::spawn(collect_tail(stderr, STDERR_TAIL_LINES));

        let mut lines = BufReader::new(stdout).lines();
        let mut final_path: Option<PathBuf> = None;
        let mut last_filename: Option<String> = None;
        let mut last_send = Instant::now();
        let progress_interval = Duration::from_millis(500);

        let deadline = tokio::time::sleep(Duration::from_secs(self.config.timeout_secs));
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!(job_id = %request.job_id, "Cancelling yt-dlp");
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Ok(Outcome::Cancelled);
                }
                _ = &mut deadline => {
                    warn!(job_id = %request.job_id, "yt-dlp timed out");
                    let _ = child.kill().await;
                    stderr_task.abort();
                    return Err(FetchError::Timeout {
                        timeout_secs: self.config.timeout_secs,
                    });
                }
                line = lines.next_line() => {
                    let Some(line) = line? else { break };

                    if let Some(path) = line.trim().strip_prefix(FILE_PREFIX) {
                        final_path = Some(PathBuf::from(path.trim()));
                        continue;
                    }

                    if let Some(progress) = Self::parse_progress_line(&line) {
                        let new_filename = progress.resolved_filename.is_some()
                            && progress.resolved_filename != last_filename;
                        if new_filename {
                            last_filename = progress.resolved_filename.clone();
                        }
                        if new_filename || last_send.elapsed() >= progress_interval {
                            // Non-blocking send
                            let _ = progress_tx.try_send(progress);
                            last_send = Instant::now();
                        }
                    }
                }
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = child.kill().await;
                stderr_task.abort();
                return Ok(Outcome::Cancelled);
            }
            status = child.wait() => status?,
        };
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(FetchError::process_failed(
                format!("yt-dlp exited with code: {:?}", status.code()),
                if stderr_output.is_empty() {
                    None
                } else {
                    Some(stderr_output)
                },
            ));
        }

        let filename = final_path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().to_string())
            .or(last_filename);

        Ok(Outcome::Finished(FetchSuccess {
            output_path: final_path,
            filename,
            duration_ms: start.elapsed().as_millis() as u64,
        }))
    }
}

/// Reads a stream to the end, keeping the last `max_lines` lines.
async fn collect_tail<R: AsyncRead + Unpin>(stream: R, max_lines: usize) -> String {
    let mut lines = BufReader::new(stream).lines();
    let mut tail: std::collections::VecDeque<String> = std::collections::VecDeque::new();
    while let Ok(Some(line)) = lines.next_line().await {
        if tail.len() == max_lines {
            tail.pop_front();
        }
        tail.push_back(line);
    }
    tail.into_iter().collect::<Vec<_>>().join("\n")
}

#[async_trait]
impl Fetcher for YtDlpFetcher {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn fetch(
        &self,
        request: FetchRequest,
        progress_tx: mpsc::Sender<FetchProgress>,
        cancel: CancellationToken,
    ) -> Result<Outcome<FetchSuccess>, FetchError> {
        self.run_fetch(&request, progress_tx, cancel).await
    }

    async fn info(&self, url: &str) -> Result<MediaDetails, FetchError> {
        if url.trim().is_empty() {
            return Err(FetchError::invalid_request("URL is empty"));
        }

        let args = self.info_args(url);
        debug!(url, "Reading metadata with yt-dlp");

        let output = Command::new(&self.config.ytdlp_path)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(INFO_TIMEOUT, output)
            .await
            .map_err(|_| FetchError::Timeout {
                timeout_secs: INFO_TIMEOUT.as_secs(),
            })?
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(FetchError::process_failed(
                format!("yt-dlp exited with code: {:?}", output.status.code()),
                if stderr.trim().is_empty() { None } else { Some(stderr) },
            ));
        }

        Self::parse_info_output(&String::from_utf8_lossy(&output.stdout))
    }

    async fn validate(&self) -> Result<(), FetchError> {
        let output = Command::new(&self.config.ytdlp_path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(FetchError::process_failed(
                "yt-dlp --version failed",
                Some(String::from_utf8_lossy(&output.stderr).to_string()),
            ));
        }

        debug!(
            version = %String::from_utf8_lossy(&output.stdout).trim(),
            "yt-dlp available"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(kind: MediaKind, quality: &str, format_ext: &str) -> FetchRequest {
        FetchRequest {
            job_id: "video_1_1".to_string(),
            url: "https://vimeo.com/123".to_string(),
            output_dir: PathBuf::from("/downloads"),
            kind,
            quality: quality.to_string(),
            format_ext: format_ext.to_string(),
            add_metadata: false,
        }
    }

    fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_format_selector() {
        assert_eq!(YtDlpFetcher::format_selector("best", "mp4"), "best");
        assert_eq!(YtDlpFetcher::format_selector("720p", "mp4"), "best[height<=720]");
        assert_eq!(YtDlpFetcher::format_selector("Audio Only", "mp4"), "bestaudio/best");
        assert_eq!(YtDlpFetcher::format_selector("1080p", "mp3"), "bestaudio/best");
    }

    #[test]
    fn test_build_video_args() {
        let fetcher = YtDlpFetcher::with_defaults();
        let args = fetcher.build_args(&request(MediaKind::Video, "720p", "mkv"));

        assert_eq!(value_after(&args, "-f"), Some("best[height<=720]"));
        assert_eq!(value_after(&args, "--remux-video"), Some("mkv"));
        assert_eq!(value_after(&args, "-o"), Some("/downloads/%(title)s.%(ext)s"));
        assert_eq!(args.last().map(String::as_str), Some("https://vimeo.com/123"));
        assert!(!args.contains(&"--write-subs".to_string()));
    }

    #[test]
    fn test_build_video_args_with_subtitles() {
        let fetcher = YtDlpFetcher::with_defaults().with_subtitles(SubtitleOptions {
            enabled: true,
            auto_generated: true,
            languages: vec!["en".to_string(), "de".to_string()],
        });
        let args = fetcher.build_args(&request(MediaKind::Video, "best", "mp4"));

        assert!(args.contains(&"--write-subs".to_string()));
        assert!(args.contains(&"--write-auto-subs".to_string()));
        assert_eq!(value_after(&args, "--sub-langs"), Some("en,de"));
    }

    #[test]
    fn test_build_video_args_audio_target() {
        let fetcher = YtDlpFetcher::with_defaults().with_audio_quality("320");
        let args = fetcher.build_args(&request(MediaKind::Video, "best", "mp3"));

        assert!(args.contains(&"-x".to_string()));
        assert_eq!(value_after(&args, "--audio-format"), Some("mp3"));
        assert_eq!(value_after(&args, "--audio-quality"), Some("320K"));
    }

    #[test]
    fn test_build_audio_args_with_metadata() {
        let fetcher = YtDlpFetcher::with_defaults();
        let mut req = request(MediaKind::Audio, "192", "mp3");
        req.add_metadata = true;
        let args = fetcher.build_args(&req);

        assert_eq!(value_after(&args, "-f"), Some("bestaudio/best"));
        assert_eq!(value_after(&args, "--audio-quality"), Some("192K"));
        assert!(args.contains(&"--add-metadata".to_string()));
        assert!(args.contains(&"--embed-thumbnail".to_string()));

        req.format_ext = "flac".to_string();
        let args = fetcher.build_args(&req);
        assert!(args.contains(&"--write-thumbnail".to_string()));
        assert!(!args.contains(&"--embed-thumbnail".to_string()));
    }

    #[test]
    fn test_parse_progress_line() {
        let line = "ytdl-progress 512|1024|NA|2048.5|3|/downloads/Some Title.f137.mp4";
        let progress = YtDlpFetcher::parse_progress_line(line).unwrap();
        assert_eq!(progress.bytes_done, Some(512));
        assert_eq!(progress.bytes_total, Some(1024));
        assert_eq!(progress.fraction_complete, Some(0.5));
        assert_eq!(progress.bytes_per_second, Some(2048.5));
        assert_eq!(progress.eta_seconds, Some(3));
        assert_eq!(
            progress.resolved_filename.as_deref(),
            Some("Some Title.f137.mp4")
        );
    }

    #[test]
    fn test_parse_progress_line_uses_estimate() {
        let line = "ytdl-progress 250|NA|1000.0|NA|NA|NA";
        let progress = YtDlpFetcher::parse_progress_line(line).unwrap();
        assert_eq!(progress.bytes_total, Some(1000));
        assert_eq!(progress.fraction_complete, Some(0.25));
        assert_eq!(progress.bytes_per_second, None);
        assert_eq!(progress.resolved_filename, None);
    }

    #[test]
    fn test_parse_progress_ignores_other_output() {
        assert!(YtDlpFetcher::parse_progress_line("[youtube] abc: Downloading webpage").is_none());
        assert!(YtDlpFetcher::parse_progress_line("ytdl-progress 1|2").is_none());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = YtDlpFetcher::new(FetcherConfig::with_path(PathBuf::from(
            "/nonexistent/yt-dlp-binary",
        )));
        let (tx, _rx) = mpsc::channel(8);
        let mut req = request(MediaKind::Video, "best", "mp4");
        req.output_dir = dir.path().to_path_buf();

        let result = fetcher.fetch(req, tx, CancellationToken::new()).await;
        assert!(matches!(result, Err(FetchError::BinaryNotFound { .. })));
        assert!(matches!(
            fetcher.validate().await,
            Err(FetchError::BinaryNotFound { .. })
        ));
    }

    #[test]
    fn test_info_args() {
        let fetcher = YtDlpFetcher::with_defaults();
        let args = fetcher.info_args("https://vimeo.com/123");

        assert!(args.contains(&"--dump-json".to_string()));
        assert!(args.contains(&"--skip-download".to_string()));
        assert!(!args.contains(&"--no-simulate".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("https://vimeo.com/123"));
    }

    #[test]
    fn test_parse_info_output() {
        let json = r#"{
            "title": "Some Title",
            "uploader": "Some Channel",
            "duration": 212.5,
            "view_count": 1000,
            "upload_date": "20240131",
            "formats": [
                {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none"},
                {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5, "filesize": 3400000},
                {"format_id": "137", "ext": "mp4", "vcodec": "avc1.640028", "acodec": "none", "height": 1080, "fps": 30.0, "filesize_approx": 52000000},
                {"format_id": "18", "ext": "mp4", "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "height": 360, "tbr": 600.0}
            ]
        }"#
        .replace('\n', " ");

        let details = YtDlpFetcher::parse_info_output(&json).unwrap();
        assert_eq!(details.title, "Some Title");
        assert_eq!(details.uploader, "Some Channel");
        assert_eq!(details.duration_secs, Some(212.5));
        assert_eq!(details.upload_date.as_deref(), Some("20240131"));

        assert_eq!(details.formats.len(), 3);
        assert_eq!(details.formats[0].kind, FormatKind::AudioOnly);
        assert_eq!(details.formats[0].bitrate_kbps, Some(129.5));
        assert_eq!(details.formats[1].kind, FormatKind::VideoOnly);
        assert_eq!(details.formats[1].height, Some(1080));
        assert_eq!(details.formats[1].filesize, Some(52_000_000));
        assert_eq!(details.formats[2].kind, FormatKind::Muxed);
    }

    #[test]
    fn test_parse_info_output_defaults_and_errors() {
        let details = YtDlpFetcher::parse_info_output(r#"{"artist": "Band"}"#).unwrap();
        assert_eq!(details.title, "Unknown");
        assert_eq!(details.uploader, "Band");
        assert!(details.formats.is_empty());

        assert!(YtDlpFetcher::parse_info_output("").is_err());
        assert!(YtDlpFetcher::parse_info_output("not json").is_err());
    }

    #[tokio::test]
    async fn test_info_missing_binary() {
        let fetcher = YtDlpFetcher::new(FetcherConfig::with_path(PathBuf::from(
            "/nonexistent/yt-dlp-binary",
        )));
        assert!(matches!(
            fetcher.info("https://vimeo.com/123").await,
            Err(FetchError::BinaryNotFound { .. })
        ));
        assert!(matches!(
            fetcher.info("  ").await,
            Err(FetchError::InvalidRequest { .. })
        ));
    }
}
