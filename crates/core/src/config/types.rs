use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::fetcher::{FetcherConfig, SubtitleOptions};
use crate::scheduler::SchedulerConfig;
use crate::transcoder::TranscoderConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub downloads: DownloadsConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub transcoder: TranscoderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Defaults applied to submitted jobs and to the fetcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadsConfig {
    /// Where downloads land when a request does not name a directory.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_video_quality")]
    pub video_quality: String,
    #[serde(default = "default_video_format")]
    pub video_format: String,
    /// Audio bitrate in kbps.
    #[serde(default = "default_audio_quality")]
    pub audio_quality: String,
    #[serde(default = "default_audio_format")]
    pub audio_format: String,
    #[serde(default)]
    pub download_subtitles: bool,
    #[serde(default)]
    pub download_auto_subtitles: bool,
    #[serde(default = "default_subtitle_languages")]
    pub subtitle_languages: Vec<String>,
}

impl Default for DownloadsConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            video_quality: default_video_quality(),
            video_format: default_video_format(),
            audio_quality: default_audio_quality(),
            audio_format: default_audio_format(),
            download_subtitles: false,
            download_auto_subtitles: false,
            subtitle_languages: default_subtitle_languages(),
        }
    }
}

impl DownloadsConfig {
    /// Subtitle settings handed to the fetcher.
    pub fn subtitle_options(&self) -> SubtitleOptions {
        SubtitleOptions {
            enabled: self.download_subtitles,
            auto_generated: self.download_auto_subtitles,
            languages: self.subtitle_languages.clone(),
        }
    }
}

fn default_directory() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join("Downloads").join("YTDL"),
        None => PathBuf::from("downloads"),
    }
}

fn default_video_quality() -> String {
    "best".to_string()
}

fn default_video_format() -> String {
    "mp4".to_string()
}

fn default_audio_quality() -> String {
    "192".to_string()
}

fn default_audio_format() -> String {
    "mp3".to_string()
}

fn default_subtitle_languages() -> Vec<String> {
    vec!["en".to_string()]
}

/// Config for API responses: tool arguments are summarised, not echoed.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub scheduler: SchedulerConfig,
    pub downloads: DownloadsConfig,
    pub fetcher: SanitizedToolConfig,
    pub transcoder: SanitizedToolConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedToolConfig {
    pub binary: String,
    pub timeout_secs: u64,
    pub extra_args_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            scheduler: config.scheduler.clone(),
            downloads: config.downloads.clone(),
            fetcher: SanitizedToolConfig {
                binary: config.fetcher.ytdlp_path.display().to_string(),
                timeout_secs: config.fetcher.timeout_secs,
                extra_args_configured: !config.fetcher.extra_args.is_empty(),
            },
            transcoder: SanitizedToolConfig {
                binary: config.transcoder.ffmpeg_path.display().to_string(),
                timeout_secs: config.transcoder.timeout_secs,
                extra_args_configured: !config.transcoder.extra_ffmpeg_args.is_empty(),
            },
        }
    }
}
