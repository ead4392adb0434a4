//! Built-in platform table.
//!
//! Order matters: identification is first-match, so specific platforms come
//! before broad ones and the generic fallback is always last.

use tracing::error;

use super::types::{Capability, ContentCategory, MaxQuality, PlatformDefinition};

use Capability::{Album, Audio, Live, Playlist, Stories, Subtitles, Video};
use ContentCategory as Cat;

struct Entry {
    id: &'static str,
    name: &'static str,
    domains: &'static [&'static str],
    patterns: &'static [&'static str],
    supports: &'static [Capability],
    max_quality: MaxQuality,
    formats: &'static [&'static str],
    category: ContentCategory,
}

const P1080: MaxQuality = MaxQuality::Height(1080);
const P720: MaxQuality = MaxQuality::Height(720);
const NA: MaxQuality = MaxQuality::NotApplicable;
const MP4_MP3: &[&str] = &["mp4", "mp3"];

const ENTRIES: &[Entry] = &[
    Entry {
        id: "youtube",
        name: "YouTube",
        domains: &["youtube.com", "youtu.be", "m.youtube.com", "music.youtube.com"],
        patterns: &[
            r"(?:youtube\.com/watch\?v=|youtu\.be/|youtube\.com/embed/)([a-zA-Z0-9_-]{11})",
            r"youtube\.com/playlist\?list=([a-zA-Z0-9_-]+)",
            r"music\.youtube\.com/watch\?v=([a-zA-Z0-9_-]{11})",
        ],
        supports: &[Video, Audio, Playlist, Subtitles, Live],
        max_quality: MaxQuality::Height(4320),
        formats: &["mp4", "webm", "mkv", "mp3", "wav", "flac", "m4a", "ogg"],
        category: Cat::Video,
    },
    Entry {
        id: "vimeo",
        name: "Vimeo",
        domains: &["vimeo.com"],
        patterns: &[r"vimeo\.com/(\d+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Video,
    },
    Entry {
        id: "dailymotion",
        name: "Dailymotion",
        domains: &["dailymotion.com"],
        patterns: &[r"dailymotion\.com/video/([a-zA-Z0-9]+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Video,
    },
    Entry {
        id: "instagram",
        name: "Instagram",
        domains: &["instagram.com"],
        patterns: &[
            r"instagram\.com/p/([a-zA-Z0-9_-]+)",
            r"instagram\.com/reel/([a-zA-Z0-9_-]+)",
            r"instagram\.com/tv/([a-zA-Z0-9_-]+)",
        ],
        supports: &[Video, Audio, Stories],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Social,
    },
    Entry {
        id: "tiktok",
        name: "TikTok",
        domains: &["tiktok.com", "vm.tiktok.com"],
        patterns: &[r"tiktok\.com/@[^/]+/video/(\d+)", r"vm\.tiktok\.com/([a-zA-Z0-9]+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Social,
    },
    Entry {
        id: "facebook",
        name: "Facebook",
        domains: &["facebook.com", "fb.watch"],
        patterns: &[
            r"facebook\.com/watch/?\?v=(\d+)",
            r"facebook\.com/[^/]+/videos/(\d+)",
            r"fb\.watch/([a-zA-Z0-9_-]+)",
        ],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Social,
    },
    Entry {
        id: "twitter",
        name: "Twitter/X",
        domains: &["twitter.com", "x.com"],
        patterns: &[r"(?:twitter|x)\.com/[^/]+/status/(\d+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Social,
    },
    Entry {
        id: "twitch",
        name: "Twitch",
        domains: &["twitch.tv"],
        patterns: &[r"twitch\.tv/videos/(\d+)", r"twitch\.tv/[^/]+/clip/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio, Live],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Streaming,
    },
    Entry {
        id: "pornhub",
        name: "Pornhub",
        domains: &["pornhub.com"],
        patterns: &[r"pornhub\.com/view_video\.php\?viewkey=([a-zA-Z0-9]+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Adult,
    },
    Entry {
        id: "xvideos",
        name: "XVideos",
        domains: &["xvideos.com"],
        patterns: &[r"xvideos\.com/video(\d+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Adult,
    },
    Entry {
        id: "xhamster",
        name: "xHamster",
        domains: &["xhamster.com"],
        patterns: &[r"xhamster\.com/videos/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Adult,
    },
    Entry {
        id: "soundcloud",
        name: "SoundCloud",
        domains: &["soundcloud.com"],
        patterns: &[r"soundcloud\.com/[^/]+/[^/]+"],
        supports: &[Audio, Playlist],
        max_quality: NA,
        formats: &["mp3", "wav", "flac", "m4a"],
        category: Cat::Audio,
    },
    Entry {
        id: "bandcamp",
        name: "Bandcamp",
        domains: &["bandcamp.com"],
        patterns: &[r"[^.]+\.bandcamp\.com/track/[^/]+"],
        supports: &[Audio, Album],
        max_quality: NA,
        formats: &["mp3", "wav", "flac"],
        category: Cat::Audio,
    },
    Entry {
        id: "mixcloud",
        name: "Mixcloud",
        domains: &["mixcloud.com"],
        patterns: &[r"mixcloud\.com/[^/]+/[^/]+"],
        supports: &[Audio],
        max_quality: NA,
        formats: &["mp3", "m4a"],
        category: Cat::Audio,
    },
    Entry {
        id: "ted",
        name: "TED Talks",
        domains: &["ted.com"],
        patterns: &[r"ted\.com/talks/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio, Subtitles],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Educational,
    },
    Entry {
        id: "coursera",
        name: "Coursera",
        domains: &["coursera.org"],
        patterns: &[r"coursera\.org/learn/[^/]+/lecture/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio, Subtitles],
        max_quality: P720,
        formats: MP4_MP3,
        category: Cat::Educational,
    },
    Entry {
        id: "kick",
        name: "Kick",
        domains: &["kick.com"],
        patterns: &[r"kick\.com/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio, Live],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Streaming,
    },
    Entry {
        id: "rumble",
        name: "Rumble",
        domains: &["rumble.com"],
        patterns: &[r"rumble\.com/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Video,
    },
    Entry {
        id: "bilibili",
        name: "Bilibili",
        domains: &["bilibili.com"],
        patterns: &[r"bilibili\.com/video/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio, Subtitles],
        max_quality: P1080,
        formats: MP4_MP3,
        category: Cat::Video,
    },
    Entry {
        id: "niconico",
        name: "Niconico",
        domains: &["nicovideo.jp"],
        patterns: &[r"nicovideo\.jp/watch/([a-zA-Z0-9_-]+)"],
        supports: &[Video, Audio],
        max_quality: P720,
        formats: MP4_MP3,
        category: Cat::Video,
    },
];

/// Number of non-fallback platforms in the built-in table.
#[cfg(test)]
pub(crate) const BUILTIN_PLATFORM_COUNT: usize = ENTRIES.len();

/// Builds the built-in definitions followed by the generic fallback.
pub(crate) fn builtin_definitions() -> Vec<PlatformDefinition> {
    let mut definitions: Vec<PlatformDefinition> = ENTRIES
        .iter()
        .filter_map(|entry| {
            PlatformDefinition::new(entry.id, entry.name)
                .with_domains(entry.domains)
                .with_patterns(entry.patterns)
                .map(|def| {
                    def.with_supports(entry.supports)
                        .with_max_quality(entry.max_quality)
                        .with_formats(entry.formats)
                        .with_category(entry.category)
                })
                .map_err(|e| error!(platform = entry.id, "Skipping built-in platform: {}", e))
                .ok()
        })
        .collect();

    definitions.push(generic_fallback());
    definitions
}

/// Best-effort descriptor for any http(s) URL yt-dlp might handle.
pub(crate) fn generic_fallback() -> PlatformDefinition {
    PlatformDefinition::new("generic", "Generic (yt-dlp supported)")
        .with_supports(&[Video, Audio])
        .with_max_quality(P1080)
        .with_formats(&["mp4", "mp3", "webm", "mkv"])
        .as_fallback()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_builtin_patterns_compile() {
        let definitions = builtin_definitions();
        assert_eq!(definitions.len(), BUILTIN_PLATFORM_COUNT + 1);

        for (def, entry) in definitions.iter().zip(ENTRIES) {
            assert_eq!(def.id, entry.id);
            assert_eq!(def.pattern_count(), entry.patterns.len(), "{}", entry.id);
        }
    }

    #[test]
    fn test_fallback_is_last() {
        let definitions = builtin_definitions();
        let last = definitions.last().unwrap();
        assert!(last.fallback);
        assert_eq!(last.id, "generic");
        assert_eq!(definitions.iter().filter(|d| d.fallback).count(), 1);
    }

    #[test]
    fn test_adult_platforms_tagged() {
        let adult: Vec<_> = builtin_definitions()
            .into_iter()
            .filter(|d| d.category == ContentCategory::Adult)
            .map(|d| d.id)
            .collect();
        assert_eq!(adult, vec!["pornhub", "xvideos", "xhamster"]);
    }
}
