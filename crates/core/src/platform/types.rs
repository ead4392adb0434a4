//! Types for the platform module.

use regex_lite::Regex;
use serde::{Serialize, Serializer};
use std::fmt;

use super::error::ResolveError;

/// A download mode a platform supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Video,
    Audio,
    Playlist,
    Subtitles,
    Live,
    Stories,
    Album,
}

/// Broad content category used for grouping and restriction checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Video,
    Audio,
    Social,
    Streaming,
    Educational,
    Adult,
    Other,
}

/// Highest resolution a platform serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxQuality {
    /// Vertical resolution ceiling in pixels (e.g. 1080 for "1080p").
    Height(u32),
    /// Audio-only platforms have no resolution ceiling.
    NotApplicable,
}

impl MaxQuality {
    /// Returns the height ceiling, if any.
    pub fn height(&self) -> Option<u32> {
        match self {
            Self::Height(h) => Some(*h),
            Self::NotApplicable => None,
        }
    }
}

impl fmt::Display for MaxQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Height(h) => write!(f, "{}p", h),
            Self::NotApplicable => write!(f, "N/A"),
        }
    }
}

impl Serialize for MaxQuality {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// A registered platform: how to recognise its URLs and what it offers.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Stable identifier (e.g. "youtube").
    pub id: String,
    /// Display name (e.g. "YouTube").
    pub name: String,
    /// Host suffixes that identify the platform.
    pub domains: Vec<String>,
    /// Case-insensitive URL patterns that identify the platform.
    pub(crate) patterns: Vec<Regex>,
    /// Supported download modes.
    pub supports: Vec<Capability>,
    /// Resolution ceiling.
    pub max_quality: MaxQuality,
    /// Allowed output formats.
    pub formats: Vec<String>,
    /// Content category.
    pub category: ContentCategory,
    /// Whether this is the best-effort fallback for unrecognised URLs.
    pub fallback: bool,
}

impl PlatformDefinition {
    /// Creates an empty definition; fill it in with the `with_*` builders.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            domains: Vec::new(),
            patterns: Vec::new(),
            supports: vec![Capability::Video, Capability::Audio],
            max_quality: MaxQuality::Height(1080),
            formats: vec!["mp4".to_string(), "mp3".to_string()],
            category: ContentCategory::Other,
            fallback: false,
        }
    }

    pub fn with_domains(mut self, domains: &[&str]) -> Self {
        self.domains = domains.iter().map(|d| d.to_ascii_lowercase()).collect();
        self
    }

    /// Adds URL patterns. Patterns are matched case-insensitively.
    pub fn with_patterns(mut self, patterns: &[&str]) -> Result<Self, ResolveError> {
        for pattern in patterns {
            let compiled = Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
                ResolveError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                }
            })?;
            self.patterns.push(compiled);
        }
        Ok(self)
    }

    pub fn with_supports(mut self, supports: &[Capability]) -> Self {
        self.supports = supports.to_vec();
        self
    }

    pub fn with_max_quality(mut self, max_quality: MaxQuality) -> Self {
        self.max_quality = max_quality;
        self
    }

    pub fn with_formats(mut self, formats: &[&str]) -> Self {
        self.formats = formats.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_category(mut self, category: ContentCategory) -> Self {
        self.category = category;
        self
    }

    pub fn as_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }

    /// Number of compiled patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Whether `host` (already stripped of "www.") belongs to this platform.
    pub(crate) fn matches_host(&self, host: &str) -> bool {
        self.domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)))
    }

    pub(crate) fn matches_pattern(&self, url: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(url))
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.supports.contains(&capability)
    }

    pub(crate) fn to_info(&self) -> PlatformInfo {
        PlatformInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            supports: self.supports.clone(),
            max_quality: self.max_quality,
            formats: self.formats.clone(),
            category: self.category,
            fallback: self.fallback,
        }
    }
}

/// Resolved platform descriptor returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformInfo {
    pub id: String,
    pub name: String,
    pub supports: Vec<Capability>,
    pub max_quality: MaxQuality,
    pub formats: Vec<String>,
    pub category: ContentCategory,
    pub fallback: bool,
}

impl PlatformInfo {
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.supports.contains(&capability)
    }

    pub fn is_restricted(&self) -> bool {
        self.category == ContentCategory::Adult
    }
}

/// Capabilities of the platform a URL belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformCapabilities {
    pub platform: String,
    pub supports: Vec<Capability>,
    pub max_quality: MaxQuality,
    pub formats: Vec<String>,
}

impl From<&PlatformInfo> for PlatformCapabilities {
    fn from(info: &PlatformInfo) -> Self {
        Self {
            platform: info.name.clone(),
            supports: info.supports.clone(),
            max_quality: info.max_quality,
            formats: info.formats.clone(),
        }
    }
}

/// Recommended download options for a URL, used to populate quality pickers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadOptions {
    pub qualities: Vec<String>,
    pub formats: Vec<String>,
    pub supports_subtitles: bool,
    pub supports_playlist: bool,
    pub recommended_format: String,
    pub recommended_quality: String,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            qualities: ["Best", "1080p", "720p", "480p", "360p", "Audio Only"]
                .iter()
                .map(|q| q.to_string())
                .collect(),
            formats: vec!["mp4".to_string(), "mp3".to_string()],
            supports_subtitles: false,
            supports_playlist: false,
            recommended_format: "mp4".to_string(),
            recommended_quality: "720p".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_quality_display() {
        assert_eq!(MaxQuality::Height(1080).to_string(), "1080p");
        assert_eq!(MaxQuality::NotApplicable.to_string(), "N/A");
    }

    #[test]
    fn test_max_quality_serializes_as_label() {
        let json = serde_json::to_string(&MaxQuality::Height(4320)).unwrap();
        assert_eq!(json, "\"4320p\"");
    }

    #[test]
    fn test_domain_match_respects_labels() {
        let def = PlatformDefinition::new("vimeo", "Vimeo").with_domains(&["vimeo.com"]);
        assert!(def.matches_host("vimeo.com"));
        assert!(def.matches_host("player.vimeo.com"));
        assert!(!def.matches_host("notvimeo.com"));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = PlatformDefinition::new("bad", "Bad").with_patterns(&["(unclosed"]);
        assert!(matches!(result, Err(ResolveError::InvalidPattern { .. })));
    }

    #[test]
    fn test_patterns_are_case_insensitive() {
        let def = PlatformDefinition::new("ted", "TED Talks")
            .with_patterns(&[r"ted\.com/talks/([a-zA-Z0-9_-]+)"])
            .unwrap();
        assert!(def.matches_pattern("https://TED.COM/talks/some_talk"));
    }
}
