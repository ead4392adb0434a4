//! Platform registry: the table of known platforms and the lookups over it.

use std::collections::BTreeMap;

use super::builtin::builtin_definitions;
use super::resolver::{normalize_url, PlatformResolver};
use super::types::{
    Capability, ContentCategory, DownloadOptions, MaxQuality, PlatformCapabilities,
    PlatformDefinition, PlatformInfo,
};

/// Resolution ladder offered in quality pickers, highest first.
const QUALITY_LADDER: [u32; 8] = [4320, 2160, 1440, 1080, 720, 480, 360, 240];

/// Ordered set of platform definitions.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    definitions: Vec<PlatformDefinition>,
}

impl PlatformRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in platform plus the generic fallback.
    pub fn builtin() -> Self {
        Self {
            definitions: builtin_definitions(),
        }
    }

    /// Appends a definition. Earlier registrations win ties.
    pub fn register(&mut self, definition: PlatformDefinition) {
        self.definitions.push(definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn definitions(&self) -> &[PlatformDefinition] {
        &self.definitions
    }

    fn find(&self, url: &str) -> Option<&PlatformDefinition> {
        let normalized = normalize_url(url)?;

        let specific = self.definitions.iter().filter(|d| !d.fallback).find(|d| {
            d.matches_host(&normalized.host) || d.matches_pattern(&normalized.text)
        });
        if specific.is_some() {
            return specific;
        }

        if normalized.scheme == "http" || normalized.scheme == "https" {
            return self.definitions.iter().find(|d| d.fallback);
        }
        None
    }

    /// Capabilities of the platform serving `url`.
    pub fn capabilities_for(&self, url: &str) -> Option<PlatformCapabilities> {
        self.identify(url).map(|info| PlatformCapabilities::from(&info))
    }

    /// Quality and format choices for `url`.
    ///
    /// URLs no platform accepts get the default option set.
    pub fn download_options(&self, url: &str) -> DownloadOptions {
        let Some(info) = self.identify(url) else {
            return DownloadOptions::default();
        };

        let recommended_format = if info.has_capability(Capability::Video) {
            "mp4"
        } else {
            "mp3"
        };

        DownloadOptions {
            qualities: quality_options(info.max_quality),
            formats: info.formats.clone(),
            supports_subtitles: info.has_capability(Capability::Subtitles),
            supports_playlist: info.has_capability(Capability::Playlist),
            recommended_format: recommended_format.to_string(),
            recommended_quality: recommended_quality(&info.id).to_string(),
        }
    }

    /// Display names grouped by category. The fallback is not listed.
    pub fn platforms_by_category(&self) -> BTreeMap<ContentCategory, Vec<String>> {
        let mut grouped: BTreeMap<ContentCategory, Vec<String>> = BTreeMap::new();
        for def in self.definitions.iter().filter(|d| !d.fallback) {
            grouped.entry(def.category).or_default().push(def.name.clone());
        }
        grouped
    }

    /// Whether `url` belongs to a platform in the adult category.
    pub fn is_restricted_content(&self, url: &str) -> bool {
        self.find(url)
            .map(|d| d.category == ContentCategory::Adult)
            .unwrap_or(false)
    }

    /// Platform information for every registered definition.
    pub fn platforms(&self) -> Vec<PlatformInfo> {
        self.definitions.iter().map(PlatformDefinition::to_info).collect()
    }
}

impl PlatformResolver for PlatformRegistry {
    fn identify(&self, url: &str) -> Option<PlatformInfo> {
        self.find(url).map(PlatformDefinition::to_info)
    }

    fn supported_platforms(&self, include_restricted: bool, include_generic: bool) -> Vec<String> {
        self.definitions
            .iter()
            .filter(|d| include_generic || !d.fallback)
            .filter(|d| include_restricted || d.category != ContentCategory::Adult)
            .map(|d| d.name.clone())
            .collect()
    }
}

/// Quality labels offered for a resolution ceiling.
pub fn quality_options(max_quality: MaxQuality) -> Vec<String> {
    let mut options = vec!["Best".to_string()];
    if let Some(ceiling) = max_quality.height() {
        options.extend(
            QUALITY_LADDER
                .iter()
                .filter(|h| **h <= ceiling)
                .map(|h| format!("{}p", h)),
        );
    }
    options.push("Audio Only".to_string());
    options
}

/// Lowers a `NNNp` request above the platform ceiling to the ceiling.
///
/// Anything that is not a height request passes through unchanged.
pub fn clamp_quality(info: &PlatformInfo, requested: &str) -> String {
    let Some(ceiling) = info.max_quality.height() else {
        return requested.to_string();
    };

    match parse_height(requested) {
        Some(height) if height > ceiling => format!("{}p", ceiling),
        _ => requested.to_string(),
    }
}

/// Parses a height label such as `720p` or `1080P`.
pub(crate) fn parse_height(quality: &str) -> Option<u32> {
    let trimmed = quality.trim();
    let digits = trimmed
        .strip_suffix('p')
        .or_else(|| trimmed.strip_suffix('P'))?;
    digits.parse().ok()
}

fn recommended_quality(platform_id: &str) -> &'static str {
    match platform_id {
        "youtube" => "1080p",
        "instagram" | "tiktok" => "720p",
        "twitter" => "480p",
        _ => "720p",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::error::ResolveError;

    #[test]
    fn test_identify_youtube() {
        let registry = PlatformRegistry::builtin();
        let info = registry
            .identify("https://www.youtube.com/watch?v=abc12345678")
            .unwrap();
        assert_eq!(info.name, "YouTube");
        assert!(!info.fallback);
    }

    #[test]
    fn test_identify_short_links_and_subdomains() {
        let registry = PlatformRegistry::builtin();
        assert_eq!(registry.identify("youtu.be/abc12345678").unwrap().id, "youtube");
        assert_eq!(
            registry.identify("https://music.youtube.com/watch?v=abc12345678").unwrap().id,
            "youtube"
        );
        assert_eq!(registry.identify("https://vm.tiktok.com/ZMabc").unwrap().id, "tiktok");
        assert_eq!(registry.identify("https://x.com/user/status/123").unwrap().id, "twitter");
        assert_eq!(
            registry.identify("https://artist.bandcamp.com/track/song").unwrap().id,
            "bandcamp"
        );
    }

    #[test]
    fn test_identify_garbage_is_none() {
        let registry = PlatformRegistry::builtin();
        assert!(registry.identify("not a url").is_none());
        assert!(registry.identify("").is_none());
    }

    #[test]
    fn test_unknown_host_uses_fallback() {
        let registry = PlatformRegistry::builtin();
        let info = registry.identify("example.org/foo").unwrap();
        assert!(info.fallback);
        assert_eq!(info.id, "generic");
    }

    #[test]
    fn test_non_http_scheme_skips_fallback() {
        let registry = PlatformRegistry::builtin();
        assert!(registry.identify("ftp://example.org/file").is_none());
    }

    #[test]
    fn test_validate_errors() {
        let registry = PlatformRegistry::builtin();
        assert_eq!(registry.validate("   "), Err(ResolveError::EmptyUrl));
        assert!(matches!(
            registry.validate("not a url"),
            Err(ResolveError::InvalidFormat(_))
        ));

        match registry.validate("ftp://example.org/file") {
            Err(ResolveError::UnsupportedPlatform { supported }) => {
                assert!(supported.contains(&"YouTube".to_string()));
                assert!(!supported.iter().any(|s| s.starts_with("Generic")));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_empty_registry_rejects_everything() {
        let registry = PlatformRegistry::new();
        assert!(registry.is_empty());
        assert!(matches!(
            registry.validate("https://youtube.com/watch?v=abc12345678"),
            Err(ResolveError::UnsupportedPlatform { .. })
        ));
    }

    #[test]
    fn test_registration_order_breaks_ties() {
        let mut registry = PlatformRegistry::new();
        registry.register(PlatformDefinition::new("first", "First").with_domains(&["a.test"]));
        registry.register(PlatformDefinition::new("second", "Second").with_domains(&["a.test"]));
        assert_eq!(registry.identify("https://a.test/x").unwrap().id, "first");
    }

    #[test]
    fn test_quality_options() {
        assert_eq!(
            quality_options(MaxQuality::Height(720)),
            vec!["Best", "720p", "480p", "360p", "240p", "Audio Only"]
        );
        assert_eq!(
            quality_options(MaxQuality::NotApplicable),
            vec!["Best", "Audio Only"]
        );
        assert_eq!(quality_options(MaxQuality::Height(4320)).len(), 10);
    }

    #[test]
    fn test_clamp_quality() {
        let registry = PlatformRegistry::builtin();
        let coursera = registry
            .identify("https://coursera.org/learn/ml/lecture/intro")
            .unwrap();
        assert_eq!(clamp_quality(&coursera, "1080p"), "720p");
        assert_eq!(clamp_quality(&coursera, "480p"), "480p");
        assert_eq!(clamp_quality(&coursera, "best"), "best");

        let soundcloud = registry.identify("https://soundcloud.com/a/b").unwrap();
        assert_eq!(clamp_quality(&soundcloud, "1080p"), "1080p");
    }

    #[test]
    fn test_download_options() {
        let registry = PlatformRegistry::builtin();

        let yt = registry.download_options("https://youtube.com/watch?v=abc12345678");
        assert_eq!(yt.recommended_quality, "1080p");
        assert!(yt.supports_subtitles);
        assert!(yt.supports_playlist);
        assert_eq!(yt.qualities.first().map(String::as_str), Some("Best"));
        assert!(yt.qualities.contains(&"4320p".to_string()));

        let sc = registry.download_options("https://soundcloud.com/a/b");
        assert_eq!(sc.recommended_format, "mp3");
        assert_eq!(sc.qualities, vec!["Best", "Audio Only"]);

        assert_eq!(
            registry.download_options("not a url"),
            DownloadOptions::default()
        );
    }

    #[test]
    fn test_supported_platforms_filters() {
        let registry = PlatformRegistry::builtin();
        let all = registry.supported_platforms(true, true);
        let safe = registry.supported_platforms(false, false);
        assert_eq!(all.len(), registry.len());
        assert!(!safe.contains(&"Pornhub".to_string()));
        assert!(!safe.iter().any(|s| s.starts_with("Generic")));
        assert_eq!(all.len() - safe.len(), 4);
    }

    #[test]
    fn test_categories_and_restriction() {
        let registry = PlatformRegistry::builtin();
        let grouped = registry.platforms_by_category();
        assert_eq!(
            grouped.get(&ContentCategory::Educational).unwrap(),
            &vec!["TED Talks".to_string(), "Coursera".to_string()]
        );
        assert!(registry.is_restricted_content("https://www.xvideos.com/video123"));
        assert!(!registry.is_restricted_content("https://vimeo.com/123"));
    }
}
