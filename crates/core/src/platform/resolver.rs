//! Resolver trait and URL normalization.

use url::Url;

use super::error::ResolveError;
use super::types::PlatformInfo;

/// Routes a URL to the platform that serves it.
///
/// Implementations are pure: no network access, no shared mutable state.
pub trait PlatformResolver: Send + Sync {
    /// Identifies the platform for a URL, or `None` if the input is not a
    /// usable URL or no platform (including any fallback) accepts it.
    fn identify(&self, url: &str) -> Option<PlatformInfo>;

    /// Display names of the registered platforms, in registration order.
    fn supported_platforms(&self, include_restricted: bool, include_generic: bool) -> Vec<String>;

    /// Validates a URL and returns its platform, with a reason on failure.
    fn validate(&self, url: &str) -> Result<PlatformInfo, ResolveError> {
        let trimmed = url.trim();
        if trimmed.is_empty() {
            return Err(ResolveError::EmptyUrl);
        }

        let normalized = normalize_url(trimmed)
            .ok_or_else(|| ResolveError::InvalidFormat(trimmed.to_string()))?;

        self.identify(&normalized.text)
            .ok_or_else(|| ResolveError::UnsupportedPlatform {
                supported: self.supported_platforms(true, false),
            })
    }
}

/// A URL after trimming and scheme defaulting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedUrl {
    /// The input with a scheme, as it will be stored and handed to fetchers.
    pub text: String,
    /// Lower-cased host with any leading `www.` removed.
    pub host: String,
    /// URL scheme (`http`, `https`, ...).
    pub scheme: String,
}

/// Trims the input, adds `https://` when no scheme is given and parses it.
///
/// Returns `None` for empty input or input without a parseable host.
pub fn normalize_url(input: &str) -> Option<NormalizedUrl> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let text = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&text).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let host = host.strip_prefix("www.").map(str::to_string).unwrap_or(host);

    Some(NormalizedUrl {
        text,
        host,
        scheme: parsed.scheme().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_scheme() {
        let n = normalize_url("  example.org/foo ").unwrap();
        assert_eq!(n.text, "https://example.org/foo");
        assert_eq!(n.host, "example.org");
        assert_eq!(n.scheme, "https");
    }

    #[test]
    fn test_normalize_keeps_existing_scheme() {
        let n = normalize_url("http://WWW.Vimeo.com/123").unwrap();
        assert_eq!(n.text, "http://WWW.Vimeo.com/123");
        assert_eq!(n.host, "vimeo.com");
        assert_eq!(n.scheme, "http");
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert!(normalize_url("not a url").is_none());
        assert!(normalize_url("").is_none());
        assert!(normalize_url("   ").is_none());
    }
}
