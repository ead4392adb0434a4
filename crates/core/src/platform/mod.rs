//! Platform identification.
//!
//! Maps a user-supplied URL to the platform that serves it and the
//! capabilities that platform offers (download modes, resolution ceiling,
//! output formats). Everything here is pure and synchronous.

mod builtin;
mod error;
mod registry;
mod resolver;
mod types;

pub use error::ResolveError;
pub use registry::{clamp_quality, quality_options, PlatformRegistry};
pub use resolver::{normalize_url, NormalizedUrl, PlatformResolver};
pub use types::{
    Capability, ContentCategory, DownloadOptions, MaxQuality, PlatformCapabilities,
    PlatformDefinition, PlatformInfo,
};

pub(crate) use registry::parse_height;
