pub mod config;
pub mod fetcher;
pub mod outcome;
pub mod platform;
pub mod scheduler;
pub mod testing;
pub mod transcoder;

pub use config::{
    load_config, load_config_from_str, load_config_or_default, validate_config, Config,
    ConfigError, DownloadsConfig, SanitizedConfig,
};
pub use fetcher::{FetchError, Fetcher, FetcherConfig, YtDlpFetcher};
pub use outcome::Outcome;
pub use platform::{PlatformInfo, PlatformRegistry, PlatformResolver, ResolveError};
pub use scheduler::{
    BatchOptions, BatchScheduler, Job, JobId, JobKind, JobRequest, JobStatus, PoolState,
    QueueStatus, SchedulerConfig, SchedulerError, SchedulerEvent,
};
pub use transcoder::{FfmpegTranscoder, TranscodeError, Transcoder, TranscoderConfig};
