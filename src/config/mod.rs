//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{num::NonZeroUsize, path::PathBuf, str::FromStr, time::Duration};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::{EntityKind, InvalidationEvent, TagLimits, TtlPresets};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "headshakers";
const ENV_PREFIX: &str = "HEADSHAKERS";
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Command-line arguments for the headshakers binary.
#[derive(Debug, Parser)]
#[command(
    name = "headshakers",
    version,
    about = "Resolve Head Shakers cache invalidation tags"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "HEADSHAKERS_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the tags a single change event invalidates.
    Tags(TagsArgs),
    /// Print the merged tags for a JSON file of change events.
    Events(EventsArgs),
    /// Load and validate configuration, then print the resolved settings.
    #[command(name = "check-config")]
    CheckConfig,
}

#[derive(Debug, Args, Clone)]
pub struct TagsArgs {
    /// Print tags as a JSON array instead of one per line.
    #[arg(long, global = true, action = clap::ArgAction::SetTrue)]
    pub json: bool,

    #[command(subcommand)]
    pub event: EventCommand,
}

#[derive(Debug, Args, Clone)]
pub struct EventsArgs {
    /// JSON file holding an array of events.
    #[arg(value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Print tags as a JSON array instead of one per line.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Subcommand, Clone)]
pub enum EventCommand {
    /// A bobblehead was created, edited or deleted.
    BobbleheadChange {
        #[arg(long = "bobblehead-id", value_name = "ID")]
        bobblehead_id: String,
        #[arg(long = "user-id", value_name = "ID")]
        user_id: String,
        #[arg(long = "collection-id", value_name = "ID")]
        collection_id: Option<String>,
    },
    /// A collection was created, edited or deleted.
    CollectionChange {
        #[arg(long = "collection-id", value_name = "ID")]
        collection_id: String,
        #[arg(long = "user-id", value_name = "ID")]
        user_id: String,
    },
    /// A comment was added, edited or removed.
    CommentChange {
        #[arg(long = "entity-type", value_name = "KIND")]
        entity_type: EntityKind,
        #[arg(long = "entity-id", value_name = "ID")]
        entity_id: String,
        #[arg(long = "comment-id", value_name = "ID")]
        comment_id: Option<String>,
        #[arg(long = "parent-comment-id", value_name = "ID")]
        parent_comment_id: Option<String>,
    },
    /// A user liked or unliked something.
    SocialInteraction {
        #[arg(long = "entity-type", value_name = "KIND")]
        entity_type: EntityKind,
        #[arg(long = "entity-id", value_name = "ID")]
        entity_id: String,
        #[arg(long = "user-id", value_name = "ID")]
        user_id: String,
    },
    /// A view was recorded for an entity.
    AnalyticsView {
        #[arg(long = "entity-type", value_name = "KIND")]
        entity_type: EntityKind,
        #[arg(long = "entity-id", value_name = "ID")]
        entity_id: String,
    },
    /// A user profile changed.
    UserChange {
        #[arg(long = "user-id", value_name = "ID")]
        user_id: String,
    },
    /// The featured content selection changed.
    FeaturedChange,
    /// Trending rankings were recomputed.
    TrendingUpdate,
    /// Bulk data changed; clear the broad public listings.
    MajorChange,
}

impl From<EventCommand> for InvalidationEvent {
    fn from(command: EventCommand) -> Self {
        match command {
            EventCommand::BobbleheadChange {
                bobblehead_id,
                user_id,
                collection_id,
            } => InvalidationEvent::BobbleheadChange {
                bobblehead_id,
                user_id,
                collection_id,
            },
            EventCommand::CollectionChange {
                collection_id,
                user_id,
            } => InvalidationEvent::CollectionChange {
                collection_id,
                user_id,
            },
            EventCommand::CommentChange {
                entity_type,
                entity_id,
                comment_id,
                parent_comment_id,
            } => InvalidationEvent::CommentChange {
                entity_type,
                entity_id,
                comment_id,
                parent_comment_id,
            },
            EventCommand::SocialInteraction {
                entity_type,
                entity_id,
                user_id,
            } => InvalidationEvent::SocialInteraction {
                entity_type,
                entity_id,
                user_id,
            },
            EventCommand::AnalyticsView {
                entity_type,
                entity_id,
            } => InvalidationEvent::AnalyticsView {
                entity_type,
                entity_id,
            },
            EventCommand::UserChange { user_id } => InvalidationEvent::UserChange { user_id },
            EventCommand::FeaturedChange => InvalidationEvent::FeaturedContentChange,
            EventCommand::TrendingUpdate => InvalidationEvent::TrendingUpdate,
            EventCommand::MajorChange => InvalidationEvent::MajorDataChange,
        }
    }
}

// `cache.enabled` and `cache.capacity` only size a `TagCache`, which the binary
// never builds, so they are set through files and the environment alone.
#[derive(Debug, Args, Default, Clone)]
pub struct SettingsOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the per-builder tag ceiling.
    #[arg(long = "cache-max-tags", value_name = "COUNT")]
    pub cache_max_tags: Option<u64>,

    /// Override the maximum tag length in characters.
    #[arg(long = "cache-max-tag-length", value_name = "CHARS")]
    pub cache_max_tag_length: Option<u64>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: NonZeroUsize,
    pub ttl: TtlPresets,
    pub limits: TagLimits,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &SettingsOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(max_tags) = overrides.cache_max_tags {
            self.cache.max_tags = Some(max_tags);
        }
        if let Some(max_tag_length) = overrides.cache_max_tag_length {
            self.cache.max_tag_length = Some(max_tag_length);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, cache } = raw;

        let logging = build_logging_settings(logging)?;
        let cache = build_cache_settings(cache)?;

        Ok(Self { logging, cache })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let default_ttl = TtlPresets::default();
    let default_limits = TagLimits::default();

    let capacity = non_zero_usize(
        cache.capacity.unwrap_or(DEFAULT_CACHE_CAPACITY),
        "cache.capacity",
    )?;

    let ttl = TtlPresets {
        short: ttl_or(cache.ttl_short_seconds, default_ttl.short, "cache.ttl_short_seconds")?,
        medium: ttl_or(
            cache.ttl_medium_seconds,
            default_ttl.medium,
            "cache.ttl_medium_seconds",
        )?,
        long: ttl_or(cache.ttl_long_seconds, default_ttl.long, "cache.ttl_long_seconds")?,
        extended: ttl_or(
            cache.ttl_extended_seconds,
            default_ttl.extended,
            "cache.ttl_extended_seconds",
        )?,
    };

    let limits = TagLimits {
        max_tags: match cache.max_tags {
            Some(value) => non_zero_usize(value, "cache.max_tags")?.get(),
            None => default_limits.max_tags,
        },
        max_tag_length: match cache.max_tag_length {
            Some(value) => non_zero_usize(value, "cache.max_tag_length")?.get(),
            None => default_limits.max_tag_length,
        },
    };

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        capacity,
        ttl,
        limits,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<u64>,
    max_tags: Option<u64>,
    max_tag_length: Option<u64>,
    ttl_short_seconds: Option<u64>,
    ttl_medium_seconds: Option<u64>,
    ttl_long_seconds: Option<u64>,
    ttl_extended_seconds: Option<u64>,
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn ttl_or(
    seconds: Option<u64>,
    default: Duration,
    key: &'static str,
) -> Result<Duration, LoadError> {
    match seconds {
        Some(0) => Err(LoadError::invalid(key, "must be greater than zero")),
        Some(seconds) => Ok(Duration::from_secs(seconds)),
        None => Ok(default),
    }
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}
