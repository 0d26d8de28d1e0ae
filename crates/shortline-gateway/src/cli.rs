use clap::{Parser, ValueEnum};
use jiff::Timestamp;
use shortline_cache::BloomFilterConfig;
use shortline_shortener::{PipelineConfig, ShortenerConfig};
use shortline_snowflake::SnowflakeSettings;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

pub const LISTEN_ADDR_ENV: &str = "SHORTLINE_LISTEN_ADDR";
pub const PUBLIC_BASE_URL_ENV: &str = "SHORTLINE_PUBLIC_BASE_URL";
pub const INSTANCE_ID_ENV: &str = "SHORTLINE_INSTANCE_ID";
pub const EPOCH_ENV: &str = "SHORTLINE_EPOCH";
pub const EXPECTED_ITEMS_ENV: &str = "SHORTLINE_EXPECTED_ITEMS";
pub const FALSE_POSITIVE_RATE_ENV: &str = "SHORTLINE_FALSE_POSITIVE_RATE";
pub const QUEUE_CAPACITY_ENV: &str = "SHORTLINE_QUEUE_CAPACITY";
pub const WORKERS_ENV: &str = "SHORTLINE_WORKERS";
pub const REQUEST_TIMEOUT_MS_ENV: &str = "SHORTLINE_REQUEST_TIMEOUT_MS";
pub const MAX_ATTEMPTS_ENV: &str = "SHORTLINE_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "SHORTLINE_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}

impl Display for LogFormatArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormatArg::Text => write!(f, "text"),
            LogFormatArg::Json => write!(f, "json"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "shortline-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Prefix for the short URLs handed back to clients.
    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    /// Snowflake instance id, unique per running gateway.
    #[arg(
        long,
        env = INSTANCE_ID_ENV,
        default_value_t = 0,
        value_parser = clap::value_parser!(u16).range(0..=1023),
    )]
    pub instance_id: u16,

    /// Custom Snowflake epoch (RFC 3339). Defaults to the Twitter epoch.
    #[arg(long, env = EPOCH_ENV)]
    pub epoch: Option<Timestamp>,

    #[arg(long, env = EXPECTED_ITEMS_ENV, default_value_t = 1_000_000)]
    pub expected_items: usize,

    #[arg(long, env = FALSE_POSITIVE_RATE_ENV, default_value_t = 0.01)]
    pub false_positive_rate: f64,

    #[arg(long, env = QUEUE_CAPACITY_ENV, default_value_t = 100)]
    pub queue_capacity: usize,

    #[arg(long, env = WORKERS_ENV, default_value_t = 4)]
    pub workers: usize,

    /// How long a create request may wait for write capacity.
    #[arg(long, env = REQUEST_TIMEOUT_MS_ENV, default_value_t = 5_000)]
    pub request_timeout_ms: u64,

    /// Codes generated per request before giving up on collisions.
    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = 3,
        value_parser = clap::value_parser!(u32).range(1..),
    )]
    pub max_attempts: u32,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,
}

impl CLI {
    pub fn snowflake_settings(&self) -> SnowflakeSettings {
        match self.epoch {
            Some(epoch) => SnowflakeSettings::builder()
                .instance_id(self.instance_id)
                .start_epoch(epoch)
                .build(),
            None => SnowflakeSettings::builder()
                .instance_id(self.instance_id)
                .build(),
        }
    }

    pub fn bloom_filter_config(&self) -> BloomFilterConfig {
        BloomFilterConfig::builder()
            .expected_items(self.expected_items)
            .false_positive_rate(self.false_positive_rate)
            .build()
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig::builder()
            .queue_capacity(self.queue_capacity)
            .workers(self.workers)
            .build()
    }

    pub fn shortener_config(&self) -> ShortenerConfig {
        ShortenerConfig::builder()
            .max_attempts(self.max_attempts as usize)
            .build()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
