use crate::entities::{SourceMode, TopologyDescriptor, DEFAULT_FUNCTION_NAME, DEFAULT_ROLE_NAME};
use crate::readiness::WaitPolicy;
use std::env::var;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_STREAM_NAME: &str = "hashtag-twitter";
pub const DEFAULT_STORAGE_NAME: &str = "stream-bucket";
pub const DEFAULT_FUNCTION_PACKAGE: &str = "target/lambda/process_stream_data/bootstrap.zip";
pub const DEFAULT_FIREHOSE_ENDPOINT: &str = "https://api.twitter.com/2/";

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub descriptor: TopologyDescriptor,
    pub function_package: PathBuf,
    pub wait_policy: WaitPolicy,
    pub bearer_token: String,
    pub firehose_endpoint: String,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Self::from_lookup(|key| var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the
    /// process environment.
    pub fn from_lookup<L>(lookup: L) -> Result<Config, ConfigError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let mut descriptor = TopologyDescriptor::new(
            &text("STREAMER_STREAM_NAME", DEFAULT_STREAM_NAME),
            &text("STREAMER_STORAGE_NAME", DEFAULT_STORAGE_NAME),
        );
        descriptor.role_name = text("STREAMER_ROLE_NAME", DEFAULT_ROLE_NAME);
        descriptor.function_name = text("STREAMER_FUNCTION_NAME", DEFAULT_FUNCTION_NAME);
        if let Some(stream_arn) = lookup("STREAMER_SOURCE_STREAM_ARN") {
            descriptor.source = SourceMode::UpstreamStream { stream_arn };
        }
        if let Some(interval) = _parse(&lookup, "STREAMER_BUFFER_INTERVAL_SECS")? {
            descriptor.buffering.interval_secs = interval;
        }
        descriptor.buffering.size_mbs = _parse(&lookup, "STREAMER_BUFFER_SIZE_MBS")?;
        if let Some(retries) = _parse(&lookup, "STREAMER_PROCESSING_RETRIES")? {
            descriptor.processing.retries = retries;
        }
        let wait_policy = WaitPolicy {
            timeout: _parse::<_, u64>(&lookup, "STREAMER_READY_TIMEOUT_SECS")?
                .map(Duration::from_secs),
            ..WaitPolicy::default()
        };
        let bearer_token = lookup("STREAMER_BEARER_TOKEN").ok_or_else(|| {
            ConfigError::MissingVariable("Env var STREAMER_BEARER_TOKEN undefined.".to_string())
        })?;
        Ok(Config {
            descriptor,
            function_package: PathBuf::from(text(
                "STREAMER_FUNCTION_PACKAGE",
                DEFAULT_FUNCTION_PACKAGE,
            )),
            wait_policy,
            bearer_token,
            firehose_endpoint: text("STREAMER_FIREHOSE_ENDPOINT", DEFAULT_FIREHOSE_ENDPOINT),
        })
    }
}

fn _parse<L, T>(lookup: &L, key: &str) -> Result<Option<T>, ConfigError>
where
    L: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|_| {
            ConfigError::InvalidValue(format!("Env var {} is not a valid number: {}", key, raw))
        }),
        None => Ok(None),
    }
}
