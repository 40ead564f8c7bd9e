#[cfg(test)]
mod test_readiness;

use crate::entities::StreamStatus;
use crate::provisioning::delivery::{DeliveryStreamService, StreamDescription};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{event, Level};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct WaitPolicy {
    pub interval: Duration,
    /// `None` waits for as long as the service takes.
    pub timeout: Option<Duration>,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        WaitPolicy {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: None,
        }
    }
}

/// Proof that a delivery stream was observed ACTIVE. Only [`await_active`]
/// hands these out.
#[derive(Debug, Clone)]
pub struct ActiveStream {
    stream_name: String,
    stream_arn: String,
}

impl ActiveStream {
    pub fn stream_name(&self) -> &str {
        &self.stream_name
    }

    pub fn stream_arn(&self) -> &str {
        &self.stream_arn
    }
}

#[derive(Debug)]
pub enum ReadinessError {
    Terminal {
        stream_name: String,
        status: StreamStatus,
    },
    QueryFailed {
        stream_name: String,
        cause: String,
    },
    TimedOut {
        stream_name: String,
        waited: Duration,
    },
}

impl fmt::Display for ReadinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessError::Terminal {
                stream_name,
                status,
            } => write!(f, "Delivery stream {} is {}", stream_name, status),
            ReadinessError::QueryFailed { stream_name, cause } => write!(
                f,
                "Failed to query status of delivery stream {}: {}",
                stream_name, cause
            ),
            ReadinessError::TimedOut {
                stream_name,
                waited,
            } => write!(
                f,
                "Delivery stream {} not active after {:?}",
                stream_name, waited
            ),
        }
    }
}

impl std::error::Error for ReadinessError {}

/// Polls `describe_fn` until the stream reports ACTIVE. Blocks the caller for
/// as long as activation takes unless `policy.timeout` is set.
pub async fn await_active<F, FutF>(
    stream_name: &str,
    describe_fn: F,
    policy: &WaitPolicy,
) -> Result<ActiveStream, ReadinessError>
where
    F: Fn() -> FutF,
    FutF: Future<Output = Result<StreamDescription, String>>,
{
    let started = Instant::now();
    loop {
        let description = describe_fn().await.map_err(|cause| {
            event!(
                Level::ERROR,
                stream = stream_name,
                cause = cause.as_str(),
                "Status query failed."
            );
            ReadinessError::QueryFailed {
                stream_name: stream_name.to_string(),
                cause,
            }
        })?;
        match description.status {
            StreamStatus::Active => {
                return Ok(ActiveStream {
                    stream_name: stream_name.to_string(),
                    stream_arn: description.stream_arn,
                })
            }
            status if status.is_terminal_failure() => {
                event!(
                    Level::ERROR,
                    stream = stream_name,
                    status = %status,
                    "Delivery stream will not become active."
                );
                return Err(ReadinessError::Terminal {
                    stream_name: stream_name.to_string(),
                    status,
                });
            }
            status => {
                event!(
                    Level::DEBUG,
                    stream = stream_name,
                    status = %status,
                    "Waiting for delivery stream."
                );
            }
        }
        if let Some(timeout) = policy.timeout {
            let waited = started.elapsed();
            if waited >= timeout {
                return Err(ReadinessError::TimedOut {
                    stream_name: stream_name.to_string(),
                    waited,
                });
            }
        }
        sleep(policy.interval).await;
    }
}

pub async fn await_stream_active<D: DeliveryStreamService>(
    streams: &D,
    stream_name: &str,
    policy: &WaitPolicy,
) -> Result<ActiveStream, ReadinessError> {
    let describe_fn = || async move { streams.describe_delivery_stream(stream_name).await };
    await_active(stream_name, describe_fn, policy).await
}
