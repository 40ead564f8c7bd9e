
use crate::provisioning::delivery::DeliveryStreamService;
use crate::readiness::ActiveStream;
use std::fmt;
use std::sync::Arc;

#[derive(Debug)]
pub struct PublishError {
    pub stream_name: String,
    pub cause: String,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Failed to put record on {}: {}",
            self.stream_name, self.cause
        )
    }
}

impl std::error::Error for PublishError {}

/// Sends records into an active delivery stream. Clones share the stream
/// and client; there is no other state, so calls may run concurrently.
pub struct RecordPublisher<D> {
    stream: Arc<ActiveStream>,
    streams: Arc<D>,
}

impl<D> Clone for RecordPublisher<D> {
    fn clone(&self) -> Self {
        Self {
            stream: Arc::clone(&self.stream),
            streams: Arc::clone(&self.streams),
        }
    }
}

impl<D: DeliveryStreamService> RecordPublisher<D> {
    pub fn new(stream: ActiveStream, streams: D) -> Self {
        Self {
            stream: Arc::new(stream),
            streams: Arc::new(streams),
        }
    }

    pub fn stream_name(&self) -> &str {
        self.stream.stream_name()
    }

    /// One record, one put. Durability past the acknowledgement belongs to
    /// the delivery stream.
    pub async fn publish(&self, payload: &[u8]) -> Result<(), PublishError> {
        self.streams
            .put_record(self.stream.stream_name(), payload)
            .await
            .map_err(|cause| PublishError {
                stream_name: self.stream.stream_name().to_string(),
                cause,
            })
    }
}
