pub mod remote;

use super::{ProvisioningError, ResourceKind};
use crate::entities::{BufferingHints, CreateOutcome, SourceMode, StreamStatus, TopologyDescriptor};
use async_trait::async_trait;
use tracing::{event, Level};

#[derive(Debug, Clone, PartialEq)]
pub struct StreamDescription {
    pub stream_arn: String,
    pub status: StreamStatus,
}

#[async_trait]
pub trait DeliveryStreamService: Send + Sync {
    async fn create_delivery_stream(&self, request: &DeliveryStreamRequest)
        -> CreateOutcome<String>;

    async fn describe_delivery_stream(&self, stream_name: &str)
        -> Result<StreamDescription, String>;

    async fn put_record(&self, stream_name: &str, payload: &[u8]) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceConfig {
    DirectPut,
    UpstreamStream { stream_arn: String, role_arn: String },
}

/// Transformation stage run on every buffered batch before it is written.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorConfig {
    pub function_arn: String,
    pub role_arn: String,
    pub retries: u32,
    pub buffer_size_mbs: u32,
    pub buffer_interval_secs: u32,
}

impl ProcessorConfig {
    /// Processor parameters in the name/value form the delivery service takes.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("LambdaArn", self.function_arn.clone()),
            ("NumberOfRetries", self.retries.to_string()),
            ("RoleArn", self.role_arn.clone()),
            ("BufferSizeInMBs", self.buffer_size_mbs.to_string()),
            ("BufferIntervalInSeconds", self.buffer_interval_secs.to_string()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DestinationConfig {
    pub bucket_arn: String,
    pub role_arn: String,
    pub buffering: BufferingHints,
    pub processor: ProcessorConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryStreamRequest {
    pub stream_name: String,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
}

pub fn build_delivery_stream_request(
    descriptor: &TopologyDescriptor,
    bucket_arn: &str,
    role_arn: &str,
    function_arn: &str,
) -> DeliveryStreamRequest {
    let source = match &descriptor.source {
        SourceMode::DirectPut => SourceConfig::DirectPut,
        SourceMode::UpstreamStream { stream_arn } => SourceConfig::UpstreamStream {
            stream_arn: stream_arn.clone(),
            role_arn: role_arn.to_string(),
        },
    };
    DeliveryStreamRequest {
        stream_name: descriptor.stream_name.clone(),
        source,
        destination: DestinationConfig {
            bucket_arn: bucket_arn.to_string(),
            role_arn: role_arn.to_string(),
            buffering: descriptor.buffering.clone(),
            processor: ProcessorConfig {
                function_arn: function_arn.to_string(),
                role_arn: role_arn.to_string(),
                retries: descriptor.processing.retries,
                buffer_size_mbs: descriptor.processing.buffer_size_mbs,
                buffer_interval_secs: descriptor.processing.buffer_interval_secs,
            },
        },
    }
}

fn stream_error(cause: String) -> ProvisioningError {
    ProvisioningError {
        resource: ResourceKind::DeliveryStream,
        cause,
    }
}

/// Creates the delivery stream writing into `bucket_arn` through the
/// transformation function. A stream that already exists under the name is
/// reused as is; its configuration is not compared against the descriptor.
pub async fn ensure_delivery_stream<D: DeliveryStreamService>(
    streams: &D,
    descriptor: &TopologyDescriptor,
    bucket_arn: &str,
    role_arn: &str,
    function_arn: &str,
) -> Result<String, ProvisioningError> {
    let request = build_delivery_stream_request(descriptor, bucket_arn, role_arn, function_arn);
    event!(
        Level::INFO,
        stream = request.stream_name.as_str(),
        bucket = bucket_arn,
        "Creating delivery stream..."
    );
    match streams.create_delivery_stream(&request).await {
        CreateOutcome::Created(stream_arn) => Ok(stream_arn),
        CreateOutcome::AlreadyExists => {
            event!(
                Level::WARN,
                stream = request.stream_name.as_str(),
                "Delivery stream already exists, reusing it without reconciling its configuration."
            );
            streams
                .describe_delivery_stream(&request.stream_name)
                .await
                .map(|description| description.stream_arn)
                .map_err(stream_error)
        }
        CreateOutcome::Failed(cause) => Err(stream_error(cause)),
    }
}
