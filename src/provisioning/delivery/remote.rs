use super::{
    DeliveryStreamRequest, DeliveryStreamService, DestinationConfig, SourceConfig,
    StreamDescription,
};
use crate::entities::{CreateOutcome, StreamStatus};
use async_trait::async_trait;
use aws_sdk_firehose::error::{BuildError, DisplayErrorContext};
use aws_sdk_firehose::operation::create_delivery_stream::CreateDeliveryStreamError;
use aws_sdk_firehose::primitives::Blob;
use aws_sdk_firehose::types::{
    BufferingHints, DeliveryStreamType, ExtendedS3DestinationConfiguration,
    KinesisStreamSourceConfiguration, ProcessingConfiguration, Processor, ProcessorParameter,
    ProcessorParameterName, ProcessorType, Record,
};
use aws_sdk_firehose::Client;
use tracing::{event, Level};

#[derive(Clone)]
pub struct FirehoseStreams {
    client: Client,
}

impl FirehoseStreams {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn _to_processing_configuration(
    destination: &DestinationConfig,
) -> Result<ProcessingConfiguration, BuildError> {
    let mut parameters = vec![];
    for (name, value) in destination.processor.parameters() {
        parameters.push(
            ProcessorParameter::builder()
                .parameter_name(ProcessorParameterName::from(name))
                .parameter_value(value)
                .build()?,
        );
    }
    let processor = Processor::builder()
        .r#type(ProcessorType::Lambda)
        .set_parameters(Some(parameters))
        .build()?;
    Ok(ProcessingConfiguration::builder()
        .enabled(true)
        .processors(processor)
        .build())
}

fn _to_s3_destination(
    destination: &DestinationConfig,
) -> Result<ExtendedS3DestinationConfiguration, BuildError> {
    let buffering_hints = BufferingHints::builder()
        .interval_in_seconds(destination.buffering.interval_secs)
        .set_size_in_mbs(destination.buffering.size_mbs)
        .build();
    ExtendedS3DestinationConfiguration::builder()
        .bucket_arn(&destination.bucket_arn)
        .role_arn(&destination.role_arn)
        .buffering_hints(buffering_hints)
        .processing_configuration(_to_processing_configuration(destination)?)
        .build()
}

#[async_trait]
impl DeliveryStreamService for FirehoseStreams {
    async fn create_delivery_stream(
        &self,
        request: &DeliveryStreamRequest,
    ) -> CreateOutcome<String> {
        let destination = match _to_s3_destination(&request.destination) {
            Ok(destination) => destination,
            Err(e) => {
                return CreateOutcome::Failed(format!(
                    "Invalid destination configuration:\n{:?}",
                    e
                ))
            }
        };
        let mut builder = self
            .client
            .create_delivery_stream()
            .delivery_stream_name(&request.stream_name)
            .extended_s3_destination_configuration(destination);
        builder = match &request.source {
            SourceConfig::DirectPut => builder.delivery_stream_type(DeliveryStreamType::DirectPut),
            SourceConfig::UpstreamStream {
                stream_arn,
                role_arn,
            } => {
                let source = KinesisStreamSourceConfiguration::builder()
                    .kinesis_stream_arn(stream_arn)
                    .role_arn(role_arn)
                    .build();
                match source {
                    Ok(source) => builder
                        .delivery_stream_type(DeliveryStreamType::KinesisStreamAsSource)
                        .kinesis_stream_source_configuration(source),
                    Err(e) => {
                        return CreateOutcome::Failed(format!(
                            "Invalid source stream configuration:\n{:?}",
                            e
                        ))
                    }
                }
            }
        };
        match builder.send().await {
            Ok(output) => match output.delivery_stream_arn() {
                Some(stream_arn) => CreateOutcome::Created(stream_arn.to_string()),
                None => CreateOutcome::Failed(format!(
                    "Delivery stream {} created but no arn returned.",
                    request.stream_name
                )),
            },
            Err(error) => match error.as_service_error() {
                Some(CreateDeliveryStreamError::ResourceInUseException(_)) => {
                    CreateOutcome::AlreadyExists
                }
                _ => CreateOutcome::Failed(format!(
                    "Failed to create delivery stream {}:\n{}",
                    request.stream_name,
                    DisplayErrorContext(&error)
                )),
            },
        }
    }

    async fn describe_delivery_stream(
        &self,
        stream_name: &str,
    ) -> Result<StreamDescription, String> {
        let output = self
            .client
            .describe_delivery_stream()
            .delivery_stream_name(stream_name)
            .send()
            .await
            .map_err(|error| {
                format!(
                    "Failed to describe delivery stream {}:\n{}",
                    stream_name,
                    DisplayErrorContext(&error)
                )
            })?;
        match output.delivery_stream_description() {
            Some(description) => Ok(StreamDescription {
                stream_arn: description.delivery_stream_arn().to_string(),
                status: StreamStatus::from(description.delivery_stream_status().as_str()),
            }),
            None => Err(format!(
                "Delivery stream {} described without a description.",
                stream_name
            )),
        }
    }

    async fn put_record(&self, stream_name: &str, payload: &[u8]) -> Result<(), String> {
        let record = Record::builder()
            .data(Blob::new(payload.to_vec()))
            .build()
            .map_err(|e| format!("Failed to build record:\n{:?}", e))?;
        let output = self
            .client
            .put_record()
            .delivery_stream_name(stream_name)
            .record(record)
            .send()
            .await
            .map_err(|error| format!("{}", DisplayErrorContext(&error)))?;
        event!(Level::DEBUG, record_id = ?output.record_id(), "put record");
        Ok(())
    }
}
