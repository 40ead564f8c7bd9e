//! Transformation stage of the delivery stream. Decodes each buffered
//! record, runs sentiment detection on its text and hands the text back as a
//! newline-terminated JSON string.

use aws_config::BehaviorVersion;
use aws_sdk_comprehend::error::DisplayErrorContext;
use aws_sdk_comprehend::types::LanguageCode;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use std::env::var;
use std::future::Future;
use tracing::{event, Level};

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct TransformationEvent {
    records: Vec<InputRecord>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct InputRecord {
    record_id: String,
    data: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
enum RecordResult {
    Ok,
    Dropped,
    ProcessingFailed,
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
struct OutputRecord {
    record_id: String,
    result: RecordResult,
    data: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct TransformationResponse {
    records: Vec<OutputRecord>,
}

fn _decode_payload(data: &str) -> Result<String, String> {
    let bytes = STANDARD
        .decode(data)
        .map_err(|e| format!("Record data is not base64:\n{:?}", e))?;
    String::from_utf8(bytes).map_err(|e| format!("Record data is not utf-8:\n{:?}", e))
}

fn _encode_payload(text: &str) -> String {
    // serializing a &str cannot fail
    let mut line = serde_json::to_string(text).unwrap_or_default();
    line.push('\n');
    STANDARD.encode(line)
}

async fn transform_records<F, FutF>(
    event: TransformationEvent,
    sentiment_fn: F,
) -> TransformationResponse
where
    F: Fn(String) -> FutF,
    FutF: Future<Output = Result<String, String>>,
{
    let mut output = Vec::with_capacity(event.records.len());
    for record in event.records {
        let payload = match _decode_payload(&record.data) {
            Ok(payload) => payload,
            Err(cause) => {
                event!(
                    Level::WARN,
                    record_id = record.record_id.as_str(),
                    cause = cause.as_str()
                );
                output.push(OutputRecord {
                    record_id: record.record_id,
                    result: RecordResult::ProcessingFailed,
                    data: record.data,
                });
                continue;
            }
        };
        if payload.trim().is_empty() {
            event!(
                Level::INFO,
                record_id = record.record_id.as_str(),
                "Dropping record without text."
            );
            output.push(OutputRecord {
                record_id: record.record_id,
                result: RecordResult::Dropped,
                data: record.data,
            });
            continue;
        }
        match sentiment_fn(payload.clone()).await {
            Ok(sentiment) => {
                event!(
                    Level::INFO,
                    record_id = record.record_id.as_str(),
                    sentiment = sentiment.as_str()
                );
            }
            Err(cause) => {
                event!(
                    Level::WARN,
                    record_id = record.record_id.as_str(),
                    cause = cause.as_str(),
                    "DetectSentiment failed."
                );
            }
        }
        output.push(OutputRecord {
            record_id: record.record_id,
            result: RecordResult::Ok,
            data: _encode_payload(&payload),
        });
    }
    event!(Level::INFO, "Successfully processed {} records.", output.len());
    TransformationResponse { records: output }
}

async fn detect_sentiment(
    client: &aws_sdk_comprehend::Client,
    language: &LanguageCode,
    text: &str,
) -> Result<String, String> {
    let output = client
        .detect_sentiment()
        .text(text)
        .language_code(language.clone())
        .send()
        .await
        .map_err(|e| format!("{}", DisplayErrorContext(&e)))?;
    Ok(output
        .sentiment()
        .map(|sentiment| sentiment.as_str().to_string())
        .unwrap_or_default())
}

async fn handler(
    event: LambdaEvent<TransformationEvent>,
    client: &aws_sdk_comprehend::Client,
    language: &LanguageCode,
) -> Result<TransformationResponse, Error> {
    let sentiment_fn =
        |text: String| async move { detect_sentiment(client, language, &text).await };
    Ok(transform_records(event.payload, sentiment_fn).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        // CloudWatch adds the ingestion time.
        .without_time()
        .init();
    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let client = aws_sdk_comprehend::Client::new(&config);
    let language = LanguageCode::from(
        var("STREAMER_LANGUAGE")
            .unwrap_or_else(|_| String::from("en"))
            .as_str(),
    );
    run(service_fn(|event: LambdaEvent<TransformationEvent>| async {
        handler(event, &client, &language).await
    }))
    .await
}
