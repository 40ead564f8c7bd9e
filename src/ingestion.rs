mod endpoint;
pub mod remote;

use crate::provisioning::delivery::DeliveryStreamService;
use crate::publishing::{PublishError, RecordPublisher};
use futures::{Stream, StreamExt};
use remote::FilteredStream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use std::future::Future;
use tracing::{event, Level};

#[derive(Debug)]
pub enum IngestionError {
    UrlParseFailure(String),
    Authentication(String),
    StreamStatus(String),
    Transport(String),
}

impl fmt::Display for IngestionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionError::UrlParseFailure(message) => write!(f, "bad endpoint: {}", message),
            IngestionError::Authentication(status) => write!(f, "authentication failed: {}", status),
            IngestionError::StreamStatus(status) => write!(f, "stream error: {}", status),
            IngestionError::Transport(message) => write!(f, "transport error: {}", message),
        }
    }
}

impl std::error::Error for IngestionError {}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct IngestionStats {
    pub forwarded: u64,
    pub malformed: u64,
    pub failed: u64,
}

#[derive(Deserialize)]
struct StreamedPost {
    data: StreamedPostData,
}

#[derive(Deserialize)]
struct StreamedPostData {
    text: String,
}

/// Filter rule matching hashtag `term` in posts written in `language`. The
/// leading `#` is optional on `term`.
pub fn build_filter_rule(language: &str, term: &str) -> String {
    let term = term.trim();
    if term.starts_with('#') {
        format!("{} lang:{}", term, language)
    } else {
        format!("#{} lang:{}", term, language)
    }
}

/// A rule already registered on the filtered-stream endpoint.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct RegisteredRule {
    pub id: String,
    pub value: String,
}

#[derive(Deserialize)]
struct RuleListing {
    #[serde(default)]
    data: Vec<RegisteredRule>,
}

/// Rules listed in a `GET .../stream/rules` body. The endpoint omits `data`
/// when no rule is registered.
pub fn parse_rule_listing(body: &str) -> Result<Vec<RegisteredRule>, serde_json::Error> {
    serde_json::from_str::<RuleListing>(body).map(|listing| listing.data)
}

/// Ids of the registered rules that must go so only `wanted` stays active.
pub fn stale_rule_ids(registered: &[RegisteredRule], wanted: &str) -> Vec<String> {
    registered
        .iter()
        .filter(|rule| rule.value != wanted)
        .map(|rule| rule.id.clone())
        .collect()
}

pub fn add_rules_body(rule: &str) -> Value {
    json!({ "add": [{ "value": rule }] })
}

pub fn delete_rules_body(ids: &[String]) -> Value {
    json!({ "delete": { "ids": ids } })
}

/// Text of one streamed post. Keep-alive lines yield `Ok(None)`.
pub fn extract_text(line: &str) -> Result<Option<String>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str::<StreamedPost>(line).map(|post| Some(post.data.text))
}

/// Longest partial line kept while waiting for its newline.
pub const MAX_LINE_BYTES: usize = 4 * 1024 * 1024;

/// Splits a chunked byte stream into newline-terminated lines.
pub struct LineBuffer {
    pending: Vec<u8>,
    limit: usize,
    // dropping the rest of an oversized line up to its newline
    discarding: bool,
    overflows: u64,
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::with_limit(MAX_LINE_BYTES)
    }
}

impl LineBuffer {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            pending: vec![],
            limit,
            discarding: false,
            overflows: 0,
        }
    }

    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut lines = vec![];
        while let Some(position) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=position).collect();
            if self.discarding {
                self.discarding = false;
                continue;
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        if self.pending.len() > self.limit {
            self.pending.clear();
            if !self.discarding {
                self.discarding = true;
                self.overflows += 1;
            }
        }
        lines
    }

    /// Number of lines dropped for exceeding the limit since the last call.
    pub fn take_overflows(&mut self) -> u64 {
        std::mem::take(&mut self.overflows)
    }

    /// The trailing line left when the stream ends without a final newline.
    pub fn finish(self) -> Option<String> {
        if self.discarding || self.pending.is_empty() {
            return None;
        }
        Some(String::from_utf8_lossy(&self.pending).into_owned())
    }
}

/// Forwards the text of every post on `chunks` through `publish_fn` until the
/// stream ends. Bad lines and failed publishes are logged and counted; only
/// a transport error on the stream itself ends the loop early.
pub async fn forward_records<S, B, F, FutF>(
    mut chunks: S,
    publish_fn: F,
) -> Result<IngestionStats, IngestionError>
where
    S: Stream<Item = Result<B, IngestionError>> + Unpin,
    B: AsRef<[u8]>,
    F: Fn(String) -> FutF,
    FutF: Future<Output = Result<(), PublishError>>,
{
    let mut stats = IngestionStats::default();
    let mut buffer = LineBuffer::default();
    while let Some(chunk) = chunks.next().await {
        for line in buffer.push(chunk?.as_ref()) {
            _forward_line(&line, &publish_fn, &mut stats).await;
        }
        let overflows = buffer.take_overflows();
        if overflows > 0 {
            stats.malformed += overflows;
            event!(Level::WARN, limit = MAX_LINE_BYTES, "Skipping oversized line.");
        }
    }
    if let Some(line) = buffer.finish() {
        _forward_line(&line, &publish_fn, &mut stats).await;
    }
    Ok(stats)
}

async fn _forward_line<F, FutF>(line: &str, publish_fn: &F, stats: &mut IngestionStats)
where
    F: Fn(String) -> FutF,
    FutF: Future<Output = Result<(), PublishError>>,
{
    match extract_text(line) {
        Ok(Some(text)) => match publish_fn(text).await {
            Ok(()) => stats.forwarded += 1,
            Err(e) => {
                stats.failed += 1;
                event!(Level::WARN, error = %e, "Dropping record.");
            }
        },
        Ok(None) => {}
        Err(e) => {
            stats.malformed += 1;
            event!(Level::WARN, error = %e, "Skipping malformed line.");
        }
    }
}

/// Makes the filter rule for `term` in `language` the only registered rule,
/// then forwards every matching post into the delivery stream until the
/// firehose disconnects.
pub async fn start_stream<D: DeliveryStreamService>(
    source: &FilteredStream,
    language: &str,
    term: &str,
    publisher: &RecordPublisher<D>,
) -> Result<IngestionStats, IngestionError> {
    let rule = build_filter_rule(language, term);
    event!(
        Level::INFO,
        language = language,
        term = term,
        stream = publisher.stream_name(),
        "Start filtering..."
    );
    let registered = source.list_rules().await?;
    let stale = stale_rule_ids(&registered, &rule);
    if !stale.is_empty() {
        event!(Level::INFO, count = stale.len(), "Removing previous filter rules.");
        source.delete_rules(&stale).await?;
    }
    if registered.iter().all(|existing| existing.value != rule) {
        source.add_rule(&rule).await?;
    }
    let chunks = source.connect().await?;
    let publish_fn = |text: String| async move { publisher.publish(text.as_bytes()).await };
    forward_records(chunks, publish_fn).await
}
