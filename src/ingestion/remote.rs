#[cfg(test)]
mod test_remote;

use super::endpoint::construct_endpoint_url;
use super::{add_rules_body, delete_rules_body, parse_rule_listing, IngestionError, RegisteredRule};
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;

/// Filtered-stream endpoint of the social-media firehose.
pub struct FilteredStream {
    client: Client,
    endpoint_prefix: String,
    bearer_token: String,
}

impl FilteredStream {
    pub fn new(endpoint_prefix: &str, bearer_token: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint_prefix: endpoint_prefix.to_string(),
            bearer_token: bearer_token.to_string(),
        }
    }

    fn _rules_url(&self) -> Result<String, IngestionError> {
        construct_endpoint_url(
            &self.endpoint_prefix,
            &["tweets", "search", "stream", "rules"],
        )
    }

    /// Rules currently registered for this bearer token.
    pub async fn list_rules(&self) -> Result<Vec<RegisteredRule>, IngestionError> {
        let response = self
            .client
            .get(self._rules_url()?)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| {
                IngestionError::Transport(format!("Failed to list filter rules:\n{:?}", e))
            })?;
        let body = _check_status(response)
            .await?
            .text()
            .await
            .map_err(|e| {
                IngestionError::Transport(format!("Failed to read filter rules:\n{:?}", e))
            })?;
        parse_rule_listing(&body).map_err(|e| {
            IngestionError::StreamStatus(format!("Unexpected filter rule listing:\n{:?}", e))
        })
    }

    pub async fn delete_rules(&self, ids: &[String]) -> Result<(), IngestionError> {
        self._post_rules(&delete_rules_body(ids), "remove").await
    }

    /// Registers `rule` so matching posts are delivered on the stream.
    pub async fn add_rule(&self, rule: &str) -> Result<(), IngestionError> {
        self._post_rules(&add_rules_body(rule), "register").await
    }

    async fn _post_rules(&self, body: &Value, action: &str) -> Result<(), IngestionError> {
        let response = self
            .client
            .post(self._rules_url()?)
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                IngestionError::Transport(format!("Failed to {} filter rules:\n{:?}", action, e))
            })?;
        _check_status(response).await.map(|_| ())
    }

    /// Opens the stream; the body arrives as raw chunks of
    /// newline-delimited JSON.
    pub async fn connect(
        &self,
    ) -> Result<BoxStream<'static, Result<Vec<u8>, IngestionError>>, IngestionError> {
        let stream_url =
            construct_endpoint_url(&self.endpoint_prefix, &["tweets", "search", "stream"])?;
        let response = self
            .client
            .get(stream_url)
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| {
                IngestionError::Transport(format!("Failed to connect to stream:\n{:?}", e))
            })?;
        let response = _check_status(response).await?;
        Ok(response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| IngestionError::Transport(format!("Stream interrupted:\n{:?}", e)))
            })
            .boxed())
    }
}

async fn _check_status(response: Response) -> Result<Response, IngestionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(_status_error(status, &body))
}

fn _status_error(status: StatusCode, body: &str) -> IngestionError {
    let message = format!("{} {}", status, body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IngestionError::Authentication(message),
        _ => IngestionError::StreamStatus(message),
    }
}
