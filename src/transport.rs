use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::error::SyncError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Authenticated JSON transport for one provider API.
///
/// Classifies every outcome into exactly three kinds: `Connection` (timeout or
/// connect failure, always transient), `Response` (non-2xx status or an
/// undecodable 2xx body) and `Ok(Value)`. Retry policy belongs to callers.
pub struct HttpTransport {
    base_url: Url,
    token: String,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: Url, token: String) -> Self {
        Self {
            base_url,
            token,
            client: reqwest::Client::new(),
        }
    }

    /// Issue a request against `endpoint` relative to the fixed base URL.
    /// Absolute endpoints are a programming error and never pass through.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, String)],
        body: Option<Value>,
    ) -> Result<Value, SyncError> {
        if endpoint.contains("://") {
            return Err(SyncError::Validation(format!(
                "endpoint must be relative to the provider base URL, got: {endpoint}"
            )));
        }

        let url = self
            .base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| SyncError::Validation(format!("invalid endpoint {endpoint}: {e}")))?;

        let mut request = self
            .client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(&prune_nulls(body));
        }

        let response = request.send().await.map_err(classify_send_error)?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SyncError::Connection(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(SyncError::Response {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| SyncError::Response {
            status: status.as_u16(),
            body: format!("undecodable response body: {e}"),
        })
    }
}

/// Decode a JSON value into a typed wire shape. A shape mismatch on an
/// ostensibly successful response is a response failure, not a crash.
pub fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, SyncError> {
    serde_json::from_value(value).map_err(|e| SyncError::Response {
        status: 200,
        body: format!("unexpected response shape: {e}"),
    })
}

fn classify_send_error(e: reqwest::Error) -> SyncError {
    if e.is_timeout() || e.is_connect() {
        SyncError::Connection(e.to_string())
    } else if let Some(status) = e.status() {
        SyncError::Response {
            status: status.as_u16(),
            body: e.to_string(),
        }
    } else {
        SyncError::Connection(e.to_string())
    }
}

/// Drop null and empty-string fields from JSON object bodies before
/// serialization; providers reject null-valued fields in create payloads.
/// Booleans survive (a playlist may legitimately be `public: false`).
fn prune_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let pruned: serde_json::Map<String, Value> = map
                .into_iter()
                .filter(|(_, v)| !is_empty_field(v))
                .map(|(k, v)| (k, prune_nulls(v)))
                .collect();
            Value::Object(pruned)
        }
        other => other,
    }
}

fn is_empty_field(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
