//! Client for the remote JSON APIs being ingested.

use lading_core::RecordBatch;
use lading_error::{FetchError, InputError, InputErrorKind, LadingResult};
use reqwest::Url;
use serde_json::{Map, Value as JsonValue};
use std::time::Duration;
use tracing::instrument;

/// Fetches JSON bodies and normalizes them into record batches.
#[derive(Debug, Clone)]
pub struct RecordFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl RecordFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// GET `endpoint` with `query_params` and normalize the JSON body.
    ///
    /// # Errors
    ///
    /// - `InputError` when the endpoint is not an http(s) URL or the body is
    ///   neither an object nor a non-empty array of objects
    /// - `FetchError` on transport failures, non-2xx statuses and bodies that
    ///   are not JSON
    #[instrument(name = "fetch.fetch", skip(self, query_params), fields(endpoint = %endpoint))]
    pub async fn fetch(
        &self,
        endpoint: &str,
        query_params: Option<&Map<String, JsonValue>>,
    ) -> LadingResult<RecordBatch> {
        let url = parse_endpoint(endpoint)?;
        let params = query_params.map(render_query_params).unwrap_or_default();
        tracing::debug!(params = params.len(), "Fetching remote records");

        let response = self
            .client
            .get(url)
            .query(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request failed: {}", e);
                FetchError::new(format!("Failed to fetch API data: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("Remote API returned error: {}", status);
            return Err(FetchError::new(format!("Remote API returned: {}", status)).into());
        }

        let body: JsonValue = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse response: {}", e);
            FetchError::new(format!("Remote API returned invalid JSON: {}", e))
        })?;

        let batch = RecordBatch::from_json(body)?;
        tracing::info!(records = batch.len(), "Fetched remote records");
        Ok(batch)
    }
}

/// Accept only absolute http and https URLs.
fn parse_endpoint(endpoint: &str) -> Result<Url, InputError> {
    let url = Url::parse(endpoint.trim())
        .map_err(|_| InputError::new(InputErrorKind::InvalidEndpoint(endpoint.to_string())))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(InputError::new(InputErrorKind::InvalidEndpoint(
            endpoint.to_string(),
        ))),
    }
}

/// Render query parameters as strings; strings are sent raw, nulls are dropped.
///
/// # Examples
///
/// ```
/// use lading_server::render_query_params;
/// use serde_json::json;
///
/// let params = json!({"q": "rust", "page": 2, "strict": true, "skip": null});
/// let rendered = render_query_params(params.as_object().unwrap());
/// assert_eq!(
///     rendered,
///     vec![
///         ("q".to_string(), "rust".to_string()),
///         ("page".to_string(), "2".to_string()),
///         ("strict".to_string(), "true".to_string()),
///     ]
/// );
/// ```
pub fn render_query_params(params: &Map<String, JsonValue>) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| {
            let rendered = match value {
                JsonValue::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_endpoint() {
        assert!(parse_endpoint("https://api.example.com/items").is_ok());
        assert!(parse_endpoint("http://localhost:8080/").is_ok());

        let err = parse_endpoint("ftp://example.com/file").unwrap_err();
        assert!(matches!(err.kind, InputErrorKind::InvalidEndpoint(_)));
        assert!(parse_endpoint("not a url").is_err());
        assert!(parse_endpoint("/relative/path").is_err());
    }
}
