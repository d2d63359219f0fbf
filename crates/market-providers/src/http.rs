use std::time::Duration;

use hype_core::ProviderError;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;

/// Browser-like agent; Yahoo rejects requests without one.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Longest error body kept in `ProviderError::Http`.
const MAX_ERROR_BODY: usize = 200;

/// Thin wrapper over `reqwest::Client` that turns every outcome into a
/// `ProviderError` class.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, timeout }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn get_json(&self, url: &str, query: &[(&str, &str)]) -> Result<Value, ProviderError> {
        self.send_json(self.client.get(url).query(query)).await
    }

    pub async fn send_json(&self, builder: RequestBuilder) -> Result<Value, ProviderError> {
        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    fn transport_error(&self, err: reqwest::Error) -> ProviderError {
        if err.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

pub(crate) fn status_error(status: StatusCode, body: &str) -> ProviderError {
    let message: String = body.chars().take(MAX_ERROR_BODY).collect();
    match status.as_u16() {
        401 | 403 => ProviderError::Unauthorized(format!("HTTP {}", status.as_u16())),
        429 => ProviderError::RateLimited(format!("HTTP 429: {message}")),
        code => ProviderError::Http {
            status: code,
            message,
        },
    }
}

/// Deserialize a JSON value into an adapter-private wire type.
pub(crate) fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::Malformed(e.to_string()))
}

/// Fails with `Unauthorized` when a credential is missing or blank.
pub(crate) fn require_key<'a>(key: &'a Option<String>, provider: &str) -> Result<&'a str, ProviderError> {
    key.as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| ProviderError::Unauthorized(format!("no {provider} API key configured")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            status_error(StatusCode::UNAUTHORIZED, ""),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "nope"),
            ProviderError::Unauthorized(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, "slow down"),
            ProviderError::RateLimited(_)
        ));
        assert_eq!(
            status_error(StatusCode::BAD_GATEWAY, "upstream"),
            ProviderError::Http {
                status: 502,
                message: "upstream".to_string()
            }
        );
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "x".repeat(1_000);
        match status_error(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ProviderError::Http { message, .. } => assert_eq!(message.len(), MAX_ERROR_BODY),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_require_key() {
        assert_eq!(require_key(&Some(" abc ".into()), "finnhub").unwrap(), "abc");
        assert!(matches!(
            require_key(&Some("  ".into()), "finnhub"),
            Err(ProviderError::Unauthorized(_))
        ));
        assert!(require_key(&None, "finnhub").is_err());
    }

    #[test]
    fn test_decode_reports_malformed() {
        let result: Result<Vec<u32>, _> = decode(serde_json::json!({"not": "a list"}));
        assert!(matches!(result, Err(ProviderError::Malformed(_))));
    }
}
