//! Thin client for the OpenAI-compatible upstream API.
//!
//! Every response body is read as text first. Non-success bodies are never parsed, so an HTML
//! error page or a plain `rate limited` cannot cause a second failure on top of the first.

use reqwest::{Client, RequestBuilder, header::CONTENT_TYPE, multipart::Form};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::OpenAiConfig;
use crate::errors::{Error, Result, snippet};

pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiClient {
    pub fn new(http: Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout: config.request_timeout,
        }
    }

    /// Fails without touching the network when no credential is configured.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or_else(|| Error::Configuration {
            message: "Missing OPENAI_API_KEY: set it in the environment or openai.api_key in the config file".to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, path: &str) -> Result<RequestBuilder> {
        let api_key = self.api_key()?;
        let mut request = self.http.post(self.url(path)).bearer_auth(api_key);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        Ok(request)
    }

    /// POST a JSON body and return the parsed JSON response.
    #[instrument(skip(self, body))]
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let request = self.request(path)?.json(body);
        self.send(request).await
    }

    /// POST a multipart form and return the parsed JSON response.
    #[instrument(skip(self, form))]
    pub async fn post_multipart(&self, path: &str, form: Form) -> Result<Value> {
        let request = self.request(path)?.multipart(form);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let text = response.text().await?;

        debug!(%status, %content_type, bytes = text.len(), "Upstream responded");

        if !status.is_success() {
            return Err(Error::Upstream {
                status,
                body: snippet(&text),
            });
        }

        if !content_type.contains("json") {
            return Err(Error::InvalidUpstreamBody {
                message: format!(
                    "Upstream returned unexpected content-type '{}'",
                    if content_type.is_empty() { "none" } else { &content_type }
                ),
                raw: Some(snippet(&text)),
            });
        }

        serde_json::from_str(&text).map_err(|e| Error::InvalidUpstreamBody {
            message: format!("Upstream returned invalid JSON: {e}"),
            raw: Some(snippet(&text)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{any, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> OpenAiClient {
        let config = OpenAiConfig {
            api_key: api_key.map(str::to_string),
            base_url: format!("{}/v1/", server.uri()).parse().unwrap(),
            ..Default::default()
        };
        OpenAiClient::new(crate::build_http_client().unwrap(), &config)
    }

    #[tokio::test]
    async fn test_post_json_sends_bearer_and_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/responses"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let value = client.post_json("responses", &json!({})).await.unwrap();

        assert_eq!(value, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_missing_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(any()).respond_with(ResponseTemplate::new(200)).expect(0).mount(&server).await;

        let client = client_for(&server, None);
        let err = client.post_json("responses", &json!({})).await.unwrap_err();

        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[tokio::test]
    async fn test_blank_key_counts_as_missing() {
        let server = MockServer::start().await;
        let client = client_for(&server, Some("   "));

        assert!(client.api_key().is_err());
    }

    #[tokio::test]
    async fn test_error_status_keeps_raw_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let err = client.post_json("responses", &json!({})).await.unwrap_err();

        match err {
            Error::Upstream { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "rate limited");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_with_wrong_content_type() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let err = client.post_json("responses", &json!({})).await.unwrap_err();

        assert!(err.to_string().contains("content-type"));
        assert_eq!(err.raw().as_deref(), Some("<html>gateway</html>"));
    }

    #[tokio::test]
    async fn test_success_with_broken_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{\"output\": [", "application/json"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("sk-test"));
        let err = client.post_json("responses", &json!({})).await.unwrap_err();

        assert!(err.to_string().contains("invalid JSON"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let config = OpenAiConfig {
            api_key: Some("sk-test".to_string()),
            base_url: server.uri().parse().unwrap(),
            request_timeout: Some(Duration::from_millis(50)),
            ..Default::default()
        };
        let client = OpenAiClient::new(crate::build_http_client().unwrap(), &config);
        let err = client.post_json("responses", &json!({})).await.unwrap_err();

        assert!(matches!(err, Error::UpstreamTransport(_)));
    }
}
