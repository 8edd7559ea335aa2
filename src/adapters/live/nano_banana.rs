//! Live adapter for the Nano Banana Pro image generation API.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::Client;
use serde_json::Value;

use super::read_json;
use crate::error::BananaError;
use crate::ports::generation::{GenerationProvider, ProviderFuture, ProviderRequest};

/// Default API host.
pub const DEFAULT_API_BASE: &str = "https://api.wuyinkeji.com";

const GENERATE_PATH: &str = "/api/img/nanoBanana-pro";
const DETAIL_PATH: &str = "/api/img/drawDetail";

/// Calls the generation and task-detail endpoints.
///
/// The key travels in the `Authorization` header, the `key` query parameter
/// and the JSON body, as the API's auth docs ask.
pub struct NanoBananaProvider {
    client: Client,
    api_base: String,
    api_key: String,
}

impl NanoBananaProvider {
    /// Create a provider for `api_base` with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_base: &str, api_key: String, timeout: Duration) -> Result<Self, BananaError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_base: api_base.trim_end_matches('/').to_string(), api_key })
    }
}

impl GenerationProvider for NanoBananaProvider {
    fn submit(&self, request: &ProviderRequest) -> ProviderFuture<'_> {
        let request = request.clone();
        Box::pin(async move {
            let mut body = serde_json::to_value(&request).map_err(|e| {
                BananaError::MalformedResponse(format!("Failed to encode request: {e}"))
            })?;
            body["key"] = Value::String(self.api_key.clone());

            let response = self
                .client
                .post(format!("{}{GENERATE_PATH}", self.api_base))
                .query(&[("key", self.api_key.as_str())])
                .header(AUTHORIZATION, &self.api_key)
                .json(&body)
                .send()
                .await?;

            read_json(response).await
        })
    }

    fn query_task(&self, task_id: &str) -> ProviderFuture<'_> {
        let task_id = task_id.to_string();
        Box::pin(async move {
            let response = self
                .client
                .get(format!("{}{DETAIL_PATH}", self.api_base))
                .query(&[("key", self.api_key.as_str()), ("id", task_id.as_str())])
                .send()
                .await?;

            read_json(response).await
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(server: &MockServer) -> NanoBananaProvider {
        NanoBananaProvider::new(&server.uri(), "test-key".into(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn submit_sends_key_everywhere() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(query_param("key", "test-key"))
            .and(header("authorization", "test-key"))
            .and(body_partial_json(json!({
                "key": "test-key",
                "prompt": "a cat",
                "aspectRatio": "16:9",
                "imageSize": "2K",
                "img_url": ["https://img.example/ref.png"]
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 200, "data": {"id": "t1"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = ProviderRequest {
            prompt: "a cat".into(),
            aspect_ratio: "16:9".into(),
            image_size: "2K".into(),
            image_urls: vec!["https://img.example/ref.png".into()],
        };
        let body = provider(&server).submit(&request).await.unwrap();
        assert_eq!(body["data"]["id"], "t1");
    }

    #[tokio::test]
    async fn query_task_passes_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DETAIL_PATH))
            .and(query_param("key", "test-key"))
            .and(query_param("id", "t1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"code": 200, "data": {"status": 1}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let body = provider(&server).query_task("t1").await.unwrap();
        assert_eq!(body["data"]["status"], 1);
    }

    #[tokio::test]
    async fn http_error_uses_body_msg() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"code": 403, "msg": "key disabled"})),
            )
            .mount(&server)
            .await;

        let request = ProviderRequest {
            prompt: "a cat".into(),
            aspect_ratio: "1:1".into(),
            image_size: "1K".into(),
            image_urls: Vec::new(),
        };
        let err = provider(&server).submit(&request).await.unwrap_err();
        assert!(
            matches!(err, BananaError::Api { status: 403, ref message } if message == "key disabled")
        );
    }

    #[tokio::test]
    async fn garbage_body_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(DETAIL_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = provider(&server).query_task("t1").await.unwrap_err();
        assert!(matches!(err, BananaError::MalformedResponse(_)));
        assert!(err.is_transient());
    }
}
