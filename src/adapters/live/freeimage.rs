//! Upload host for freeimage.host.

use std::time::Duration;

use reqwest::Client;

use super::{read_json, string_at};
use crate::error::BananaError;
use crate::ports::upload_host::{UploadFuture, UploadHost};

const FREEIMAGE_UPLOAD_URL: &str = "https://freeimage.host/api/1/upload";

/// Uploads through the freeimage.host v1 API (form-encoded, JSON reply).
pub struct FreeImageHost {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl FreeImageHost {
    /// Create a freeimage.host client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, BananaError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: FREEIMAGE_UPLOAD_URL.to_string(), api_key })
    }

    /// Point the client at a different upload URL.
    #[cfg(test)]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl UploadHost for FreeImageHost {
    fn name(&self) -> &str {
        "freeimage"
    }

    fn upload(&self, base64: &str) -> UploadFuture<'_> {
        let source = base64.to_string();
        Box::pin(async move {
            let form =
                [("key", self.api_key.as_str()), ("source", source.as_str()), ("format", "json")];
            let response = self.client.post(&self.endpoint).form(&form).send().await?;
            let body = read_json(response).await?;

            string_at(&body, &["image", "url"]).ok_or_else(|| {
                BananaError::MalformedResponse("freeimage.host response has no image.url".into())
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn host_for(server: &MockServer) -> FreeImageHost {
        FreeImageHost::new("fi-key".into(), Duration::from_secs(5))
            .unwrap()
            .with_endpoint(format!("{}/api/1/upload", server.uri()))
    }

    #[tokio::test]
    async fn posts_form_and_reads_image_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/1/upload"))
            .and(body_string_contains("key=fi-key"))
            .and(body_string_contains("source=QUJD"))
            .and(body_string_contains("format=json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status_code": 200,
                "image": {"url": "https://iili.io/abc.jpg"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        assert_eq!(host_for(&server).upload("QUJD").await.unwrap(), "https://iili.io/abc.jpg");
    }

    #[tokio::test]
    async fn missing_image_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"status_code": 400, "error": {}})),
            )
            .mount(&server)
            .await;

        let err = host_for(&server).upload("QUJD").await.unwrap_err();
        assert!(matches!(err, BananaError::MalformedResponse(_)));
    }
}
