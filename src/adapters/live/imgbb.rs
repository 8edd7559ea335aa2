//! Upload host for imgbb.com.

use std::time::Duration;

use reqwest::Client;

use super::{read_json, string_at};
use crate::error::BananaError;
use crate::ports::upload_host::{UploadFuture, UploadHost};

const IMGBB_UPLOAD_URL: &str = "https://api.imgbb.com/1/upload";

/// Uploads through the imgbb v1 API.
pub struct ImgbbHost {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl ImgbbHost {
    /// Create an imgbb client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, BananaError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: IMGBB_UPLOAD_URL.to_string(), api_key })
    }

    /// Point the client at a different upload URL.
    #[cfg(test)]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

impl UploadHost for ImgbbHost {
    fn name(&self) -> &str {
        "imgbb"
    }

    fn upload(&self, base64: &str) -> UploadFuture<'_> {
        let image = base64.to_string();
        Box::pin(async move {
            let response = self
                .client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .form(&[("image", image.as_str())])
                .send()
                .await?;
            let body = read_json(response).await?;

            string_at(&body, &["data", "url"]).ok_or_else(|| {
                BananaError::MalformedResponse("imgbb response has no data.url".into())
            })
        })
    }
}
