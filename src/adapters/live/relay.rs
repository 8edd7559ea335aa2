//! Upload host that goes through the banana upload relay.

use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};

use super::{read_json, string_at};
use crate::error::BananaError;
use crate::ports::upload_host::{UploadFuture, UploadHost};

/// Posts `{ "base64": ... }` to a relay endpoint and reads back `{ success, url }`.
pub struct RelayHost {
    client: Client,
    endpoint: String,
}

impl RelayHost {
    /// Create a relay client for `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, BananaError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint: endpoint.into() })
    }
}

impl UploadHost for RelayHost {
    fn name(&self) -> &str {
        "relay"
    }

    fn upload(&self, base64: &str) -> UploadFuture<'_> {
        let body = json!({ "base64": base64 });
        Box::pin(async move {
            let response = self.client.post(&self.endpoint).json(&body).send().await?;
            let body = read_json(response).await?;

            if body.get("success").and_then(Value::as_bool) != Some(true) {
                return Err(BananaError::MalformedResponse("relay did not report success".into()));
            }
            string_at(&body, &["url"])
                .ok_or_else(|| BananaError::MalformedResponse("relay response has no url".into()))
        })
    }
}
