//! Generation provider port for the image generation API.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::BananaError;

/// Provider-ready request body, with every reference image already a URL.
///
/// The API key is added by the adapter, not carried here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRequest {
    /// Final prompt text (negative prompt already merged in).
    pub prompt: String,
    /// Aspect ratio token, e.g. `"16:9"`.
    pub aspect_ratio: String,
    /// Upper-case resolution token: `"1K"`, `"2K"` or `"4K"`.
    pub image_size: String,
    /// Public URLs of the reference images, in input order.
    #[serde(rename = "img_url", default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
}

/// Boxed future returned by [`GenerationProvider`] calls: the raw JSON body.
pub type ProviderFuture<'a> =
    Pin<Box<dyn Future<Output = Result<serde_json::Value, BananaError>> + Send + 'a>>;

/// Talks to the remote generation service.
///
/// Both calls return the undecoded response body; interpreting `code`,
/// task ids and image fields is the normalizer's and poller's job.
pub trait GenerationProvider: Send + Sync {
    /// Submit a generation request.
    fn submit(&self, request: &ProviderRequest) -> ProviderFuture<'_>;

    /// Query the status of an asynchronous generation task.
    fn query_task(&self, task_id: &str) -> ProviderFuture<'_>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_field_names() {
        let request = ProviderRequest {
            prompt: "a cat".into(),
            aspect_ratio: "16:9".into(),
            image_size: "2K".into(),
            image_urls: vec!["https://img.example/a.jpg".into()],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["aspectRatio"], "16:9");
        assert_eq!(json["imageSize"], "2K");
        assert_eq!(json["img_url"][0], "https://img.example/a.jpg");
    }

    #[test]
    fn img_url_omitted_without_images() {
        let request = ProviderRequest {
            prompt: "a cat".into(),
            aspect_ratio: "1:1".into(),
            image_size: "1K".into(),
            image_urls: Vec::new(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("img_url").is_none());
    }
}
