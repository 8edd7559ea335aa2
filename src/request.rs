//! Generation requests and their translation into provider requests.

use std::path::Path;

use futures::future::try_join_all;
use tracing::debug;

use crate::codec::{compress_image, encode_base64, strip_data_uri_prefix, CompressLimits};
use crate::error::BananaError;
use crate::params::{AspectRatio, Resolution};
use crate::ports::ProviderRequest;
use crate::upload::UploadRelay;

/// A reference image in whatever form the user supplied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImagePayload {
    /// Already hosted at a public URL.
    Url(String),
    /// A `data:image/...;base64,` URI.
    DataUri(String),
    /// Bare base64 image data.
    Base64(String),
    /// Encoded image bytes.
    Bytes(Vec<u8>),
}

impl ImagePayload {
    /// Classify a string: `http(s)://` is a URL, `data:` a data URI,
    /// anything else bare base64.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let text = text.trim();
        if is_remote_url(text) {
            Self::Url(text.to_string())
        } else if text.starts_with("data:") {
            Self::DataUri(text.to_string())
        } else {
            Self::Base64(text.to_string())
        }
    }

    /// Resolve a command-line image argument: a URL or data URI is taken as
    /// is, anything else is read from disk and compressed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub fn from_arg(arg: &str, limits: &CompressLimits) -> Result<Self, BananaError> {
        let arg = arg.trim();
        if is_remote_url(arg) || arg.starts_with("data:") {
            return Ok(Self::from_text(arg));
        }
        let data = std::fs::read(Path::new(arg))?;
        Ok(Self::Bytes(compress_image(&data, limits)?))
    }
}

fn is_remote_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// What the user asked for. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    negative_prompt: Option<String>,
    aspect_ratio: AspectRatio,
    resolution: Resolution,
    reference_images: Vec<ImagePayload>,
}

impl GenerationRequest {
    /// Validate and assemble a request.
    ///
    /// # Errors
    ///
    /// Returns [`BananaError::Validation`] when the prompt is empty or only
    /// whitespace.
    pub fn new(
        prompt: &str,
        negative_prompt: Option<&str>,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
        reference_images: Vec<ImagePayload>,
    ) -> Result<Self, BananaError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(BananaError::Validation("Please enter a prompt".into()));
        }
        let negative_prompt =
            negative_prompt.map(str::trim).filter(|n| !n.is_empty()).map(str::to_string);
        Ok(Self {
            prompt: prompt.to_string(),
            negative_prompt,
            aspect_ratio,
            resolution,
            reference_images,
        })
    }

    /// The prompt as entered.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Prompt text with the negative prompt folded in.
    ///
    /// The API has no separate negative-prompt field.
    #[must_use]
    pub fn merged_prompt(&self) -> String {
        match &self.negative_prompt {
            Some(negative) => format!("{}, negative prompt: {negative}", self.prompt),
            None => self.prompt.clone(),
        }
    }
}

/// Turns a [`GenerationRequest`] into a [`ProviderRequest`], uploading any
/// reference image that is not yet a URL.
pub struct RequestBuilder<'a> {
    relay: &'a UploadRelay,
}

impl<'a> RequestBuilder<'a> {
    /// Create a builder that uploads through `relay`.
    #[must_use]
    pub fn new(relay: &'a UploadRelay) -> Self {
        Self { relay }
    }

    /// Build the provider request.
    ///
    /// Image uploads run concurrently and the first failure wins; uploads
    /// still in flight at that point are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`BananaError::UploadFailure`] when any reference image cannot
    /// be hosted.
    pub async fn build(&self, request: &GenerationRequest) -> Result<ProviderRequest, BananaError> {
        let image_urls =
            try_join_all(request.reference_images.iter().map(|image| self.resolve(image))).await?;
        debug!(images = image_urls.len(), "reference images resolved");

        Ok(ProviderRequest {
            prompt: request.merged_prompt(),
            aspect_ratio: request.aspect_ratio.as_str().to_string(),
            image_size: request.resolution.as_provider_str().to_string(),
            image_urls,
        })
    }

    async fn resolve(&self, image: &ImagePayload) -> Result<String, BananaError> {
        match image {
            ImagePayload::Url(url) => Ok(url.clone()),
            ImagePayload::DataUri(uri) => self.relay.upload(strip_data_uri_prefix(uri)).await,
            ImagePayload::Base64(data) => self.relay.upload(data).await,
            ImagePayload::Bytes(bytes) => self.relay.upload(&encode_base64(bytes)).await,
        }
    }
}
