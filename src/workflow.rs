//! The generate → upload → submit → poll workflow.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::error::BananaError;
use crate::normalizer::{normalize, Normalized};
use crate::params::{AspectRatio, Resolution};
use crate::poller::{PollPolicy, TaskPoller};
use crate::ports::{GenerationProvider, Sleeper};
use crate::request::{GenerationRequest, ImagePayload, RequestBuilder};
use crate::upload::UploadRelay;

/// Default blend mode for [`Generator::multi_fusion`].
pub const DEFAULT_FUSION_MODE: &str = "blend";

/// Outcome of one generation, handed back to the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// Whether an image was produced.
    pub success: bool,
    /// Image URL, present iff `success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// The submit response as received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_provider_response: Option<Value>,
    /// Short user-facing message, present iff `!success`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationResult {
    /// A successful result.
    #[must_use]
    pub fn succeeded(image_url: String, raw_provider_response: Value) -> Self {
        Self {
            success: true,
            image_url: Some(image_url),
            raw_provider_response: Some(raw_provider_response),
            error: None,
        }
    }

    /// A failed result carrying the error's message.
    #[must_use]
    pub fn failed(error: &BananaError) -> Self {
        Self {
            success: false,
            image_url: None,
            raw_provider_response: None,
            error: Some(error.to_string()),
        }
    }
}

/// Runs generations against one provider and upload chain.
pub struct Generator {
    provider: Box<dyn GenerationProvider>,
    relay: UploadRelay,
    sleeper: Box<dyn Sleeper>,
    policy: PollPolicy,
}

impl Generator {
    /// Wire a generator from its ports.
    #[must_use]
    pub fn new(
        provider: Box<dyn GenerationProvider>,
        relay: UploadRelay,
        sleeper: Box<dyn Sleeper>,
        policy: PollPolicy,
    ) -> Self {
        Self { provider, relay, sleeper, policy }
    }

    /// Run one generation.
    ///
    /// Every failure comes back as a `success: false` result. Returns `None`
    /// only when `cancel` fired, in which case there is nothing to report.
    pub async fn generate(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Option<GenerationResult> {
        match self.run(request, cancel).await {
            Ok((image_url, raw)) => {
                info!(%image_url, "generation finished");
                Some(GenerationResult::succeeded(image_url, raw))
            }
            Err(BananaError::Cancelled) => {
                debug!("generation cancelled");
                None
            }
            Err(e) => {
                warn!(error = %e, "generation failed");
                Some(GenerationResult::failed(&e))
            }
        }
    }

    /// Generate from reference images guided by a prompt.
    pub async fn image_to_image(
        &self,
        images: Vec<ImagePayload>,
        prompt: &str,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
        cancel: &CancelToken,
    ) -> Option<GenerationResult> {
        match GenerationRequest::new(prompt, None, aspect_ratio, resolution, images) {
            Ok(request) => self.generate(&request, cancel).await,
            Err(e) => Some(GenerationResult::failed(&e)),
        }
    }

    /// Blend several reference images; the mode is expressed in the prompt.
    pub async fn multi_fusion(
        &self,
        images: Vec<ImagePayload>,
        prompt: &str,
        mode: &str,
        aspect_ratio: AspectRatio,
        resolution: Resolution,
        cancel: &CancelToken,
    ) -> Option<GenerationResult> {
        if images.is_empty() {
            let e = BananaError::Validation("Fusion needs at least one reference image".into());
            return Some(GenerationResult::failed(&e));
        }
        let prompt = format!("Fusion mode: {mode}. {}", prompt.trim());
        self.image_to_image(images, &prompt, aspect_ratio, resolution, cancel).await
    }

    async fn run(
        &self,
        request: &GenerationRequest,
        cancel: &CancelToken,
    ) -> Result<(String, Value), BananaError> {
        let builder = RequestBuilder::new(&self.relay);
        let provider_request = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(BananaError::Cancelled),
            built = builder.build(request) => built?,
        };

        debug!(
            ratio = %provider_request.aspect_ratio,
            size = %provider_request.image_size,
            images = provider_request.image_urls.len(),
            "submitting generation"
        );
        if cancel.is_cancelled() {
            return Err(BananaError::Cancelled);
        }
        let raw = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(BananaError::Cancelled),
            raw = self.provider.submit(&provider_request) => raw?,
        };

        let image_url = match normalize(&raw)? {
            Normalized::Image(url) => url,
            Normalized::Pending(handle) => {
                info!(task = %handle.id, "generation queued, polling");
                TaskPoller::new(self.provider.as_ref(), self.sleeper.as_ref(), self.policy)
                    .poll(&handle, cancel)
                    .await?
            }
        };
        Ok((image_url, raw))
    }
}
