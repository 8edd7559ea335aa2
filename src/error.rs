//! Unified error type for banana.

use thiserror::Error;

/// Errors that can occur while generating, uploading or saving images.
#[derive(Debug, Error)]
pub enum BananaError {
    /// User input was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// Every configured image host rejected the upload or timed out.
    #[error("Reference image upload failed: all image hosts exhausted ({})", hosts.join(", "))]
    UploadFailure {
        /// Names of the hosts that were tried, in order.
        hosts: Vec<String>,
    },

    /// The generation API answered with a non-success `code`.
    #[error("Generation failed: {0}")]
    Provider(String),

    /// The generation API reported success but no image URL could be found.
    #[error("No image data found in the API response")]
    MissingImageData,

    /// The task never reached a terminal state within the attempt ceiling.
    #[error("Timed out waiting for the image after {attempts} status checks, please retry later")]
    PollTimeout {
        /// Number of status queries issued.
        attempts: u32,
    },

    /// The provider explicitly reported that generation failed.
    #[error("Image generation failed: {0}")]
    PollFailure(String),

    /// The caller cancelled the operation.
    #[error("Cancelled")]
    Cancelled,

    /// An API returned a non-2xx HTTP response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// A network error occurred.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response body could not be parsed or lacked an expected field.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// Image decoding or encoding error.
    #[error("Image conversion error: {0}")]
    ImageConversion(String),

    /// No API key configured for a service.
    #[error("No API key for {provider}. Set {env_var} or add it to config file.")]
    MissingApiKey {
        /// The service name.
        provider: String,
        /// The environment variable name.
        env_var: String,
    },
}

impl BananaError {
    /// Whether a failed status query carries no new information and polling
    /// should continue.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Api { .. } | Self::MalformedResponse(_))
    }
}
