//! Interpretation of raw generation responses.
//!
//! The API answers with different shapes depending on whether it finished
//! synchronously, handed back a task id, or which version of the endpoint is
//! live. Everything here is pure: the same body always yields the same
//! outcome.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::BananaError;

/// `code` value the API uses for success.
pub const SUCCESS_CODE: i64 = 200;

const DEFAULT_PROVIDER_MESSAGE: &str = "generation failed";

/// Ordered extraction rules for the image URL. First non-empty string wins.
///
/// | order | field path       |
/// |-------|------------------|
/// | 1     | `data.url`       |
/// | 2     | `data.image_url` |
/// | 3     | `image_url`      |
/// | 4     | `url`            |
pub const IMAGE_URL_RULES: &[&[&str]] =
    &[&["data", "url"], &["data", "image_url"], &["image_url"], &["url"]];

/// Handle to an asynchronous generation task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    /// Opaque task identifier.
    pub id: String,
    /// When the provider handed the task back.
    pub created_at: DateTime<Utc>,
}

impl TaskHandle {
    /// Create a handle stamped with the current time.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), created_at: Utc::now() }
    }
}

/// What a successful response tells us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The image is ready at this URL.
    Image(String),
    /// The provider queued the work; poll this task.
    Pending(TaskHandle),
}

/// Interpret a raw generation response.
///
/// # Errors
///
/// Returns [`BananaError::Provider`] when `code` is not 200 and
/// [`BananaError::MissingImageData`] when no URL can be found.
pub fn normalize(raw: &Value) -> Result<Normalized, BananaError> {
    check_code(raw)?;

    if let Some(id) = pending_task_id(raw) {
        return Ok(Normalized::Pending(TaskHandle::new(id)));
    }

    extract_image_url(raw).map(Normalized::Image).ok_or(BananaError::MissingImageData)
}

/// Fail with [`BananaError::Provider`] unless the top-level `code` is 200.
///
/// # Errors
///
/// Returns the provider's `msg` (or a default) on any other code, including
/// a missing one.
pub fn check_code(raw: &Value) -> Result<(), BananaError> {
    if raw.get("code").and_then(Value::as_i64) == Some(SUCCESS_CODE) {
        return Ok(());
    }
    let message = raw
        .get("msg")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_PROVIDER_MESSAGE);
    Err(BananaError::Provider(message.to_string()))
}

/// Walk [`IMAGE_URL_RULES`] and return the first non-empty URL.
#[must_use]
pub fn extract_image_url(raw: &Value) -> Option<String> {
    IMAGE_URL_RULES.iter().find_map(|path| non_empty_str(lookup(raw, path)?))
}

/// Task id of an asynchronous response: `data.id` with no image field beside it.
fn pending_task_id(raw: &Value) -> Option<String> {
    let data = raw.get("data")?;
    let has_image = |key: &str| data.get(key).and_then(non_empty_str).is_some();
    if has_image("image_url") || has_image("url") {
        return None;
    }
    match data.get("id")? {
        Value::String(s) => Some(s.trim()).filter(|s| !s.is_empty()).map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lookup<'a>(raw: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(raw, |value, key| value.get(key))
}

fn non_empty_str(value: &Value) -> Option<String> {
    value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(ToString::to_string)
}
