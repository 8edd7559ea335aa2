//! Live adapters that talk to real services.

pub mod freeimage;
pub mod imgbb;
pub mod nano_banana;
pub mod relay;
pub mod sleeper;

use reqwest::Response;
use serde_json::Value;

use crate::error::BananaError;

const MAX_ERROR_BODY: usize = 500;

/// Read a JSON body, turning non-2xx statuses into [`BananaError::Api`].
///
/// The error message prefers a `msg` or `message` field from the body.
pub(crate) async fn read_json(response: Response) -> Result<Value, BananaError> {
    let status = response.status();
    let text = response.text().await?;
    let parsed = serde_json::from_str::<Value>(&text);

    if !status.is_success() {
        let message = parsed
            .ok()
            .and_then(|body| {
                ["msg", "message"]
                    .iter()
                    .find_map(|key| body.get(key).and_then(Value::as_str).map(str::to_string))
            })
            .unwrap_or_else(|| truncate(&text));
        return Err(BananaError::Api { status: status.as_u16(), message });
    }

    parsed.map_err(|e| {
        BananaError::MalformedResponse(format!("Failed to parse response: {e}. Body: {}", truncate(&text)))
    })
}

/// Shorten a response body for error messages.
pub(crate) fn truncate(text: &str) -> String {
    if text.chars().count() > MAX_ERROR_BODY {
        format!("{}...", text.chars().take(MAX_ERROR_BODY).collect::<String>())
    } else {
        text.to_string()
    }
}

/// First non-empty string at `path` in `body`.
pub(crate) fn string_at(body: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(body, |value, key| value.get(key))
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn truncate_long_body() {
        let long = "é".repeat(600);
        let short = truncate(&long);
        assert!(short.ends_with("..."));
        assert_eq!(short.chars().count(), MAX_ERROR_BODY + 3);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn string_at_paths() {
        let body = json!({"image": {"url": "https://x.example/a.jpg"}, "blank": " "});
        assert_eq!(string_at(&body, &["image", "url"]).as_deref(), Some("https://x.example/a.jpg"));
        assert!(string_at(&body, &["blank"]).is_none());
        assert!(string_at(&body, &["image", "missing"]).is_none());
    }
}
