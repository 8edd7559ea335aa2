//! Configuration file loading with environment variable overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::adapters::live::nano_banana::DEFAULT_API_BASE;
use crate::codec::CompressLimits;
use crate::poller::PollPolicy;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// API keys.
    #[serde(default)]
    pub keys: KeysConfig,

    /// Generation API settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Task polling cadence.
    #[serde(default)]
    pub poll: PollConfig,

    /// How the CLI uploads reference images.
    #[serde(default)]
    pub upload: UploadConfig,

    /// Settings for `banana relay`.
    #[serde(default)]
    pub relay: RelayConfig,

    /// Reference image compression.
    #[serde(default)]
    pub image: ImageConfig,
}

/// API key configuration. Environment variables take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct KeysConfig {
    /// Generation API key (`BANANA_API_KEY`).
    pub provider: Option<String>,
    /// freeimage.host key (`FREEIMAGE_API_KEY`).
    pub freeimage: Option<String>,
    /// imgbb key (`IMGBB_API_KEY`).
    pub imgbb: Option<String>,
}

/// Generation API settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// API host, without a trailing path.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self { base_url: DEFAULT_API_BASE.to_string(), timeout_secs: 60 }
    }
}

/// Task polling cadence.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Milliseconds between status queries.
    pub interval_ms: u64,
    /// Maximum number of status queries.
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 2000, max_attempts: 60 }
    }
}

/// An image host that can appear in an upload chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostKind {
    /// The banana upload relay (`banana relay`).
    Relay,
    /// freeimage.host.
    FreeImage,
    /// imgbb.com.
    Imgbb,
}

/// Client-side upload chain.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Hosts to try, in order.
    pub hosts: Vec<HostKind>,
    /// Relay endpoint used by the `relay` host.
    pub relay_url: String,
    /// Per-upload timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            hosts: vec![HostKind::Relay],
            relay_url: "http://127.0.0.1:3000/api/upload".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Server-side settings for the upload relay.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Listen address.
    pub bind: String,
    /// Upstream hosts to try, in order.
    pub hosts: Vec<HostKind>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1:3000".to_string(), hosts: vec![HostKind::FreeImage, HostKind::Imgbb] }
    }
}

/// Reference image compression settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum width in pixels.
    pub max_width: u32,
    /// Maximum height in pixels.
    pub max_height: u32,
    /// JPEG quality, 1 to 100.
    pub quality: u8,
}

impl Default for ImageConfig {
    fn default() -> Self {
        let limits = CompressLimits::default();
        Self { max_width: limits.max_width, max_height: limits.max_height, quality: limits.quality }
    }
}

impl ImageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err("[image] max_width and max_height must be at least 1".into());
        }
        if !(1..=100).contains(&self.quality) {
            return Err("[image] quality must be between 1 and 100".into());
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from the given path, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed, or if the
    /// image limits are out of range.
    pub fn load(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
        config.image.validate().map_err(|e| format!("Invalid config {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Generation API key, preferring the environment.
    #[must_use]
    pub fn provider_key(&self) -> Option<String> {
        env_or("BANANA_API_KEY", self.keys.provider.as_ref())
    }

    /// freeimage.host key, preferring the environment.
    #[must_use]
    pub fn freeimage_key(&self) -> Option<String> {
        env_or("FREEIMAGE_API_KEY", self.keys.freeimage.as_ref())
    }

    /// imgbb key, preferring the environment.
    #[must_use]
    pub fn imgbb_key(&self) -> Option<String> {
        env_or("IMGBB_API_KEY", self.keys.imgbb.as_ref())
    }

    /// Generation API host, preferring `BANANA_API_BASE`.
    #[must_use]
    pub fn api_base(&self) -> String {
        env_or("BANANA_API_BASE", Some(&self.provider.base_url)).unwrap_or_default()
    }

    /// Relay endpoint, preferring `BANANA_RELAY_URL`.
    #[must_use]
    pub fn relay_url(&self) -> String {
        env_or("BANANA_RELAY_URL", Some(&self.upload.relay_url)).unwrap_or_default()
    }

    /// Polling policy; `BANANA_POLL_INTERVAL_MS` overrides the interval.
    #[must_use]
    pub fn poll_policy(&self) -> PollPolicy {
        let interval_ms = std::env::var("BANANA_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(self.poll.interval_ms);
        PollPolicy {
            interval: Duration::from_millis(interval_ms),
            max_attempts: self.poll.max_attempts,
        }
    }

    /// Reference image compression limits.
    #[must_use]
    pub fn compress_limits(&self) -> CompressLimits {
        CompressLimits {
            max_width: self.image.max_width,
            max_height: self.image.max_height,
            quality: self.image.quality,
        }
    }
}

fn env_or(var: &str, fallback: Option<&String>) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty()).or_else(|| fallback.cloned())
}

/// Directory holding config and state: `~/.config/banana`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config/banana")
    } else {
        PathBuf::from(".")
    }
}

/// Discover the config file path using the resolution order:
/// 1. Explicit path (from `--config` flag)
/// 2. `BANANA_CONFIG` environment variable
/// 3. `~/.config/banana/config.toml`
#[must_use]
pub fn discover_config_path(explicit: Option<&str>) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }

    if let Ok(p) = std::env::var("BANANA_CONFIG") {
        return PathBuf::from(p);
    }

    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert!(config.keys.provider.is_none());
        assert_eq!(config.provider.base_url, "https://api.wuyinkeji.com");
        assert_eq!(config.provider.timeout_secs, 60);
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.poll.max_attempts, 60);
        assert_eq!(config.upload.hosts, vec![HostKind::Relay]);
        assert_eq!(config.upload.timeout_secs, 30);
        assert_eq!(config.relay.hosts, vec![HostKind::FreeImage, HostKind::Imgbb]);
        assert_eq!(config.compress_limits(), CompressLimits::default());
    }

    #[test]
    fn load_nonexistent_returns_defaults() {
        let config = Config::load(Path::new("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.poll.max_attempts, 60);
    }

    #[test]
    fn load_valid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[keys]
provider = "test-provider-key"
imgbb = "test-imgbb-key"

[provider]
base_url = "http://localhost:9999"

[poll]
max_attempts = 5

[upload]
hosts = ["freeimage", "imgbb"]

[relay]
bind = "0.0.0.0:8080"
hosts = ["imgbb"]

[image]
quality = 60
"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.keys.provider.as_deref(), Some("test-provider-key"));
        assert_eq!(config.keys.imgbb.as_deref(), Some("test-imgbb-key"));
        assert_eq!(config.provider.base_url, "http://localhost:9999");
        assert_eq!(config.provider.timeout_secs, 60, "unset fields keep defaults");
        assert_eq!(config.poll.max_attempts, 5);
        assert_eq!(config.poll.interval_ms, 2000);
        assert_eq!(config.upload.hosts, vec![HostKind::FreeImage, HostKind::Imgbb]);
        assert_eq!(config.relay.bind, "0.0.0.0:8080");
        assert_eq!(config.relay.hosts, vec![HostKind::Imgbb]);
        assert_eq!(config.image.quality, 60);
        assert_eq!(config.image.max_width, 1024);
    }

    #[test]
    fn load_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn zero_image_limit_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.toml");
        std::fs::write(&path, "[image]\nmax_width = 0\n").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(err.contains("max_width"), "got {err}");
    }

    #[test]
    fn zero_quality_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quality.toml");
        std::fs::write(&path, "[image]\nquality = 0\n").unwrap();

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn unknown_host_rejected() {
        let parsed: Result<Config, _> = toml::from_str("[upload]\nhosts = [\"dropbox\"]\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn key_from_file_without_env() {
        let config = Config {
            keys: KeysConfig { freeimage: Some("from-file".into()), ..KeysConfig::default() },
            ..Config::default()
        };

        std::env::remove_var("FREEIMAGE_API_KEY");
        assert_eq!(config.freeimage_key().as_deref(), Some("from-file"));
    }

    #[test]
    fn discover_explicit_path() {
        let path = discover_config_path(Some("/tmp/my-config.toml"));
        assert_eq!(path, PathBuf::from("/tmp/my-config.toml"));
    }
}
