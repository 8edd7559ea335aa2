//! Ordered fallback chain of image hosts.

use tracing::{debug, warn};

use crate::error::BananaError;
use crate::ports::UploadHost;

/// Uploads base64 image data through a list of hosts, in order.
///
/// A host that errors for any reason (network, non-2xx, missing URL field)
/// hands over to the next one. No host is retried.
pub struct UploadRelay {
    hosts: Vec<Box<dyn UploadHost>>,
}

impl UploadRelay {
    /// Create a relay over `hosts`, tried first to last.
    ///
    /// # Errors
    ///
    /// Returns [`BananaError::Config`] when `hosts` is empty.
    pub fn new(hosts: Vec<Box<dyn UploadHost>>) -> Result<Self, BananaError> {
        if hosts.is_empty() {
            return Err(BananaError::Config("at least one upload host is required".into()));
        }
        Ok(Self { hosts })
    }

    /// Names of the configured hosts, in order.
    pub fn host_names(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(|h| h.name())
    }

    /// Upload bare base64 data and return the first public URL obtained.
    ///
    /// # Errors
    ///
    /// Returns [`BananaError::UploadFailure`] naming the exhausted chain once
    /// every host has failed. Individual host errors are only logged.
    pub async fn upload(&self, base64: &str) -> Result<String, BananaError> {
        for host in &self.hosts {
            match host.upload(base64).await {
                Ok(url) => {
                    debug!(host = host.name(), %url, "image uploaded");
                    return Ok(url);
                }
                Err(e) => warn!(host = host.name(), error = %e, "upload failed, trying next host"),
            }
        }
        Err(BananaError::UploadFailure { hosts: self.host_names().map(str::to_string).collect() })
    }
}
