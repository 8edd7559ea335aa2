//! Upload host port: one image-hosting service in the fallback chain.

use std::future::Future;
use std::pin::Pin;

use crate::error::BananaError;

/// Boxed future returned by [`UploadHost::upload`]: the public image URL.
pub type UploadFuture<'a> = Pin<Box<dyn Future<Output = Result<String, BananaError>> + Send + 'a>>;

/// An image host that turns base64 image data into a public URL.
///
/// Each adapter normalizes its own response shape; a missing URL field is an
/// error, never an empty string.
pub trait UploadHost: Send + Sync {
    /// Short name used in logs and in the exhaustion error.
    fn name(&self) -> &str;

    /// Upload bare base64 image data (no data-URI prefix).
    fn upload(&self, base64: &str) -> UploadFuture<'_>;
}
