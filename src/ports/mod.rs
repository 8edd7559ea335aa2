//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the generation workflow and an
//! external system. Implementations live in `src/adapters/`.

pub mod generation;
pub mod sleeper;
pub mod upload_host;

pub use generation::{GenerationProvider, ProviderRequest};
pub use sleeper::Sleeper;
pub use upload_host::UploadHost;
