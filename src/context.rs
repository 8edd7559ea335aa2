//! Wiring of live adapters from configuration.

use std::time::Duration;

use crate::adapters::live::freeimage::FreeImageHost;
use crate::adapters::live::imgbb::ImgbbHost;
use crate::adapters::live::nano_banana::NanoBananaProvider;
use crate::adapters::live::relay::RelayHost;
use crate::adapters::live::sleeper::TokioSleeper;
use crate::config::{Config, HostKind};
use crate::error::BananaError;
use crate::ports::UploadHost;
use crate::upload::UploadRelay;
use crate::workflow::Generator;

/// Build a live [`Generator`] for the CLI.
///
/// # Errors
///
/// Returns an error if the generation API key is not configured, or if an
/// upload host in the chain is missing its key.
pub fn live_generator(config: &Config) -> Result<Generator, BananaError> {
    let key = config.provider_key().ok_or_else(|| BananaError::MissingApiKey {
        provider: "Nano Banana".into(),
        env_var: "BANANA_API_KEY".into(),
    })?;
    let provider = NanoBananaProvider::new(
        &config.api_base(),
        key,
        Duration::from_secs(config.provider.timeout_secs),
    )?;
    let relay = upload_chain(config, &config.upload.hosts)?;

    Ok(Generator::new(
        Box::new(provider),
        relay,
        Box::new(TokioSleeper),
        config.poll_policy(),
    ))
}

/// Build the upstream chain used by `banana relay`.
///
/// # Errors
///
/// Returns an error if a host in the chain is missing its key.
pub fn relay_server_chain(config: &Config) -> Result<UploadRelay, BananaError> {
    upload_chain(config, &config.relay.hosts)
}

fn upload_chain(config: &Config, kinds: &[HostKind]) -> Result<UploadRelay, BananaError> {
    let timeout = Duration::from_secs(config.upload.timeout_secs);
    let hosts = kinds
        .iter()
        .map(|kind| upload_host(config, *kind, timeout))
        .collect::<Result<Vec<_>, _>>()?;
    UploadRelay::new(hosts)
}

fn upload_host(
    config: &Config,
    kind: HostKind,
    timeout: Duration,
) -> Result<Box<dyn UploadHost>, BananaError> {
    Ok(match kind {
        HostKind::Relay => Box::new(RelayHost::new(config.relay_url(), timeout)?),
        HostKind::FreeImage => {
            let key = config.freeimage_key().ok_or_else(|| BananaError::MissingApiKey {
                provider: "freeimage.host".into(),
                env_var: "FREEIMAGE_API_KEY".into(),
            })?;
            Box::new(FreeImageHost::new(key, timeout)?)
        }
        HostKind::Imgbb => {
            let key = config.imgbb_key().ok_or_else(|| BananaError::MissingApiKey {
                provider: "imgbb".into(),
                env_var: "IMGBB_API_KEY".into(),
            })?;
            Box::new(ImgbbHost::new(key, timeout)?)
        }
    })
}
