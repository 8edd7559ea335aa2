//! Banana - Nano Banana image generation CLI.

mod adapters;
mod cancel;
mod cli;
mod codec;
mod config;
mod context;
mod error;
mod normalizer;
mod output;
mod params;
mod poller;
mod ports;
mod relay_server;
mod request;
mod state;
#[cfg(test)]
mod testing;
mod upload;
mod workflow;

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cancel::CancelToken;
use crate::cli::{Cli, Command, FuseArgs, GenerateArgs, RefineArgs, SaveArgs, ShapeArgs};
use crate::config::Config;
use crate::error::BananaError;
use crate::output::{download_image, format_for_path, resolve_output_path, save_image};
use crate::params::{AspectRatio, Resolution};
use crate::request::{GenerationRequest, ImagePayload};
use crate::state::{state_path, FormState};
use crate::workflow::GenerationResult;

/// Exit status after Ctrl-C, as shells report SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(BananaError::Cancelled) => {
            eprintln!("Cancelled");
            ExitCode::from(EXIT_INTERRUPTED)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,banana=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode, BananaError> {
    let config_path = config::discover_config_path(cli.config.as_deref());
    let config = Config::load(&config_path).map_err(BananaError::Config)?;
    debug!(path = %config_path.display(), "config loaded");

    let state_path = state_path();
    let mut state = FormState::load(&state_path);

    match cli.command {
        Command::Generate(args) => generate(args, &config, &mut state, &state_path).await,
        Command::Refine(args) => refine(args, &config, &mut state, &state_path).await,
        Command::Fuse(args) => fuse(args, &config, &mut state, &state_path).await,
        Command::Download(args) => {
            let url = state.last_image_url().ok_or_else(nothing_generated)?;
            save_from_url(url, args.output.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Relay(args) => {
            let bind = args.bind.unwrap_or_else(|| config.relay.bind.clone());
            relay_server::run(&bind, context::relay_server_chain(&config)?).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn generate(
    args: GenerateArgs,
    config: &Config,
    state: &mut FormState,
    state_path: &Path,
) -> Result<ExitCode, BananaError> {
    let prompt = args.resolve_prompt()?.unwrap_or_else(|| state.prompt.clone());
    let negative = args.negative.clone().unwrap_or_else(|| state.negative_prompt.clone());
    let (aspect_ratio, resolution) = resolve_shape(&args.shape, state)?;
    let images = load_images(&args.images, config)?;
    let request =
        GenerationRequest::new(&prompt, Some(&negative), aspect_ratio, resolution, images)?;

    state.prompt = request.prompt().to_string();
    state.negative_prompt = negative;
    state.aspect_ratio = aspect_ratio;
    state.resolution = resolution;
    state.save(state_path)?;

    let generator = context::live_generator(config)?;
    let outcome = cancellable(|cancel| async move { generator.generate(&request, &cancel).await })
        .await;
    finish(outcome, &args.save, state, state_path).await
}

async fn refine(
    args: RefineArgs,
    config: &Config,
    state: &mut FormState,
    state_path: &Path,
) -> Result<ExitCode, BananaError> {
    let source = state.last_image_url().ok_or_else(nothing_generated)?.to_string();
    if args.text.trim().is_empty() {
        return Err(BananaError::Validation("Please describe the change".into()));
    }
    let (aspect_ratio, resolution) = (state.aspect_ratio, state.resolution);

    let generator = context::live_generator(config)?;
    let text = args.text;
    let outcome = cancellable(|cancel| async move {
        generator
            .image_to_image(
                vec![ImagePayload::Url(source)],
                &text,
                aspect_ratio,
                resolution,
                &cancel,
            )
            .await
    })
    .await;
    finish(outcome, &args.save, state, state_path).await
}

async fn fuse(
    args: FuseArgs,
    config: &Config,
    state: &mut FormState,
    state_path: &Path,
) -> Result<ExitCode, BananaError> {
    let (aspect_ratio, resolution) = resolve_shape(&args.shape, state)?;
    let images = load_images(&args.images, config)?;
    let prompt = args.prompt.unwrap_or_default();

    state.aspect_ratio = aspect_ratio;
    state.resolution = resolution;
    state.save(state_path)?;

    let generator = context::live_generator(config)?;
    let mode = args.mode;
    let outcome = cancellable(|cancel| async move {
        generator.multi_fusion(images, &prompt, &mode, aspect_ratio, resolution, &cancel).await
    })
    .await;
    finish(outcome, &args.save, state, state_path).await
}

/// Explicit options win; anything unset comes from the saved state.
fn resolve_shape(
    shape: &ShapeArgs,
    state: &FormState,
) -> Result<(AspectRatio, Resolution), BananaError> {
    let aspect_ratio = match &shape.aspect_ratio {
        Some(ratio) => ratio.parse()?,
        None => state.aspect_ratio,
    };
    let resolution = match &shape.resolution {
        Some(res) => res.parse()?,
        None => state.resolution,
    };
    Ok((aspect_ratio, resolution))
}

fn load_images(args: &[String], config: &Config) -> Result<Vec<ImagePayload>, BananaError> {
    let limits = config.compress_limits();
    args.iter().map(|arg| ImagePayload::from_arg(arg, &limits)).collect()
}

/// Run `work` with a token that Ctrl-C cancels.
async fn cancellable<F, Fut>(work: F) -> Option<GenerationResult>
where
    F: FnOnce(CancelToken) -> Fut,
    Fut: std::future::Future<Output = Option<GenerationResult>>,
{
    let cancel = CancelToken::new();
    let watcher = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        }
    });
    let outcome = work(cancel).await;
    watcher.abort();
    outcome
}

/// Persist the outcome, print the URL and optionally download it.
async fn finish(
    outcome: Option<GenerationResult>,
    save: &SaveArgs,
    state: &mut FormState,
    state_path: &Path,
) -> Result<ExitCode, BananaError> {
    let result = outcome.ok_or(BananaError::Cancelled)?;
    state.result = Some(result.clone());
    state.save(state_path)?;

    let Some(url) = result.image_url.filter(|_| result.success) else {
        eprintln!("Error: {}", result.error.as_deref().unwrap_or("generation failed"));
        return Ok(ExitCode::FAILURE);
    };

    println!("{url}");
    if !save.no_download {
        save_from_url(&url, save.output.as_deref()).await?;
    }
    Ok(ExitCode::SUCCESS)
}

async fn save_from_url(url: &str, output: Option<&str>) -> Result<(), BananaError> {
    let output_path = resolve_output_path(output);
    format_for_path(&output_path)?;
    let data = download_image(url).await?;
    save_image(&data, &output_path)?;
    eprintln!("Saved: {}", output_path.display());
    Ok(())
}

fn nothing_generated() -> BananaError {
    BananaError::Validation("No generated image yet. Run `banana generate` first".into())
}
