//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand};

use crate::workflow::DEFAULT_FUSION_MODE;

/// Nano Banana image generation: text-to-image, refine, fuse, and an upload relay.
#[derive(Parser, Debug)]
#[command(name = "banana", version, about)]
pub struct Cli {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Verbose logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an image from a prompt, optionally guided by reference images.
    Generate(GenerateArgs),
    /// Refine the last generated image with a new instruction.
    Refine(RefineArgs),
    /// Fuse several reference images into one.
    Fuse(FuseArgs),
    /// Download the last generated image.
    Download(DownloadArgs),
    /// Run the upload relay server.
    Relay(RelayArgs),
}

/// Where and whether to save the result.
#[derive(Args, Debug, Default)]
pub struct SaveArgs {
    /// Output file path (auto-generated PNG name if not specified).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Only print the image URL.
    #[arg(long)]
    pub no_download: bool,
}

/// Aspect ratio and resolution; unset values fall back to the saved state.
#[derive(Args, Debug, Default)]
pub struct ShapeArgs {
    /// Aspect ratio: 1:1, 2:3, 3:2, 3:4, 4:3, 4:5, 5:4, 9:16, 16:9, 21:9.
    #[arg(short, long)]
    pub aspect_ratio: Option<String>,

    /// Resolution: 1K, 2K, 4K.
    #[arg(short, long)]
    pub resolution: Option<String>,
}

/// `banana generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Text prompt describing the desired image.
    #[arg(conflicts_with = "prompt_file")]
    pub prompt: Option<String>,

    /// Path to a file containing the prompt text.
    #[arg(short = 'p', long)]
    pub prompt_file: Option<String>,

    /// What the image should avoid.
    #[arg(short = 'n', long)]
    pub negative: Option<String>,

    /// Reference image: file path, URL or data URI. Repeatable.
    #[arg(short = 'i', long = "image")]
    pub images: Vec<String>,

    #[command(flatten)]
    pub shape: ShapeArgs,

    #[command(flatten)]
    pub save: SaveArgs,
}

impl GenerateArgs {
    /// Resolve the prompt from the positional argument or the file flag.
    ///
    /// Returns `Ok(None)` when neither was given.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt file cannot be read.
    pub fn resolve_prompt(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(ref text) = self.prompt {
            Ok(Some(text.clone()))
        } else if let Some(ref path) = self.prompt_file {
            std::fs::read_to_string(path).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// `banana refine`.
#[derive(Args, Debug)]
pub struct RefineArgs {
    /// How to change the last image.
    pub text: String,

    #[command(flatten)]
    pub save: SaveArgs,
}

/// `banana fuse`.
#[derive(Args, Debug)]
pub struct FuseArgs {
    /// Reference image: file path, URL or data URI. Repeatable.
    #[arg(short = 'i', long = "image", required = true)]
    pub images: Vec<String>,

    /// Fusion mode, e.g. blend or style.
    #[arg(short, long, default_value = DEFAULT_FUSION_MODE)]
    pub mode: String,

    /// Extra guidance for the fusion.
    pub prompt: Option<String>,

    #[command(flatten)]
    pub shape: ShapeArgs,

    #[command(flatten)]
    pub save: SaveArgs,
}

/// `banana download`.
#[derive(Args, Debug)]
pub struct DownloadArgs {
    /// Output file path (auto-generated PNG name if not specified).
    #[arg(short, long)]
    pub output: Option<String>,
}

/// `banana relay`.
#[derive(Args, Debug)]
pub struct RelayArgs {
    /// Listen address, overriding the config file.
    #[arg(long)]
    pub bind: Option<String>,
}
