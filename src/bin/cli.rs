use clap::Parser;
use serde::{Deserialize, Serialize};
use shortreel::promo::PromoWriter;
use shortreel::{Pipeline, VideoReference};
use std::fs;
use tracing::{error, info, warn};

#[derive(Deserialize, Serialize)]
struct Config {
    api_key: String,
}

#[derive(Parser, Clone)]
#[command(name = "shortreel", about = "Turns a YouTube video into a playable MP4 short")]
pub struct Cli {
    /// A video URL or a bare 11-character video id.
    pub url: String,

    #[arg(long = "output-dir", short, default_value = "./output")]
    pub output_dir: String,

    #[arg(long = "ffmpeg-path", default_value = "ffmpeg")]
    pub ffmpeg_path: String,

    /// OpenAI API key used for promo copy. Falls back to the
    /// OPENAI_API_KEY variable, then to the config file.
    #[arg(long = "api-key")]
    pub api_key: Option<String>,

    /// Skip promo copy generation entirely.
    #[arg(long = "no-copy", action = clap::ArgAction::SetTrue)]
    pub no_copy: bool,

    #[arg(
        long = "verbosity",
        short,
        default_value = "info",
        value_parser = clap::builder::PossibleValuesParser::new([
            "info", "debug", "warn", "error", "trace"
        ])
    )]
    pub verbosity: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!("shortreel={}", args.verbosity))
            }),
        )
        .init();

    // The key is resolved before any download starts so a missing key
    // fails fast instead of after minutes of transfer.
    let api_key = if args.no_copy {
        None
    } else {
        Some(resolve_api_key(args.api_key.clone())?)
    };

    let reference = VideoReference::from_url(&args.url)?;
    let pipeline = Pipeline::new(&args.ffmpeg_path, &args.output_dir)?;

    let media = pipeline.run(&reference).await?;

    println!("Saved {:?}", media.path);
    println!(
        "  {}x{}, {} seconds",
        media.width, media.height, media.duration_seconds
    );
    println!("  thumbnail: {}", reference.thumbnail_url());

    if let Some(api_key) = api_key {
        let writer = PromoWriter::new(api_key)?;
        match writer.generate(&args.url).await {
            Ok(copy) => {
                println!();
                println!("{copy}");
            }
            // The file is already on disk; a copy failure is not fatal.
            Err(e) => warn!("Could not generate promo copy: {e}"),
        }
    }

    Ok(())
}

fn resolve_api_key(
    flag: Option<String>,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(key) = flag {
        return Ok(key);
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }

    let config_dir = dirs::config_dir().ok_or("Could not find a valid config directory.")?;
    let config_path = config_dir.join("shortreel").join("config.toml");

    if config_path.exists() && config_path.is_file() {
        let content = fs::read_to_string(&config_path)?;
        match toml::from_str::<Config>(&content) {
            Ok(config) => {
                info!("Using API key from {:?}", config_path);
                return Ok(config.api_key);
            }
            Err(e) => error!("Malformed config file at {:?}: {}", config_path, e),
        }
    }

    Err(format!(
        "No API key found. Pass --api-key, set OPENAI_API_KEY, or create {:?}. \
         Use --no-copy to skip promo copy generation.",
        config_path
    )
    .into())
}
