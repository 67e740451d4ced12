mod cli;
mod demo;
mod ui;

use std::path::Path;

use angler::AnglerConfig;
use angler::captcha::{Raster, decode_glyphs};
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => AnglerConfig::load_from(path),
        None => AnglerConfig::load(),
    }
    .context("failed to load configuration")?;

    match cli.command {
        Command::Decode { path, positions } => decode_file(&config, &path, positions),
        Command::Demo { code } => demo::run(config, &code).await,
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "angler=debug" } else { "angler=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn decode_file(config: &AnglerConfig, path: &Path, positions: bool) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raster: Raster = serde_json::from_str(&contents)
        .with_context(|| format!("{} is not a valid raster", path.display()))?;
    let glyphs = decode_glyphs(&raster, config.ink_values);
    ui::print_code(&glyphs, config.code_length, positions);
    Ok(())
}
