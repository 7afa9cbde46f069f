//! Download the transaction archive and extract it into the data directory.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lvrmap::dataset::{download_client, refresh_dataset};
use lvrmap::Config;

#[derive(Parser, Debug)]
#[command(name = "refresh")]
#[command(about = "Download and extract the real-estate transaction archive")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory, overrides the configuration
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Archive URL, overrides the configuration
    #[arg(long)]
    url: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data.dir = dir;
    }
    if let Some(url) = args.url {
        config.data.archive_url = url;
    }

    let client = download_client(Duration::from_secs(config.data.download_timeout_secs))?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let summary = refresh_dataset(
        &client,
        &config.data.archive_url,
        &config.data.dir,
        |downloaded, total| {
            if let Some(total) = total {
                pb.set_length(total);
            }
            pb.set_position(downloaded);
        },
    )
    .await
    .with_context(|| format!("Failed to refresh data from {}", config.data.archive_url))?;
    pb.finish_with_message("Download complete");

    info!(
        "Saved {} ({} bytes), extracted {} files into {}",
        summary.archive.display(),
        summary.bytes,
        summary.entries,
        config.data.dir.display()
    );

    Ok(())
}
