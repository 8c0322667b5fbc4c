mod archive;
mod config;
mod error;
mod extract;
mod inject;
mod pipeline;
mod record;
mod render;
mod shorten;
mod store;
mod wrap;

use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use crate::config::AppConfig;
use crate::pipeline::{ImageSource, Packaging, PublishOptions};
use crate::shorten::HttpShortener;
use crate::store::MetadataStore;

#[derive(Parser)]
#[command(
    name = "annotation_hub",
    about = "Attach social-media preview metadata to an annotation page and package it for deployment"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enhance an annotation HTML file and package it for manual deployment
    Publish {
        /// The annotation HTML file
        file: PathBuf,
        /// Use this image for the social preview instead of generating one
        #[arg(long)]
        image: Option<PathBuf>,
        /// Slug for the public URL and artifact name
        #[arg(long)]
        slug: Option<String>,
        /// Description for the preview tags
        #[arg(long)]
        description: Option<String>,
        /// Expiry date (YYYY-MM-DD, informational)
        #[arg(long)]
        expires: Option<NaiveDate>,
        /// Write the enhanced HTML on its own instead of a zip archive
        #[arg(long)]
        flat: bool,
        /// Skip the URL shortening services
        #[arg(long)]
        no_shorten: bool,
        /// Output directory for the artifact
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List previously published annotations
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::new()?;

    env_logger::Builder::new()
        .filter_level(config.log_level.parse().unwrap_or(log::LevelFilter::Info))
        .init();

    info!("Starting annotation_hub");

    let cli = Cli::parse();
    let store = MetadataStore::new(&config.store_path);

    match cli.command {
        Commands::Publish {
            file,
            image,
            slug,
            description,
            expires,
            flat,
            no_shorten,
            output,
        } => {
            let shortener = HttpShortener::new(config.shortener_endpoints.clone())?;
            let options = PublishOptions {
                input: file,
                image: image.map(ImageSource::Custom).unwrap_or(ImageSource::Generated),
                packaging: if flat { Packaging::Flat } else { Packaging::Archive },
                shorten: !no_shorten,
                slug,
                description,
                expiry: expires,
                output_dir: output,
            };

            let outcome = pipeline::publish(&config, &store, &shortener, options).await?;

            println!("Published {}", outcome.record.file_name);
            println!("  Artifact:   {}", outcome.artifact_path.display());
            println!("  Public URL: {}", outcome.record.public_url);
            println!("  Share URL:  {}", outcome.share_url);
        }
        Commands::List => {
            let records = store.load();
            if records.is_empty() {
                println!("No annotations published yet");
            } else {
                let mut records: Vec<_> = records.into_values().collect();
                records.sort_by(|a, b| a.created.cmp(&b.created));
                for r in records {
                    println!(
                        "{}  {}  {:<24}  expires {}  {}",
                        r.id,
                        r.created.format("%Y-%m-%d"),
                        r.slug,
                        r.expiry,
                        r.public_url
                    );
                }
            }
        }
    }

    Ok(())
}
