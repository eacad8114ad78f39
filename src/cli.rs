use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::config::{MediaTypeFilter, StoreConfig};

#[derive(Parser, Debug)]
#[command(name = "posterpack")]
#[command(version)]
#[command(about = "Discover posterpacks and serve files out of them", long_about = None)]
#[command(after_help = "Examples:\n  \
  posterpack scan /media/packs --type movie     list movie posterpacks\n  \
  posterpack list -l \"Heat (1995).zip\"          show archive contents\n  \
  posterpack fetch --root /media/packs \"Heat (1995).zip\" motion.mp4 --range bytes=0-99")]
pub struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, env = "POSTERPACK_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Discover posterpacks and print the normalized items
    Scan {
        /// Root directories (override the configured roots)
        #[arg(value_name = "ROOT")]
        roots: Vec<PathBuf>,

        /// Only emit items of this media type
        #[arg(short = 't', long = "type", value_enum)]
        media_type: Option<MediaTypeFilter>,

        /// Stop after this many items
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Public endpoint used in poster URLs
        #[arg(long, env = "POSTERPACK_ENDPOINT")]
        endpoint: Option<String>,

        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },

    /// List the entries of one archive
    List {
        /// Archive path
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Show sizes, compression ratio and timestamps
        #[arg(short = 'l', long)]
        long: bool,
    },

    /// Serve one entry the way the HTTP endpoint would
    Fetch {
        /// Archive path relative to a root
        #[arg(value_name = "ZIP")]
        zip: String,

        /// Entry name inside the archive
        #[arg(value_name = "ENTRY")]
        entry: String,

        /// Root directories (override the configured roots)
        #[arg(short = 'r', long = "root", value_name = "DIR")]
        roots: Vec<PathBuf>,

        /// Range header value, e.g. bytes=0-99
        #[arg(long)]
        range: Option<String>,

        /// Write the body here instead of stdout
        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Configuration from `--config` (or defaults) with command-line overrides applied.
    pub fn store_config(&self) -> Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => StoreConfig::from_file(path)
                .with_context(|| format!("Loading {}", path.display()))?,
            None => StoreConfig::default(),
        };

        match &self.command {
            Command::Scan {
                roots,
                media_type,
                limit,
                endpoint,
                ..
            } => {
                if !roots.is_empty() {
                    config.roots = roots.clone();
                }
                if let Some(filter) = media_type {
                    config.media_type_filter = *filter;
                }
                if limit.is_some() {
                    config.limit = *limit;
                }
                if let Some(endpoint) = endpoint {
                    config.endpoint = endpoint.clone();
                }
                config.validate()?;
            }
            Command::Fetch { roots, .. } => {
                if !roots.is_empty() {
                    config.roots = roots.clone();
                }
                config.validate()?;
            }
            Command::List { .. } => {}
        }

        Ok(config)
    }
}
