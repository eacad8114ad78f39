//! Main entry point for the posterpack CLI application.
//!
//! Scans posterpack roots, lists archive contents and serves single
//! entries with the same status and header logic as the HTTP endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use posterpack::cli::Command;
use posterpack::{ArchiveIndex, Cli, EntryStreamer, NormalizedMediaItem, Scanner, StoreConfig};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(cli.verbose))
        .init();

    let config = cli.store_config()?;

    match &cli.command {
        Command::Scan { json, .. } => scan(config, *json).await,
        Command::List { archive, long } => list_entries(archive, *long).await,
        Command::Fetch {
            zip,
            entry,
            range,
            output,
            ..
        } => fetch(&config, zip, entry, range.as_deref(), output.as_deref()).await,
    }
}

/// `RUST_LOG` when set, otherwise warnings (or debug output with `-v`).
fn log_filter(verbose: bool) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_for(directives.as_deref(), verbose)
}

fn filter_for(directives: Option<&str>, verbose: bool) -> EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| {
            EnvFilter::new(if verbose {
                "posterpack=debug"
            } else {
                "posterpack=warn"
            })
        })
}

/// Scan the configured roots and print every item, then any skipped archives.
async fn scan(config: StoreConfig, json: bool) -> Result<()> {
    let scanner = Scanner::new(config);
    let report = scanner.scan_all().await;

    for item in &report.items {
        if json {
            println!("{}", serde_json::to_string(item)?);
        } else {
            print_item(item);
        }
    }

    for warning in &report.warnings {
        eprintln!("skipped: {} ({})", warning.path.display(), warning.reason);
    }

    if !json {
        eprintln!(
            "\n{} posterpacks, {} skipped",
            report.items.len(),
            report.warnings.len()
        );
    }

    Ok(())
}

fn print_item(item: &NormalizedMediaItem) {
    let year = item
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "----".to_string());
    let usage = [
        (item.usage.cinema, "cinema"),
        (item.usage.wallart, "wallart"),
        (item.usage.screensaver, "screensaver"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect::<Vec<_>>()
    .join(",");

    println!(
        "{:<6}  {:<8}  {}  {:<40}  {:<26}  {}",
        item.media_type.to_string(),
        format!("{:?}", item.pack_type).to_lowercase(),
        year,
        item.title,
        usage,
        item.archive_path
    );
}

/// List entries in an archive.
///
/// The long format prints a table with size, compression ratio and timestamps.
async fn list_entries(archive: &Path, long: bool) -> Result<()> {
    let index = ArchiveIndex::open(archive)
        .await
        .with_context(|| format!("Opening {}", archive.display()))?;

    if long {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in index.entries() {
        if !long {
            println!("{}", entry.name);
            continue;
        }

        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();

        // Percentage saved by compression
        let ratio = if entry.uncompressed_size > 0 {
            format!(
                "{:>4}%",
                100i64 - (entry.compressed_size * 100 / entry.uncompressed_size) as i64
            )
        } else {
            "  0%".to_string()
        };

        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            ratio,
            year,
            month,
            day,
            hour,
            minute,
            entry.name
        );

        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if long {
        println!("{}", "-".repeat(70));
        let total_ratio = if total_uncompressed > 0 {
            format!(
                "{:>4}%",
                100i64 - (total_compressed * 100 / total_uncompressed) as i64
            )
        } else {
            "  0%".to_string()
        };
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files ({})",
            total_uncompressed,
            total_compressed,
            total_ratio,
            "",
            file_count,
            format_size(total_uncompressed)
        );
    }

    Ok(())
}

/// Run one entry request and report it like an HTTP exchange.
///
/// The status line and headers go to stderr; the body goes to `output` or stdout.
async fn fetch(
    config: &StoreConfig,
    zip: &str,
    entry: &str,
    range: Option<&str>,
    output: Option<&Path>,
) -> Result<()> {
    let streamer = EntryStreamer::from_config(config);
    let response = streamer.respond(zip, entry, range).await;

    eprintln!("HTTP {}", response.status);
    for (name, value) in &response.headers {
        eprintln!("{name}: {value}");
    }

    let written = match output {
        Some(path) => {
            let mut file = tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Creating {}", path.display()))?;
            let written = response.body.copy_to(&mut file).await?;
            file.flush().await?;
            written
        }
        None => {
            let mut stdout = tokio::io::stdout();
            response.body.copy_to(&mut stdout).await?
        }
    };

    eprintln!("\n{} transferred", format_size(written));

    if response.status >= 400 {
        anyhow::bail!("request failed with status {}", response.status);
    }
    Ok(())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_directives_win_over_defaults() {
        let filter = filter_for(Some("posterpack=trace"), false).to_string();
        assert!(filter.contains("posterpack=trace"), "{filter}");
        assert!(!filter.contains("posterpack=warn"), "{filter}");
    }

    #[test]
    fn defaults_follow_verbosity() {
        assert!(filter_for(None, false).to_string().contains("posterpack=warn"));
        assert!(filter_for(Some(" "), true).to_string().contains("posterpack=debug"));
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }
}
