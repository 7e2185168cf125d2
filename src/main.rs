use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fiisplorer::{
    config,
    controller::{PageController, PageSnapshot, ViewStatus},
    logging,
    search::{DateRange, SearchFilters},
    upload,
};
use time::{Date, macros::format_description};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(
    name = "fiisplorer",
    version,
    about = "Search academic documents and upload new ones"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a search and print the rendered results.
    Search {
        query: String,
        #[arg(long, default_value = "")]
        file_type: String,
        #[arg(long, value_parser = parse_date)]
        from: Option<Date>,
        #[arg(long, value_parser = parse_date)]
        to: Option<Date>,
    },
    /// Upload files (directories are walked) and print the updated results.
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Search first so uploads are prepended to these results.
        #[arg(long)]
        query: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::init_config().context("invalid configuration")?;
    logging::init_tracing();
    let controller =
        PageController::from_config(config).context("failed to build search client")?;

    let snapshot = match cli.command {
        Command::Search {
            query,
            file_type,
            from,
            to,
        } => {
            let filters = SearchFilters {
                file_type,
                date_range: DateRange { from, to },
            };
            controller.search(&query, &filters).await
        }
        Command::Upload { paths, query } => {
            if let Some(query) = query {
                let snapshot = controller.search(&query, &SearchFilters::default()).await;
                if let Some(banner) = snapshot.status.banner() {
                    tracing::warn!(banner, "Search before upload did not produce results");
                }
            }
            upload_files(&controller, &paths).await?
        }
    };

    tracing::debug!(metrics = ?controller.metrics_snapshot(), "Session counters");
    print_snapshot(&snapshot)?;
    if matches!(
        snapshot.status,
        ViewStatus::Failed { .. } | ViewStatus::InputRequired
    ) {
        std::process::exit(1);
    }
    Ok(())
}

async fn upload_files(controller: &PageController, paths: &[PathBuf]) -> Result<PageSnapshot> {
    let report = controller.admit_paths(&expand_paths(paths)).await;
    if report.admitted.is_empty() {
        tracing::info!("No files admitted for upload");
        return Ok(controller.snapshot());
    }

    let reporter = tokio::spawn(upload::follow_batch(controller.uploads().subscribe()));
    let snapshot = controller.upload().await.context("upload failed")?;
    let _ = reporter.await;
    Ok(snapshot)
}

fn expand_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(root = %path.display(), error = %err, "Skipping unreadable entry");
                }
            }
        }
    }
    files
}

fn print_snapshot(snapshot: &PageSnapshot) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(snapshot).context("failed to serialize results")?;
    println!("{rendered}");
    Ok(())
}

fn parse_date(value: &str) -> Result<Date, String> {
    Date::parse(value, format_description!("[year]-[month]-[day]"))
        .map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}
