use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::categorize::gemini::{GeminiClient, TextGenerator};
use crate::categorize::{self, Categorization};
use crate::config::{GeminiSettings, GitHubSettings};
use crate::export::{self, csv_writer, markdown};
use crate::github::RepoFetcher;

pub struct RunOutputs {
    pub csv: PathBuf,
    pub markdown: PathBuf,
}

/// Fetch every repository and write the CSV. Returns the CSV path.
pub async fn fetch_to_csv(
    github: GitHubSettings,
    out_dir: &Path,
    page_delay: Duration,
) -> Result<PathBuf> {
    export::ensure_dirs(out_dir).context("Failed to create output directories")?;

    let fetcher = RepoFetcher::new(github, page_delay)?;
    println!("Fetching GitHub repositories...");
    let repos = fetcher
        .fetch_all()
        .await
        .context("Failed to fetch repositories")?;
    println!("Found {} repositories for {}", repos.len(), fetcher.username());

    let csv = csv_writer::save_repos(out_dir, &repos).context("Failed to write CSV")?;
    Ok(csv)
}

/// Categorize an existing CSV and write the markdown index. Returns the markdown path.
pub async fn categorize_to_markdown(
    gemini: GeminiSettings,
    out_dir: &Path,
    csv: &Path,
) -> Result<PathBuf> {
    export::ensure_dirs(out_dir).context("Failed to create output directories")?;

    let client = GeminiClient::new(gemini)?;
    println!("Using model: {}", client.model());
    println!("Categorizing repositories with language model...");
    let categorization = with_spinner(&client, csv).await?;
    info!(provenance = ?categorization.provenance, "categorization finished");

    let md = markdown::generate(out_dir, &categorization.set, csv)
        .context("Failed to write markdown index")?;
    Ok(md)
}

/// Full pipeline: fetch → CSV → categorize → markdown.
pub async fn run(
    github: GitHubSettings,
    gemini: GeminiSettings,
    out_dir: &Path,
    page_delay: Duration,
) -> Result<RunOutputs> {
    println!("Starting GitHub repository indexing process...");
    let csv = fetch_to_csv(github, out_dir, page_delay).await?;
    let markdown = categorize_to_markdown(gemini, out_dir, &csv).await?;
    Ok(RunOutputs { csv, markdown })
}

async fn with_spinner<G: TextGenerator>(generator: &G, csv: &Path) -> Result<Categorization> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("waiting for model response");
    pb.enable_steady_tick(Duration::from_millis(120));

    let result = categorize::categorize_csv(generator, csv)
        .await
        .context("Failed to read CSV for categorization");
    pb.finish_and_clear();
    result
}
