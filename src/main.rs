mod categorize;
mod config;
mod error;
mod export;
mod github;
mod model;
mod pipeline;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::config::Settings;

#[derive(Parser)]
#[command(
    name = "repo_indexer",
    about = "Index a GitHub user's public repositories into a categorized markdown page"
)]
struct Cli {
    /// Directory that receives preprocessed/ and processed/
    #[arg(long, global = true, default_value = ".")]
    out_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, categorize and render the index (default)
    Run {
        /// Pause between listing pages, in milliseconds
        #[arg(long, default_value_t = github::DEFAULT_PAGE_DELAY.as_millis() as u64)]
        page_delay_ms: u64,
        /// Model identifier (overrides GEMINI_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
    /// Fetch repositories and write the CSV only
    Fetch {
        /// Pause between listing pages, in milliseconds
        #[arg(long, default_value_t = github::DEFAULT_PAGE_DELAY.as_millis() as u64)]
        page_delay_ms: u64,
    },
    /// Categorize an existing CSV and write the markdown index
    Categorize {
        /// CSV written by a previous `fetch`
        #[arg(long)]
        csv: PathBuf,
        /// Model identifier (overrides GEMINI_MODEL)
        #[arg(long)]
        model: Option<String>,
    },
    /// Run the JSON repair heuristics on a file and print the result
    Repair {
        /// File holding almost-JSON model output
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run {
        page_delay_ms: github::DEFAULT_PAGE_DELAY.as_millis() as u64,
        model: None,
    });

    match command {
        Commands::Run { page_delay_ms, model } => {
            let (github, gemini) = Settings::load()?.for_run(model.as_deref())?;
            let out =
                pipeline::run(github, gemini, &cli.out_dir, Duration::from_millis(page_delay_ms))
                    .await?;
            println!("Done!");
            println!("CSV file: {}", out.csv.display());
            println!("Markdown index: {}", out.markdown.display());
            println!("\nYou can view the generated markdown file with:");
            println!("  cat {}", out.markdown.display());
        }
        Commands::Fetch { page_delay_ms } => {
            let settings = Settings::load()?;
            let csv = pipeline::fetch_to_csv(
                settings.github()?,
                &cli.out_dir,
                Duration::from_millis(page_delay_ms),
            )
            .await?;
            println!("CSV file: {}", csv.display());
        }
        Commands::Categorize { csv, model } => {
            let settings = Settings::load()?;
            let md =
                pipeline::categorize_to_markdown(settings.gemini(model.as_deref())?, &cli.out_dir, &csv)
                    .await?;
            println!("Markdown index: {}", md.display());
        }
        Commands::Repair { path } => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let span = categorize::extract_json_span(&raw);
            match categorize::repair::repair_json(span) {
                Some(fixed) => println!("{}", fixed),
                None => bail!("{} could not be repaired", path.display()),
            }
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_run() {
        let cli = Cli::try_parse_from(["repo_indexer"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.out_dir, PathBuf::from("."));
    }

    #[test]
    fn parses_categorize_args() {
        let cli = Cli::try_parse_from([
            "repo_indexer",
            "categorize",
            "--csv",
            "preprocessed/github_repos_010126_0900.csv",
            "--model",
            "models/gemini-pro",
            "--out-dir",
            "/tmp/idx",
        ])
        .unwrap();
        assert_eq!(cli.out_dir, PathBuf::from("/tmp/idx"));
        match cli.command {
            Some(Commands::Categorize { csv, model }) => {
                assert!(csv.ends_with("github_repos_010126_0900.csv"));
                assert_eq!(model.as_deref(), Some("models/gemini-pro"));
            }
            _ => panic!("expected categorize"),
        }
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }
}
