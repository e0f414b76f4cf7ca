use std::path::{Path, PathBuf};

use chrono::Local;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::info;

use super::{markdown_path, timestamp_from_csv};
use crate::error::Result;
use crate::model::{CategorySet, RepoRef};

/// Characters left alone by form-style (`quote_plus`) encoding.
const BADGE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~');

/// Write the index next to the CSV's run timestamp and return its path.
pub fn generate(out_dir: &Path, set: &CategorySet, csv_path: &Path) -> Result<PathBuf> {
    let path = markdown_path(out_dir, &timestamp_from_csv(csv_path));
    println!(
        "Generating markdown file with {} categories...",
        set.categories.len()
    );
    let generated_on = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    std::fs::write(&path, render(set, &generated_on))?;
    println!("Generated markdown index at {}", path.display());
    Ok(path)
}

pub fn render(set: &CategorySet, generated_on: &str) -> String {
    let mut out = String::new();
    out.push_str("# GitHub Repositories Index\n\n");
    out.push_str(&format!("Generated on: {}\n\n", generated_on));

    for category in &set.categories {
        out.push_str(&format!("## {}\n\n", category.name));
        info!(
            "Adding {} repositories to category '{}'",
            category.repositories.len(),
            category.name
        );
        for repo in &category.repositories {
            out.push_str(&format!("{}\n\n", badge(repo)));
        }
    }
    out
}

/// `[![name](https://img.shields.io/badge/<encoded>-repository-blue)](url)`
pub fn badge(repo: &RepoRef) -> String {
    format!(
        "[![{}](https://img.shields.io/badge/{}-repository-blue)]({})",
        repo.name,
        quote_plus(&repo.name),
        repo.url
    )
}

/// Form-style percent encoding: spaces become `+`.
pub fn quote_plus(s: &str) -> String {
    s.split(' ')
        .map(|part| utf8_percent_encode(part, BADGE_ENCODE_SET).to_string())
        .collect::<Vec<_>>()
        .join("+")
}
