pub mod csv_writer;
pub mod markdown;

use std::path::{Path, PathBuf};

use chrono::Local;

pub const PREPROCESSED_DIR: &str = "preprocessed";
pub const PROCESSED_DIR: &str = "processed";
const CSV_PREFIX: &str = "github_repos_";

/// Run timestamp in `DDMMYY_HHMM`, shared by the CSV and markdown file names.
pub fn run_timestamp() -> String {
    Local::now().format("%d%m%y_%H%M").to_string()
}

/// Create `preprocessed/` and `processed/` under `out_dir`.
pub fn ensure_dirs(out_dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(out_dir.join(PREPROCESSED_DIR))?;
    std::fs::create_dir_all(out_dir.join(PROCESSED_DIR))?;
    Ok(())
}

pub fn csv_path(out_dir: &Path, timestamp: &str) -> PathBuf {
    out_dir
        .join(PREPROCESSED_DIR)
        .join(format!("{}{}.csv", CSV_PREFIX, timestamp))
}

pub fn markdown_path(out_dir: &Path, timestamp: &str) -> PathBuf {
    out_dir
        .join(PROCESSED_DIR)
        .join(format!("github_repos_index_{}.md", timestamp))
}

/// Recover the run timestamp from a CSV file name.
/// Falls back to the whole file stem for names not written by this tool.
pub fn timestamp_from_csv(csv_path: &Path) -> String {
    let stem = csv_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.strip_prefix(CSV_PREFIX) {
        Some(ts) if !ts.is_empty() => ts.to_string(),
        _ => stem,
    }
}
