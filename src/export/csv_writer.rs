use std::path::{Path, PathBuf};

use tracing::info;

use super::{csv_path, run_timestamp};
use crate::error::Result;
use crate::model::{CsvRow, RepositoryRecord};

/// Write `repos` to `preprocessed/github_repos_<DDMMYY_HHMM>.csv` and return the path.
pub fn save_repos(out_dir: &Path, repos: &[RepositoryRecord]) -> Result<PathBuf> {
    let path = csv_path(out_dir, &run_timestamp());
    write_rows(&path, repos)?;
    println!("Saved {} repositories to {}", repos.len(), path.display());
    Ok(path)
}

pub fn write_rows(path: &Path, repos: &[RepositoryRecord]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)?;
    if repos.is_empty() {
        // serialize() emits the header lazily, so write it by hand for an empty list
        writer.write_record(["name", "url", "created_at", "description"])?;
    }
    for repo in repos {
        writer.serialize(CsvRow::from(repo))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn read_rows(path: &Path) -> Result<Vec<CsvRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader
        .deserialize()
        .collect::<std::result::Result<Vec<CsvRow>, _>>()?;
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
