pub mod gemini;
pub mod prompt;
pub mod repair;

use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::export::csv_writer;
use crate::model::CategorySet;
use gemini::TextGenerator;

const SAMPLE_CHARS: usize = 500;

/// Which recovery level produced a `CategorySet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    Parsed,
    Repaired,
    Fallback,
}

#[derive(Debug)]
pub struct Categorization {
    pub set: CategorySet,
    pub provenance: Provenance,
}

impl Categorization {
    fn fallback() -> Self {
        println!("WARNING: Could not properly categorize repositories. Using fallback uncategorized structure.");
        Categorization {
            set: CategorySet::fallback(),
            provenance: Provenance::Fallback,
        }
    }
}

/// Read the CSV back, ask the model to group the rows and parse its answer.
///
/// Only reading the CSV can fail. Model and parse failures degrade to
/// `CategorySet::fallback()`.
pub async fn categorize_csv<G: TextGenerator>(generator: &G, csv_path: &Path) -> Result<Categorization> {
    let rows = csv_writer::read_rows(csv_path)?;
    let prompt = prompt::build(&rows)?;

    println!(
        "Sending prompt to language model to categorize {} repositories...",
        rows.len()
    );
    let response = match generator.generate(&prompt).await {
        Ok(text) => text,
        Err(e) => {
            warn!("Error calling language model: {}", e);
            return Ok(Categorization::fallback());
        }
    };
    info!("Raw response from model (first {} chars):\n{}", SAMPLE_CHARS, sample(&response));

    Ok(parse_response(&response))
}

/// Parse model output: strict first, then repaired, then the fallback.
pub fn parse_response(response: &str) -> Categorization {
    let json = extract_json_span(response);

    let strict_err = match serde_json::from_str::<CategorySet>(json) {
        Ok(set) => return accept(set, Provenance::Parsed),
        Err(e) => e,
    };
    warn!("Error parsing JSON: {}", strict_err);
    warn!("JSON string (first {} chars): {}", SAMPLE_CHARS, sample(json));

    if let Some(repaired) = repair::repair_json(json) {
        match serde_json::from_str::<CategorySet>(&repaired) {
            Ok(set) => return accept(set, Provenance::Repaired),
            Err(e) => warn!("Repaired JSON is not a category set: {}", e),
        }
        // valid JSON of the wrong shape can still hold usable blocks
        if let Some(salvaged) = repair::salvage_categories(json) {
            if let Ok(set) = serde_json::from_str::<CategorySet>(&salvaged) {
                return accept(set, Provenance::Repaired);
            }
        }
    }
    Categorization::fallback()
}

fn accept(set: CategorySet, provenance: Provenance) -> Categorization {
    if set.categories.is_empty() {
        warn!("Model returned no categories");
        return Categorization::fallback();
    }
    println!(
        "Successfully categorized repositories into {} categories",
        set.categories.len()
    );
    Categorization { set, provenance }
}

/// Substring from the first `{` through the last `}`; empty if there is none.
pub fn extract_json_span(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end >= start => {
            info!("Extracted JSON from position {} to {}", start, end + 1);
            &text[start..=end]
        }
        _ => "",
    }
}

fn sample(text: &str) -> String {
    if text.chars().count() <= SAMPLE_CHARS {
        text.to_string()
    } else {
        let head: String = text.chars().take(SAMPLE_CHARS).collect();
        format!("{}...", head)
    }
}
