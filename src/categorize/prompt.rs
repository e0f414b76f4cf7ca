use crate::error::Result;
use crate::model::CsvRow;

const RESPONSE_SHAPE: &str = r#"{
  "categories": [
    {
      "name": "Category Name",
      "repositories": [
        { "name": "repo-name", "url": "repo-url" }
      ]
    }
  ]
}"#;

/// Build the categorization prompt with the full row set embedded as JSON.
pub fn build(rows: &[CsvRow]) -> Result<String> {
    let data = serde_json::to_string_pretty(rows)?;
    Ok(format!(
        "I have a list of GitHub repositories. Please categorize them into logical groups based on their names, descriptions, and other attributes.
IMPORTANT: Your response must be valid JSON with no formatting errors. Do not include markdown code blocks or any text before or after the JSON.
Each repository should belong to exactly one category. Create as many categories as needed to group repositories with significant commonalities.

For each category, provide:
1. A descriptive category name
2. A list of repositories that belong to this category

Here's the repository data:
{data}

Format your response as a JSON object with this structure:
{RESPONSE_SHAPE}
"
    ))
}
