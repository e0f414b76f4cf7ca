use serde::{Deserialize, Deserializer, Serialize};

/// A repository as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    pub name: String,
    pub url: String,
    pub created_at: String,
    pub description: Option<String>,
}

/// On-disk row shape, written by the CSV writer and read back by the categorizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvRow {
    pub name: String,
    pub url: String,
    pub created_at: String,
    pub description: String,
}

impl From<&RepositoryRecord> for CsvRow {
    fn from(r: &RepositoryRecord) -> Self {
        CsvRow {
            name: r.name.clone(),
            url: r.url.clone(),
            created_at: r.created_at.clone(),
            description: r.description.clone().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default, deserialize_with = "named_repos")]
    pub repositories: Vec<RepoRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub name: String,
    pub url: String,
}

/// Model output is loose: a repository without a name is dropped, and a null
/// or missing url becomes empty, instead of failing the whole set.
fn named_repos<'de, D>(deserializer: D) -> Result<Vec<RepoRef>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct LooseRepo {
        name: Option<String>,
        url: Option<String>,
    }

    let entries = Option::<Vec<LooseRepo>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|e| {
            Some(RepoRef {
                name: e.name?,
                url: e.url.unwrap_or_default(),
            })
        })
        .collect())
}

impl CategorySet {
    /// Single empty "Uncategorized" category, used whenever categorization fails.
    pub fn fallback() -> Self {
        CategorySet {
            categories: vec![Category {
                name: "Uncategorized".to_string(),
                repositories: Vec::new(),
            }],
        }
    }
}
