use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::GitHubSettings;
use crate::error::{IndexerError, Result};
use crate::model::RepositoryRecord;

/// Maximum page size allowed by the GitHub API.
pub const PER_PAGE: usize = 100;
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct GitHubRepo {
    name: String,
    html_url: String,
    created_at: String,
    description: Option<String>,
}

impl From<GitHubRepo> for RepositoryRecord {
    fn from(r: GitHubRepo) -> Self {
        RepositoryRecord {
            name: r.name,
            url: r.html_url,
            created_at: r.created_at,
            description: r.description,
        }
    }
}

pub struct RepoFetcher {
    client: Client,
    settings: GitHubSettings,
    page_delay: Duration,
}

impl RepoFetcher {
    pub fn new(settings: GitHubSettings, page_delay: Duration) -> Result<Self> {
        if settings.token.trim().is_empty() {
            return Err(IndexerError::ConfigurationMissing { name: "GITHUB_PAT" });
        }
        if settings.username.trim().is_empty() {
            return Err(IndexerError::ConfigurationMissing { name: "GITHUB_USERNAME" });
        }
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent("repo_indexer")
            .build()?;
        Ok(RepoFetcher {
            client,
            settings,
            page_delay,
        })
    }

    pub fn username(&self) -> &str {
        &self.settings.username
    }

    /// Fetch every public repository of the configured user, newest first.
    ///
    /// A page shorter than `PER_PAGE` is taken as the last one, so the endpoint
    /// must never return a short page in the middle of the listing.
    pub async fn fetch_all(&self) -> Result<Vec<RepositoryRecord>> {
        let url = format!(
            "{}/users/{}/repos",
            self.settings.api_url, self.settings.username
        );
        info!("Fetching repositories for GitHub user: {}", self.settings.username);

        let url = url.as_str();
        let (repos, pages) = paginate(self.page_delay, move |page| self.fetch_page(url, page)).await?;
        let mut all: Vec<RepositoryRecord> = repos.into_iter().map(RepositoryRecord::from).collect();

        sort_newest_first(&mut all);
        info!("Fetched {} repositories in {} page(s)", all.len(), pages);
        Ok(all)
    }

    async fn fetch_page(&self, url: &str, page: usize) -> Result<Vec<GitHubRepo>> {
        let response = self
            .client
            .get(url)
            .header("Authorization", format!("token {}", self.settings.token))
            .header("Accept", "application/vnd.github.v3+json")
            .query(&[
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
                ("type", "public".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::ListingRequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }
}

/// Call `fetch_page` for pages 1, 2, ... until a page is empty or shorter than
/// `PER_PAGE`, sleeping `delay` between pages. Returns the items and the number
/// of pages requested.
pub async fn paginate<T, F, Fut>(delay: Duration, mut fetch_page: F) -> Result<(Vec<T>, usize)>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    let mut all = Vec::new();
    let mut page = 1usize;
    loop {
        println!("Fetching page {} of repositories...", page);
        let items = fetch_page(page).await?;
        let count = items.len();
        all.extend(items);
        debug!(page, count, total = all.len(), "page fetched");

        if count < PER_PAGE {
            return Ok((all, page));
        }
        page += 1;
        tokio::time::sleep(delay).await;
    }
}

/// Stable sort by `created_at`, descending. ISO-8601 strings order lexicographically.
pub fn sort_newest_first(repos: &mut [RepositoryRecord]) {
    repos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(api_url: &str) -> GitHubSettings {
        GitHubSettings {
            token: "test-token".into(),
            username: "octocat".into(),
            api_url: api_url.into(),
        }
    }

    fn page_body(page: usize, n: usize) -> serde_json::Value {
        let repos: Vec<_> = (0..n)
            .map(|i| {
                serde_json::json!({
                    "name": format!("repo-{}-{}", page, i),
                    "html_url": format!("https://github.com/octocat/repo-{}-{}", page, i),
                    // day varies per page so sorting is observable
                    "created_at": format!("2023-{:02}-01T00:00:{:02}Z", page, i % 60),
                    "description": if i % 2 == 0 { serde_json::Value::Null } else { "desc".into() },
                })
            })
            .collect();
        serde_json::Value::Array(repos)
    }

    async fn mount_page(server: &MockServer, page: usize, n: usize) {
        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .and(query_param("page", page.to_string()))
            .and(query_param("per_page", "100"))
            .and(query_param("type", "public"))
            .and(header("Authorization", "token test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(page, n)))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn paginates_until_short_page() {
        let server = MockServer::start().await;
        mount_page(&server, 1, 100).await;
        mount_page(&server, 2, 100).await;
        mount_page(&server, 3, 37).await;

        let fetcher = RepoFetcher::new(settings(&server.uri()), Duration::ZERO).unwrap();
        let repos = fetcher.fetch_all().await.unwrap();

        assert_eq!(repos.len(), 237);
        assert!(repos
            .windows(2)
            .all(|w| w[0].created_at >= w[1].created_at));
        assert!(repos[0].name.starts_with("repo-3-"));
        // expect(1) on each mock is verified when the server drops
    }

    #[tokio::test]
    async fn empty_first_page_yields_nothing() {
        let server = MockServer::start().await;
        mount_page(&server, 1, 0).await;

        let fetcher = RepoFetcher::new(settings(&server.uri()), Duration::ZERO).unwrap();
        let repos = fetcher.fetch_all().await.unwrap();
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn non_success_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octocat/repos"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = RepoFetcher::new(settings(&server.uri()), Duration::ZERO).unwrap();
        match fetcher.fetch_all().await {
            Err(IndexerError::ListingRequestFailed { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "Bad credentials");
            }
            other => panic!("expected listing failure, got {:?}", other),
        }
    }

    #[test]
    fn rejects_missing_credentials() {
        let mut s = settings("http://localhost");
        s.token = String::new();
        assert!(matches!(
            RepoFetcher::new(s, Duration::ZERO),
            Err(IndexerError::ConfigurationMissing { name: "GITHUB_PAT" })
        ));
    }

    fn pages_of(sizes: &'static [usize]) -> impl FnMut(usize) -> std::future::Ready<Result<Vec<usize>>> {
        move |page| std::future::ready(Ok(vec![page; sizes.get(page - 1).copied().unwrap_or(0)]))
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_pages_but_not_after_the_last() {
        let delay = Duration::from_millis(500);
        let start = tokio::time::Instant::now();
        let mut called_at = Vec::new();
        let mut source = pages_of(&[100, 37]);

        let (items, pages) = paginate(delay, |page| {
            called_at.push((page, start.elapsed()));
            source(page)
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 137);
        assert_eq!(pages, 2);
        assert_eq!(called_at, vec![(1, Duration::ZERO), (2, delay)]);
        assert_eq!(start.elapsed(), delay);
    }

    #[tokio::test(start_paused = true)]
    async fn one_pause_per_full_page() {
        let delay = Duration::from_millis(250);
        let start = tokio::time::Instant::now();
        let mut requested = Vec::new();
        let mut source = pages_of(&[100, 100, 37]);

        let (items, pages) = paginate(delay, |page| {
            requested.push(page);
            source(page)
        })
        .await
        .unwrap();

        assert_eq!(items.len(), 237);
        assert_eq!(pages, 3);
        assert_eq!(requested, vec![1, 2, 3]);
        assert_eq!(start.elapsed(), delay * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_first_page_does_not_sleep() {
        let start = tokio::time::Instant::now();
        let (items, pages) = paginate(Duration::from_secs(5), pages_of(&[]))
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(pages, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[test]
    fn sort_is_descending_by_creation() {
        let rec = |name: &str, at: &str| RepositoryRecord {
            name: name.into(),
            url: String::new(),
            created_at: at.into(),
            description: None,
        };
        let mut repos = vec![
            rec("old", "2019-05-01T00:00:00Z"),
            rec("new", "2024-02-01T00:00:00Z"),
            rec("mid", "2021-07-01T00:00:00Z"),
        ];
        sort_newest_first(&mut repos);
        let names: Vec<&str> = repos.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["new", "mid", "old"]);
    }
}
