use serde::Deserialize;

use crate::error::{IndexerError, Result};

pub const DEFAULT_GEMINI_MODEL: &str = "models/gemini-2.0-flash";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com";

/// Raw environment settings. Every field is optional here; each subcommand
/// asks for the group it needs and gets a `ConfigurationMissing` otherwise.
#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    github_pat: Option<String>,
    github_username: Option<String>,
    github_api_url: Option<String>,
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    gemini_api_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GitHubSettings {
    pub token: String,
    pub username: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
}

impl Settings {
    /// Load `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let cfg = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(false))
            .build()?;
        Self::from_config(cfg)
    }

    pub fn from_config(cfg: config::Config) -> Result<Self> {
        Ok(cfg.try_deserialize()?)
    }

    pub fn github(&self) -> Result<GitHubSettings> {
        Ok(GitHubSettings {
            token: required(&self.github_pat, "GITHUB_PAT")?,
            username: required(&self.github_username, "GITHUB_USERNAME")?,
            api_url: non_empty(&self.github_api_url)
                .unwrap_or(DEFAULT_GITHUB_API_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// `model_override` comes from the CLI and wins over `GEMINI_MODEL`.
    pub fn gemini(&self, model_override: Option<&str>) -> Result<GeminiSettings> {
        let model = model_override
            .or(non_empty(&self.gemini_model))
            .unwrap_or(DEFAULT_GEMINI_MODEL)
            .to_string();
        Ok(GeminiSettings {
            api_key: required(&self.gemini_api_key, "GEMINI_API_KEY")?,
            model,
            api_url: non_empty(&self.gemini_api_url)
                .unwrap_or(DEFAULT_GEMINI_API_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Both groups for a full run, checked together so a missing model key is
    /// reported before anything talks to GitHub.
    pub fn for_run(&self, model_override: Option<&str>) -> Result<(GitHubSettings, GeminiSettings)> {
        let github = self.github()?;
        let gemini = self.gemini(model_override)?;
        Ok((github, gemini))
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn required(value: &Option<String>, name: &'static str) -> Result<String> {
    non_empty(value)
        .map(str::to_string)
        .ok_or(IndexerError::ConfigurationMissing { name })
}
