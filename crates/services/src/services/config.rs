//! Environment-driven configuration for the recipe stores.

use std::{path::PathBuf, time::Duration};

use secrecy::SecretString;

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_PATH_PREFIX: &str = "data";

/// Connection details for the remote git-hosted content API
#[derive(Debug)]
pub struct ContentStoreConfig {
    pub api_url: String,
    pub owner: String,
    pub repo: String,
    pub token: SecretString,
    pub branch: String,
    /// Directory inside the repository holding the collection files
    pub path_prefix: String,
}

impl ContentStoreConfig {
    /// Returns `None` unless owner, repo and token are all set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let owner = value("GITHUB_OWNER")?;
        let repo = value("GITHUB_REPO")?;
        let token = value("GITHUB_TOKEN")?;

        Some(Self {
            api_url: value("GITHUB_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            owner,
            repo,
            token: SecretString::from(token),
            branch: value("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            path_prefix: DEFAULT_PATH_PREFIX.to_string(),
        })
    }
}

/// Where collections live and how long a loaded catalog may be reused
#[derive(Debug)]
pub struct RecipeStoreConfig {
    pub data_dir: PathBuf,
    pub remote: Option<ContentStoreConfig>,
    /// `None` reloads the collections on every query
    pub cache_ttl: Option<Duration>,
}

impl RecipeStoreConfig {
    pub fn local(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            remote: None,
            cache_ttl: None,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = lookup("RECIPES_DATA_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let cache_ttl = lookup("RECIPES_CACHE_TTL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);

        Self {
            data_dir,
            remote: ContentStoreConfig::from_lookup(&lookup),
            cache_ttl,
        }
    }
}
