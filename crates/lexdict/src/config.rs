//! Runtime configuration for the dictionary core

use std::path::PathBuf;

use url::Url;

use crate::error::DictionaryError;

/// Default lexical API endpoint; the word is appended as a path segment
pub const DEFAULT_API_BASE: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";

/// Default directory for the local medium
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Connection details for the remote synced store
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub url: String,
    /// Public (anon) API key sent with every request
    pub api_key: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Everything needed to assemble a [`crate::Dictionary`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryConfig {
    /// Directory holding the local medium
    pub data_dir: PathBuf,
    /// Lexical API base URL
    pub api_base_url: String,
    /// Remote synced store; `None` keeps the client local-only
    pub remote: Option<RemoteConfig>,
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            api_base_url: DEFAULT_API_BASE.to_string(),
            remote: None,
        }
    }
}

impl DictionaryConfig {
    /// Config rooted at `data_dir` with default endpoints
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Use a different lexical API
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Enable the remote synced store
    pub fn with_remote(mut self, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.remote = Some(RemoteConfig {
            url: url.into(),
            api_key: api_key.into(),
        });
        self
    }

    /// Reject configurations that cannot work
    pub fn validate(&self) -> Result<(), DictionaryError> {
        parse_base_url(&self.api_base_url)?;

        if let Some(remote) = &self.remote {
            parse_base_url(&remote.url)?;
            if remote.api_key.trim().is_empty() {
                return Err(DictionaryError::Config(
                    "remote api key is empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Parse a base URL that path segments can be appended to
pub(crate) fn parse_base_url(raw: &str) -> Result<Url, DictionaryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DictionaryError::Config("base url is empty".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| DictionaryError::Config(format!("invalid url '{}': {}", trimmed, e)))?;
    if url.cannot_be_a_base() {
        return Err(DictionaryError::Config(format!(
            "url '{}' cannot take path segments",
            trimmed
        )));
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = DictionaryConfig::default();

        assert_eq!(config.api_base_url, DEFAULT_API_BASE);
        assert!(config.remote.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_urls() {
        let config = DictionaryConfig::new("/tmp/x").with_api_base_url("not a url");
        assert!(matches!(config.validate(), Err(DictionaryError::Config(_))));

        let config = DictionaryConfig::new("/tmp/x").with_api_base_url("mailto:me@example.com");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_remote_key() {
        let config = DictionaryConfig::default().with_remote("https://project.supabase.co", " ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = DictionaryConfig::default().with_remote("https://p.supabase.co", "anon-key");
        assert!(!format!("{:?}", config).contains("anon-key"));
    }
}
