//! Remote lexical API client

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};
use url::Url;

use crate::config::{parse_base_url, DEFAULT_API_BASE};
use crate::error::{DictionaryError, LookupError};
use crate::lookup::WordSource;
use crate::model::Word;

/// Client for `GET {base}/{word}`
///
/// One attempt per call; retrying is the caller's decision.
#[derive(Debug, Clone)]
pub struct DictionaryApi {
    base_url: Url,
    http: reqwest::Client,
}

impl DictionaryApi {
    /// Client for the given base URL with its own HTTP connection pool
    pub fn new(base_url: &str) -> Result<Self, DictionaryError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lexdict/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DictionaryError::Config(format!("http client: {}", e)))?;
        Self::with_client(base_url, http)
    }

    /// Client for the given base URL sharing an existing HTTP client
    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, DictionaryError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http,
        })
    }

    /// Client for the public dictionary API
    pub fn public() -> Result<Self, DictionaryError> {
        Self::new(DEFAULT_API_BASE)
    }

    /// URL for `word`, percent-encoded as a single path segment
    pub fn endpoint(&self, word: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(word);
        }
        url
    }

    /// Fetch the first lexical entry for `word`
    pub async fn get_word(&self, word: &str) -> Result<Word, LookupError> {
        let url = self.endpoint(word);
        debug!(%url, "fetching word");

        let response = self.http.get(url).send().await.map_err(|e| {
            warn!(word, error = %e, "Error fetching word from API");
            LookupError::Network {
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LookupError::NotFound {
                word: word.to_string(),
            });
        }
        if !status.is_success() {
            warn!(word, %status, "lexical API returned an error status");
            return Err(LookupError::Http { status });
        }

        let body = response.bytes().await.map_err(|e| LookupError::Network {
            message: e.to_string(),
        })?;
        let mut entries: Vec<Word> =
            serde_json::from_slice(&body).map_err(|e| LookupError::Decode {
                message: e.to_string(),
            })?;

        if entries.is_empty() {
            return Err(LookupError::NotFound {
                word: word.to_string(),
            });
        }
        Ok(entries.swap_remove(0))
    }
}

#[async_trait]
impl WordSource for DictionaryApi {
    async fn fetch(&self, word: &str) -> Result<Word, LookupError> {
        self.get_word(word).await
    }
}
