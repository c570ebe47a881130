//! Remote word catalogue: paginated listing and prefix search

use reqwest::Method;
use tracing::{error, warn};

use crate::error::SyncError;
use crate::model::WordItem;
use crate::postgrest::{ilike_prefix, parse_content_range_total, PostgrestClient};

/// Catalogue page size
pub const WORDS_PER_PAGE: usize = 60;

/// Default cap on search results
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

const WORDS_COLLECTION: &str = "words";

/// One page of the catalogue
#[derive(Debug, Clone, PartialEq)]
pub struct WordsPage {
    /// Words on this page, ascending
    pub words: Vec<WordItem>,
    /// Total catalogue size when it was counted
    pub total: Option<u64>,
    /// Whether another page follows
    pub has_more: bool,
}

impl WordsPage {
    /// Page whose continuation is guessed from its size
    pub fn from_heuristic(words: Vec<WordItem>) -> Self {
        let has_more = words.len() == WORDS_PER_PAGE;
        Self {
            words,
            total: None,
            has_more,
        }
    }

    /// Page whose continuation follows from the known total
    pub fn from_total(page: usize, words: Vec<WordItem>, total: u64) -> Self {
        let seen = ((page + 1) * WORDS_PER_PAGE) as u64;
        Self {
            words,
            total: Some(total),
            has_more: seen < total,
        }
    }
}

/// Read-only access to the remote `words` collection
#[derive(Debug, Clone)]
pub struct WordsService {
    client: PostgrestClient,
}

impl WordsService {
    /// Catalogue over an existing PostgREST client
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    /// Zero-based page of the catalogue in ascending word order
    pub async fn list_words(&self, page: usize) -> Result<WordsPage, SyncError> {
        let words = self.fetch_page(page).await?;
        Ok(WordsPage::from_heuristic(words))
    }

    /// Like [`Self::list_words`], with `has_more` computed from an exact count
    ///
    /// Falls back to the page-size heuristic when counting fails.
    pub async fn list_words_counted(&self, page: usize) -> Result<WordsPage, SyncError> {
        let words = self.fetch_page(page).await?;
        match self.count().await {
            Ok(total) => Ok(WordsPage::from_total(page, words, total)),
            Err(e) => {
                warn!(error = %e, "word count unavailable, guessing continuation");
                Ok(WordsPage::from_heuristic(words))
            }
        }
    }

    /// Case-insensitive prefix search, ascending, at most `limit` results
    pub async fn search_words(&self, query: &str, limit: usize) -> Result<Vec<WordItem>, SyncError> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let limit = limit.to_string();
        let filter = ilike_prefix(query);
        let request = self
            .client
            .request(Method::GET, WORDS_COLLECTION, None)
            .query(&[
                ("select", "*"),
                ("word", filter.as_str()),
                ("order", "word.asc"),
                ("limit", limit.as_str()),
            ]);

        self.client.send_json(request).await.map_err(|e| {
            error!(error = %e, "Error searching words");
            e
        })
    }

    /// Catalogue size, `0` when it cannot be determined
    pub async fn total_count(&self) -> u64 {
        self.count().await.unwrap_or_else(|e| {
            error!(error = %e, "Error getting total count");
            0
        })
    }

    async fn fetch_page(&self, page: usize) -> Result<Vec<WordItem>, SyncError> {
        let offset = (page * WORDS_PER_PAGE).to_string();
        let limit = WORDS_PER_PAGE.to_string();
        let request = self
            .client
            .request(Method::GET, WORDS_COLLECTION, None)
            .query(&[
                ("select", "*"),
                ("order", "word.asc"),
                ("offset", offset.as_str()),
                ("limit", limit.as_str()),
            ]);

        self.client.send_json(request).await.map_err(|e| {
            error!(page, error = %e, "Error fetching words");
            e
        })
    }

    async fn count(&self) -> Result<u64, SyncError> {
        let request = self
            .client
            .request(Method::HEAD, WORDS_COLLECTION, None)
            .query(&[("select", "*")])
            .header("Prefer", "count=exact");

        let response = self.client.send(request).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| SyncError::Decode {
                message: "missing or invalid Content-Range".to_string(),
            })
    }
}
