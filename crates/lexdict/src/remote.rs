//! Remote synced store for favorites and history
//!
//! Rows are scoped to the signed-in principal. Remote field names
//! (`added_at`, `viewed_at`) are mapped to the local record shape by
//! [`favorites_from_rows`] and [`history_from_rows`].

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::auth::Session;
use crate::error::SyncError;
use crate::model::{FavoriteRecord, HistoryRecord};
use crate::postgrest::{eq, PostgrestClient};

/// Remote favorites collection
pub const FAVORITES_COLLECTION: &str = "favorites";

/// Remote history collection
pub const HISTORY_COLLECTION: &str = "history";

/// Rows fetched from the remote history
pub const REMOTE_HISTORY_LIMIT: usize = 100;

/// Row of the remote `favorites` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFavorite {
    /// Owning principal
    pub user_id: String,
    /// Favorited word
    pub word: String,
    /// Insertion time
    pub added_at: DateTime<Utc>,
}

/// Row of the remote `history` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteHistory {
    /// Owning principal
    pub user_id: String,
    /// Viewed word
    pub word: String,
    /// View time
    pub viewed_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct NewRow<'a> {
    user_id: &'a str,
    word: &'a str,
}

/// Collection-style access to the remote favorites and history
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// All favorites, newest first
    async fn fetch_favorites(&self, session: &Session) -> Result<Vec<RemoteFavorite>, SyncError>;

    /// Insert a favorite for the session's principal
    async fn insert_favorite(&self, session: &Session, word: &str) -> Result<(), SyncError>;

    /// Delete the principal's favorite for `word`
    async fn delete_favorite(&self, session: &Session, word: &str) -> Result<(), SyncError>;

    /// Most recent history rows, newest first
    async fn fetch_history(&self, session: &Session) -> Result<Vec<RemoteHistory>, SyncError>;

    /// Record a view of `word`
    async fn insert_history(&self, session: &Session, word: &str) -> Result<(), SyncError>;

    /// Delete all of the principal's history
    async fn clear_history(&self, session: &Session) -> Result<(), SyncError>;
}

/// Map remote favorites to local records, keeping the first row per word
pub fn favorites_from_rows(rows: Vec<RemoteFavorite>) -> Vec<FavoriteRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.word.clone()))
        .map(|row| FavoriteRecord {
            word: row.word,
            added_at: row.added_at,
        })
        .collect()
}

/// Map remote history to local records: newest view per word, capped
///
/// The remote collection appends a row per view, so repeats are collapsed
/// here.
pub fn history_from_rows(mut rows: Vec<RemoteHistory>) -> Vec<HistoryRecord> {
    rows.sort_by(|a, b| b.viewed_at.cmp(&a.viewed_at));

    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|row| seen.insert(row.word.clone()))
        .take(lexcache::HISTORY_LIMIT)
        .map(|row| HistoryRecord {
            word: row.word,
            viewed_at: row.viewed_at,
        })
        .collect()
}

/// [`RemoteStore`] backed by PostgREST collections
#[derive(Debug, Clone)]
pub struct PostgrestStore {
    client: PostgrestClient,
}

impl PostgrestStore {
    /// Store over an existing PostgREST client
    pub fn new(client: PostgrestClient) -> Self {
        Self { client }
    }

    async fn insert(&self, collection: &str, session: &Session, word: &str) -> Result<(), SyncError> {
        let row = NewRow {
            user_id: &session.user_id,
            word,
        };
        let request = self
            .client
            .request(Method::POST, collection, Some(&session.access_token))
            .header("Prefer", "return=minimal")
            .json(&row);

        self.client.send(request).await.map(|_| ())
    }
}

#[async_trait]
impl RemoteStore for PostgrestStore {
    async fn fetch_favorites(&self, session: &Session) -> Result<Vec<RemoteFavorite>, SyncError> {
        let request = self
            .client
            .request(Method::GET, FAVORITES_COLLECTION, Some(&session.access_token))
            .query(&[("select", "*"), ("order", "added_at.desc")]);

        self.client.send_json(request).await
    }

    async fn insert_favorite(&self, session: &Session, word: &str) -> Result<(), SyncError> {
        self.insert(FAVORITES_COLLECTION, session, word).await
    }

    async fn delete_favorite(&self, session: &Session, word: &str) -> Result<(), SyncError> {
        let request = self
            .client
            .request(Method::DELETE, FAVORITES_COLLECTION, Some(&session.access_token))
            .query(&[("user_id", eq(&session.user_id)), ("word", eq(word))]);

        self.client.send(request).await.map(|_| ())
    }

    async fn fetch_history(&self, session: &Session) -> Result<Vec<RemoteHistory>, SyncError> {
        let limit = REMOTE_HISTORY_LIMIT.to_string();
        let request = self
            .client
            .request(Method::GET, HISTORY_COLLECTION, Some(&session.access_token))
            .query(&[
                ("select", "*"),
                ("order", "viewed_at.desc"),
                ("limit", limit.as_str()),
            ]);

        self.client.send_json(request).await
    }

    async fn insert_history(&self, session: &Session, word: &str) -> Result<(), SyncError> {
        self.insert(HISTORY_COLLECTION, session, word).await
    }

    async fn clear_history(&self, session: &Session) -> Result<(), SyncError> {
        let request = self
            .client
            .request(Method::DELETE, HISTORY_COLLECTION, Some(&session.access_token))
            .query(&[("user_id", eq(&session.user_id))]);

        self.client.send(request).await.map(|_| ())
    }
}
