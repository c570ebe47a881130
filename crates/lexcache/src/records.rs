//! Persisted favorites and history records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A favorited word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRecord {
    /// Unique within the favorites collection
    pub word: String,
    /// Time of first addition
    pub added_at: DateTime<Utc>,
}

impl FavoriteRecord {
    /// Record stamped with the current time
    pub fn now(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            added_at: Utc::now(),
        }
    }
}

/// A viewed word
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Unique within the history collection
    pub word: String,
    /// Time of the most recent view
    pub viewed_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Record stamped with the current time
    pub fn now(word: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            viewed_at: Utc::now(),
        }
    }
}
