//! Lexical entries and catalogue items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use lexcache::{FavoriteRecord, HistoryRecord};

/// Pronunciation of a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phonetic {
    /// IPA transcription
    #[serde(default)]
    pub text: Option<String>,
    /// Recording URL; the API sends an empty string when there is none
    #[serde(default)]
    pub audio: Option<String>,
}

/// One sense of a word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Definition text
    pub definition: String,
    /// Usage example
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// Words with the same meaning
    #[serde(default)]
    pub synonyms: Vec<String>,
    /// Words with the opposite meaning
    #[serde(default)]
    pub antonyms: Vec<String>,
}

/// Senses grouped by part of speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    /// e.g. `noun`, `verb`
    pub part_of_speech: String,
    /// Senses in API order
    #[serde(default)]
    pub definitions: Vec<Definition>,
}

/// A lexical entry as returned by the dictionary API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Headword
    pub word: String,
    /// Primary transcription
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    /// All transcriptions
    #[serde(default)]
    pub phonetics: Vec<Phonetic>,
    /// Meanings by part of speech
    #[serde(default)]
    pub meanings: Vec<Meaning>,
    /// Etymology
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Word {
    /// First pronunciation recording, if any
    pub fn audio_url(&self) -> Option<&str> {
        self.phonetics
            .iter()
            .filter_map(|p| p.audio.as_deref())
            .find(|audio| !audio.is_empty())
    }

    /// Transcription to display: the primary one, else the first listed
    pub fn display_phonetic(&self) -> Option<&str> {
        self.phonetic
            .as_deref()
            .or_else(|| self.phonetics.iter().find_map(|p| p.text.as_deref()))
    }
}

/// Row of the remote `words` catalogue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordItem {
    /// Row id
    pub id: i64,
    /// Catalogue word
    pub word: String,
    /// Insertion time
    pub created_at: DateTime<Utc>,
}
