//! Object graph for one dictionary client process

use std::sync::Arc;

use lexcache::{ExpiringCache, LocalStore};
use lexstore::LexStore;
use tracing::{info, warn};

use crate::api::DictionaryApi;
use crate::config::DictionaryConfig;
use crate::controller::DictionaryController;
use crate::error::{DictionaryError, SyncError};
use crate::lookup::WordLookup;
use crate::model::Word;
use crate::postgrest::PostgrestClient;
use crate::remote::{PostgrestStore, RemoteStore};
use crate::words::WordsService;

/// Every service of the client, constructed once at startup
///
/// The lookup cache and the local store share a single [`LexStore`] and
/// one HTTP connection pool serves the lexical API and the remote store.
pub struct Dictionary {
    store: Arc<LexStore>,
    lookup: WordLookup,
    controller: DictionaryController,
    words: Option<WordsService>,
}

impl Dictionary {
    /// Validate `config` and assemble the services
    ///
    /// The controller starts anonymous with empty projections; call
    /// [`DictionaryController::load`] or
    /// [`DictionaryController::set_auth_state`] next.
    pub fn open(config: DictionaryConfig) -> Result<Self, DictionaryError> {
        config.validate()?;

        let store = Arc::new(LexStore::open(&config.data_dir)?);
        let http = reqwest::Client::builder()
            .user_agent(concat!("lexdict/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DictionaryError::Config(format!("http client: {}", e)))?;

        let api = DictionaryApi::with_client(&config.api_base_url, http.clone())?;
        let lookup = WordLookup::new(ExpiringCache::new(store.clone()), Arc::new(api));
        let local = Arc::new(LocalStore::new(store.clone()));

        let (remote, words) = match &config.remote {
            Some(remote) => {
                let client = PostgrestClient::new(remote, http)?;
                let store: Arc<dyn RemoteStore> = Arc::new(PostgrestStore::new(client.clone()));
                (Some(store), Some(WordsService::new(client)))
            }
            None => (None, None),
        };

        info!(
            data_dir = %config.data_dir.display(),
            api = %config.api_base_url,
            remote = config.remote.is_some(),
            "dictionary ready"
        );

        Ok(Self {
            store,
            lookup,
            controller: DictionaryController::new(local, remote),
            words,
        })
    }

    /// Cached word lookups
    pub fn lookup(&self) -> &WordLookup {
        &self.lookup
    }

    /// Favorites and history
    pub fn controller(&self) -> &DictionaryController {
        &self.controller
    }

    /// Remote word catalogue, when a remote store is configured
    pub fn words(&self) -> Result<&WordsService, SyncError> {
        self.words.as_ref().ok_or(SyncError::NotConfigured)
    }

    /// Look up `word` and record the view in the history
    ///
    /// A history failure is logged; the entry is still returned.
    pub async fn view_word(&self, word: &str) -> Result<Word, DictionaryError> {
        let entry = self.lookup.lookup(word).await?;
        if let Err(e) = self.controller.add_to_history(&entry.word).await {
            warn!(word = %entry.word, error = %e, "could not record view");
        }
        Ok(entry)
    }

    /// Reclaim space held by expired and overwritten values
    pub fn compact(&self) -> Result<u64, DictionaryError> {
        Ok(self.store.compact()?)
    }

    /// Flush and close the local medium
    pub fn close(&self) -> Result<(), DictionaryError> {
        Ok(self.store.close()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthState, Session};
    use crate::controller::SyncOutcome;
    use crate::test_support::serve;
    use axum::extract::Path;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use tempfile::TempDir;

    async fn api_base() -> String {
        async fn entry(Path(word): Path<String>) -> Json<serde_json::Value> {
            Json(json!([{ "word": word, "meanings": [] }]))
        }
        serve(Router::new().route("/entries/:word", get(entry))).await + "/entries"
    }

    #[test]
    fn test_open_rejects_invalid_config() {
        let dir = TempDir::new().unwrap();
        let config = DictionaryConfig::new(dir.path()).with_api_base_url("");

        assert!(matches!(Dictionary::open(config), Err(DictionaryError::Config(_))));
    }

    #[tokio::test]
    async fn test_view_word_caches_and_records_history() {
        let dir = TempDir::new().unwrap();
        let config = DictionaryConfig::new(dir.path()).with_api_base_url(api_base().await);
        let dictionary = Dictionary::open(config).unwrap();
        assert_eq!(dictionary.controller().load().await, SyncOutcome::Local);

        let word = dictionary.view_word(" Hello ").await.unwrap();

        assert_eq!(word.word, "hello");
        assert_eq!(dictionary.controller().history()[0].word, "hello");
        assert!(dictionary.lookup().cache().get("hello").is_some());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let base = api_base().await;

        {
            let dictionary =
                Dictionary::open(DictionaryConfig::new(dir.path()).with_api_base_url(&base)).unwrap();
            dictionary.controller().load().await;
            dictionary.controller().add_favorite("run").await.unwrap();
            dictionary.lookup().lookup("walk").await.unwrap();
            dictionary.close().unwrap();
        }

        let dictionary =
            Dictionary::open(DictionaryConfig::new(dir.path()).with_api_base_url(&base)).unwrap();
        dictionary.controller().load().await;

        assert!(dictionary.controller().is_favorite("run"));
        assert!(dictionary.lookup().cache().get("walk").is_some());
        assert!(dictionary.compact().is_ok());
    }

    #[tokio::test]
    async fn test_local_only_has_no_catalogue() {
        let dir = TempDir::new().unwrap();
        let dictionary = Dictionary::open(DictionaryConfig::new(dir.path())).unwrap();

        assert!(matches!(dictionary.words(), Err(SyncError::NotConfigured)));

        let outcome = dictionary
            .controller()
            .set_auth_state(AuthState::Authenticated(Session::new("u", "t")))
            .await;
        assert_eq!(outcome, SyncOutcome::LocalFallback);
    }
}
