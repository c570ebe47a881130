//! Favorites/history projections and the routing of every mutation
//!
//! While anonymous the local store is authoritative. Once a session is
//! supplied, the remote store is authoritative and every successful sync is
//! mirrored into the local store so the next anonymous or offline start has
//! warm data.

use std::sync::Arc;

use lexcache::LocalStore;
use reqwest::StatusCode;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use crate::auth::{AuthState, Session};
use crate::error::{DictionaryError, SyncError};
use crate::model::{FavoriteRecord, HistoryRecord};
use crate::remote::{favorites_from_rows, history_from_rows, RemoteStore};

/// In-memory view of favorites and history published to subscribers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DictionarySnapshot {
    /// Favorites in store order
    pub favorites: Vec<FavoriteRecord>,
    /// History, most recent first
    pub history: Vec<HistoryRecord>,
    /// Whether the projections came from an authenticated session
    pub authenticated: bool,
}

impl DictionarySnapshot {
    /// Whether `word` is among the favorites
    pub fn is_favorite(&self, word: &str) -> bool {
        self.favorites.iter().any(|fav| fav.word == word)
    }
}

/// Where the projections were loaded from by a reconciliation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Fetched from the remote store and mirrored locally
    Remote,
    /// Remote sync failed; loaded from the local store instead
    LocalFallback,
    /// Anonymous; loaded from the local store
    Local,
}

/// Owns the projections and routes mutations to the authoritative store
///
/// Mutations and reconciliation passes are serialized: each one holds the
/// routing lock for its whole duration, so a sync cannot interleave with a
/// write and two adds cannot lose each other's update.
///
/// Local store calls are blocking file I/O made directly on the calling
/// task.
pub struct DictionaryController {
    local: Arc<LocalStore>,
    remote: Option<Arc<dyn RemoteStore>>,
    routing: Mutex<Routing>,
    state: watch::Sender<DictionarySnapshot>,
}

/// Auth state plus whether the favorites projection mirrors the remote
struct Routing {
    auth: AuthState,
    /// Set only by a successful remote sync; a local fallback clears it
    remote_fresh: bool,
}

impl DictionaryController {
    /// Controller in the anonymous state with empty projections
    ///
    /// Call [`Self::load`] before relying on the projections.
    pub fn new(local: Arc<LocalStore>, remote: Option<Arc<dyn RemoteStore>>) -> Self {
        let (state, _) = watch::channel(DictionarySnapshot::default());
        Self {
            local,
            remote,
            routing: Mutex::new(Routing {
                auth: AuthState::Anonymous,
                remote_fresh: false,
            }),
            state,
        }
    }

    /// Receiver notified whenever the projections change
    pub fn subscribe(&self) -> watch::Receiver<DictionarySnapshot> {
        self.state.subscribe()
    }

    /// Copy of the current projections
    pub fn snapshot(&self) -> DictionarySnapshot {
        self.state.borrow().clone()
    }

    /// Current favorites projection
    pub fn favorites(&self) -> Vec<FavoriteRecord> {
        self.state.borrow().favorites.clone()
    }

    /// Current history projection
    pub fn history(&self) -> Vec<HistoryRecord> {
        self.state.borrow().history.clone()
    }

    /// Whether `word` is a favorite, answered from the projection
    pub fn is_favorite(&self, word: &str) -> bool {
        self.state.borrow().is_favorite(word)
    }

    /// Whether the projections belong to an authenticated session
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().authenticated
    }

    /// Initial load for whatever auth state is current
    pub async fn load(&self) -> SyncOutcome {
        let mut guard = self.routing.lock().await;
        self.reconcile(&mut guard).await
    }

    /// Re-run the reconciliation pass without changing the auth state
    pub async fn refresh(&self) -> SyncOutcome {
        self.load().await
    }

    /// Apply an auth state change and reconcile
    pub async fn set_auth_state(&self, next: AuthState) -> SyncOutcome {
        let mut guard = self.routing.lock().await;
        match &next {
            AuthState::Authenticated(session) => {
                info!(user_id = %session.user_id, "session started")
            }
            AuthState::Anonymous if guard.auth.is_authenticated() => info!("session ended"),
            AuthState::Anonymous => {}
        }
        guard.auth = next;
        self.reconcile(&mut guard).await
    }

    /// Mark `word` as a favorite; adding an existing favorite does nothing
    pub async fn add_favorite(&self, word: &str) -> Result<(), DictionaryError> {
        let mut guard = self.routing.lock().await;
        let routing = &mut *guard;
        match self.route(&routing.auth)? {
            Some((remote, session)) => {
                if self.remote_has_favorite(routing.remote_fresh, remote, session, word).await? {
                    debug!(word, "already a favorite");
                    return Ok(());
                }
                insert_favorite(remote, session, word).await.map_err(|e| {
                    error!(word, error = %e, "Error adding favorite");
                    e
                })?;
                routing.remote_fresh = self.resync(remote, session).await;
            }
            None => {
                self.local.add_favorite(word);
                self.publish_favorites(self.local.get_favorites());
            }
        }
        Ok(())
    }

    /// Remove `word` from the favorites
    pub async fn remove_favorite(&self, word: &str) -> Result<(), DictionaryError> {
        let mut guard = self.routing.lock().await;
        let routing = &mut *guard;
        match self.route(&routing.auth)? {
            Some((remote, session)) => {
                remote.delete_favorite(session, word).await.map_err(|e| {
                    error!(word, error = %e, "Error removing favorite");
                    e
                })?;
                routing.remote_fresh = self.resync(remote, session).await;
            }
            None => {
                self.local.remove_favorite(word);
                self.publish_favorites(self.local.get_favorites());
            }
        }
        Ok(())
    }

    /// Flip the favorite status of `word`; returns whether it is now a favorite
    ///
    /// The decision is taken under the same lock as the write. While signed
    /// in it is taken against the remote rows unless the projection was just
    /// synced from them.
    pub async fn toggle_favorite(&self, word: &str) -> Result<bool, DictionaryError> {
        let mut guard = self.routing.lock().await;
        let routing = &mut *guard;

        match self.route(&routing.auth)? {
            Some((remote, session)) => {
                let was_favorite = self
                    .remote_has_favorite(routing.remote_fresh, remote, session, word)
                    .await?;
                let result = if was_favorite {
                    remote.delete_favorite(session, word).await
                } else {
                    insert_favorite(remote, session, word).await
                };
                result.map_err(|e| {
                    error!(word, error = %e, "Error toggling favorite");
                    e
                })?;
                routing.remote_fresh = self.resync(remote, session).await;
                Ok(!was_favorite)
            }
            None => {
                let was_favorite = self.is_favorite(word);
                if was_favorite {
                    self.local.remove_favorite(word);
                } else {
                    self.local.add_favorite(word);
                }
                self.publish_favorites(self.local.get_favorites());
                Ok(!was_favorite)
            }
        }
    }

    /// Record a view of `word`
    pub async fn add_to_history(&self, word: &str) -> Result<(), DictionaryError> {
        let mut guard = self.routing.lock().await;
        let routing = &mut *guard;
        match self.route(&routing.auth)? {
            Some((remote, session)) => {
                remote.insert_history(session, word).await.map_err(|e| {
                    error!(word, error = %e, "Error adding to history");
                    e
                })?;
                routing.remote_fresh = self.resync(remote, session).await;
            }
            None => {
                self.local.add_to_history(word);
                self.publish_history(self.local.get_history());
            }
        }
        Ok(())
    }

    /// Delete the whole history
    pub async fn clear_history(&self) -> Result<(), DictionaryError> {
        let mut guard = self.routing.lock().await;
        let routing = &mut *guard;
        match self.route(&routing.auth)? {
            Some((remote, session)) => {
                remote.clear_history(session).await.map_err(|e| {
                    error!(error = %e, "Error clearing history");
                    e
                })?;
                routing.remote_fresh = self.resync(remote, session).await;
            }
            None => {
                self.local.clear_history();
                self.publish_history(Vec::new());
            }
        }
        Ok(())
    }

    /// Remote store and session for an authenticated state, `None` when anonymous
    fn route<'a>(
        &'a self,
        auth: &'a AuthState,
    ) -> Result<Option<(&'a dyn RemoteStore, &'a Session)>, SyncError> {
        match auth.session() {
            None => Ok(None),
            Some(session) => match &self.remote {
                Some(remote) => Ok(Some((remote.as_ref(), session))),
                None => {
                    warn!("signed in but no remote store is configured");
                    Err(SyncError::NotConfigured)
                }
            },
        }
    }

    /// Whether the remote rows hold `word`
    ///
    /// A fresh projection answers directly; otherwise the rows are fetched.
    async fn remote_has_favorite(
        &self,
        remote_fresh: bool,
        remote: &dyn RemoteStore,
        session: &Session,
        word: &str,
    ) -> Result<bool, SyncError> {
        if remote_fresh {
            return Ok(self.is_favorite(word));
        }

        let rows = remote.fetch_favorites(session).await.map_err(|e| {
            error!(word, error = %e, "Error checking remote favorites");
            e
        })?;
        Ok(rows.iter().any(|row| row.word == word))
    }

    async fn reconcile(&self, routing: &mut Routing) -> SyncOutcome {
        let outcome = match self.route(&routing.auth) {
            Ok(Some((remote, session))) => match self.sync_from_remote(remote, session).await {
                Ok(()) => SyncOutcome::Remote,
                Err(e) => {
                    warn!(error = %e, "remote sync failed, loading local data");
                    self.load_local(true);
                    SyncOutcome::LocalFallback
                }
            },
            Ok(None) => {
                self.load_local(false);
                SyncOutcome::Local
            }
            Err(_) => {
                self.load_local(true);
                SyncOutcome::LocalFallback
            }
        };
        routing.remote_fresh = outcome == SyncOutcome::Remote;
        outcome
    }

    /// Full sync after a successful remote mutation; returns whether it succeeded
    ///
    /// The mutation already happened, so a failed refresh only degrades the
    /// projections to the local mirror.
    async fn resync(&self, remote: &dyn RemoteStore, session: &Session) -> bool {
        match self.sync_from_remote(remote, session).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "refresh after remote write failed, loading local data");
                self.load_local(true);
                false
            }
        }
    }

    async fn sync_from_remote(
        &self,
        remote: &dyn RemoteStore,
        session: &Session,
    ) -> Result<(), SyncError> {
        let (favorite_rows, history_rows) = tokio::try_join!(
            remote.fetch_favorites(session),
            remote.fetch_history(session)
        )?;

        let favorites = favorites_from_rows(favorite_rows);
        let history = history_from_rows(history_rows);
        debug!(
            favorites = favorites.len(),
            history = history.len(),
            "synced from remote"
        );

        self.local.set_favorites(&favorites);
        self.local.set_history(&history);
        self.state.send_replace(DictionarySnapshot {
            favorites,
            history,
            authenticated: true,
        });
        Ok(())
    }

    fn load_local(&self, authenticated: bool) {
        let favorites = self.local.get_favorites();
        let history = self.local.get_history();
        self.state.send_replace(DictionarySnapshot {
            favorites,
            history,
            authenticated,
        });
    }

    fn publish_favorites(&self, favorites: Vec<FavoriteRecord>) {
        self.state.send_modify(|snapshot| snapshot.favorites = favorites);
    }

    fn publish_history(&self, history: Vec<HistoryRecord>) {
        self.state.send_modify(|snapshot| snapshot.history = history);
    }
}

/// Insert a favorite, treating a unique-constraint conflict as already present
async fn insert_favorite(
    remote: &dyn RemoteStore,
    session: &Session,
    word: &str,
) -> Result<(), SyncError> {
    match remote.insert_favorite(session, word).await {
        Err(SyncError::Http { status, .. }) if status == StatusCode::CONFLICT => {
            debug!(word, "favorite already stored remotely");
            Ok(())
        }
        other => other,
    }
}
