use std::sync::Arc;

use configs::AppConfig;
use gateway::{HttpGateway, MovieApi};
use models::Session;
use tracing::info;

use crate::catalog::Catalog;
use crate::favorites::FavoritesReconciler;
use crate::session_store::SessionStore;
use crate::storage::{JsonRecordStore, SessionStorage};

/// Session Store plus the components layered on it, sharing one session.
pub struct Client<G: MovieApi + 'static, S: SessionStorage> {
    pub sessions: Arc<SessionStore<G, S>>,
    pub favorites: FavoritesReconciler<G, S>,
    pub catalog: Catalog<G, S>,
}

impl<G: MovieApi + 'static, S: SessionStorage> Client<G, S> {
    pub fn new(sessions: Arc<SessionStore<G, S>>) -> Self {
        Self {
            favorites: FavoritesReconciler::new(Arc::clone(&sessions)),
            catalog: Catalog::new(Arc::clone(&sessions)),
            sessions,
        }
    }
}

pub type HttpClient = Client<HttpGateway, JsonRecordStore<Session>>;

/// Build the HTTP-backed client and restore the persisted session.
pub async fn connect(cfg: &AppConfig) -> anyhow::Result<HttpClient> {
    common::env::ensure_parent_dir(&cfg.storage.session_path).await?;
    let gateway = HttpGateway::new(&cfg.backend)?;
    let storage = JsonRecordStore::new(cfg.storage.session_path.clone());
    let sessions = SessionStore::open(Arc::new(gateway), storage).await?;
    info!(
        base_url = %cfg.backend.base_url,
        session_path = %cfg.storage.session_path.display(),
        "client ready"
    );
    Ok(Client::new(Arc::new(sessions)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connect_starts_anonymous_with_fresh_storage() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("movieflix_bootstrap_{}", uuid::Uuid::new_v4()));
        let mut cfg = AppConfig::default();
        cfg.storage.session_path = dir.join("nested").join("session.json");

        let client = connect(&cfg).await?;
        assert!(!client.sessions.is_authenticated().await);
        assert!(tokio::fs::metadata(dir.join("nested")).await?.is_dir());
        assert!(client.favorites.favorites().await.is_empty());

        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
