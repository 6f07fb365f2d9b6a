use std::sync::Arc;

use futures_util::StreamExt;
use gateway::mock::{sample_movie, MockMovieApi};
use gateway::ErrorKind;
use models::{Credentials, FavoriteSet, ProfilePatch, Session};
use service::{Client, JsonRecordStore, SessionStore};

async fn client_with_file(path: &std::path::Path) -> anyhow::Result<(Arc<MockMovieApi>, Client<MockMovieApi, JsonRecordStore<Session>>)> {
    let api = Arc::new(MockMovieApi::with_movies([sample_movie("m42", "Arrival"), sample_movie("m7", "Se7en")]));
    api.add_user("alice", "pw", "alice@old.com");
    let sessions = SessionStore::open(Arc::clone(&api), JsonRecordStore::new(path)).await?;
    Ok((api, Client::new(Arc::new(sessions))))
}

fn session_path() -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("movieflix_flow_{}", uuid::Uuid::new_v4()))
        .join("session.json")
}

#[tokio::test]
async fn login_favorite_edit_deregister() -> anyhow::Result<()> {
    let path = session_path();
    let (api, client) = client_with_file(&path).await?;
    assert!(!client.sessions.is_authenticated().await);

    let session = client.sessions.login(&Credentials::new("alice", "pw")).await?;
    assert!(!session.token.is_empty());
    assert_eq!(session.profile.username, "alice");

    client.favorites.add_favorite("m42").await?;
    assert_eq!(client.favorites.favorites().await, FavoriteSet::from(["m42".to_string()]));

    let patch = ProfilePatch { email: Some("a@b.com".into()), ..ProfilePatch::default() };
    let session = client.sessions.update_profile(&patch).await?;
    assert_eq!(session.profile.email, "a@b.com");
    assert_eq!(client.favorites.favorites().await, FavoriteSet::from(["m42".to_string()]));

    // the record on disk matches memory
    let on_disk = JsonRecordStore::<Session>::new(&path).load().await?;
    assert_eq!(on_disk, Some(session));

    client.sessions.deregister().await?;
    assert!(!client.sessions.is_authenticated().await);
    assert!(JsonRecordStore::<Session>::new(&path).load().await?.is_none());
    assert!(api.profile("alice").is_none());

    if let Some(dir) = path.parent() {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
    Ok(())
}

#[tokio::test]
async fn session_survives_restart() -> anyhow::Result<()> {
    let path = session_path();
    let (api, client) = client_with_file(&path).await?;
    client.sessions.login(&Credentials::new("alice", "pw")).await?;
    client.favorites.toggle_favorite("m7").await?;
    drop(client);

    let sessions = SessionStore::open(Arc::clone(&api), JsonRecordStore::new(&path)).await?;
    let restored = Client::new(Arc::new(sessions));
    assert!(restored.favorites.is_favorite("m7").await);

    let movies: Vec<_> = restored.favorites.load_favorite_movies().await?.collect().await;
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0].1.as_ref().map(|m| m.title.as_str()).ok(), Some("Se7en"));

    restored.sessions.logout().await?;
    restored.sessions.logout().await?;
    assert!(!restored.sessions.is_authenticated().await);

    if let Some(dir) = path.parent() {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
    Ok(())
}

#[tokio::test]
async fn bad_credentials_do_not_touch_session() -> anyhow::Result<()> {
    let path = session_path();
    let (_api, client) = client_with_file(&path).await?;
    let err = client.sessions.login(&Credentials::new("alice", "nope")).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Auth);
    assert!(client.sessions.current_session().await.is_none());
    assert!(JsonRecordStore::<Session>::new(&path).load().await?.is_none());

    if let Some(dir) = path.parent() {
        let _ = tokio::fs::remove_dir_all(dir).await;
    }
    Ok(())
}
