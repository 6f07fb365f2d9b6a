//! Client-side session and favorites state on top of the movie API.
//! - `session_store`: the single owner of `{token, profile}` and its persistence
//! - `favorites`: optimistic favorite toggles reconciled against server replies
//! - `catalog`: read-only movie, director and genre lookups
//! - `storage`: the persisted session record

pub mod bootstrap;
pub mod catalog;
pub mod errors;
pub mod events;
pub mod favorites;
pub mod session_store;
pub mod storage;

pub use bootstrap::{connect, Client, HttpClient};
pub use catalog::Catalog;
pub use errors::{FavoriteError, SessionError, StorageError};
pub use events::SessionEvent;
pub use favorites::{FavoriteMovie, FavoritesReconciler, PendingChange};
pub use session_store::SessionStore;
pub use storage::{JsonRecordStore, MemorySessionStorage, SessionStorage};
