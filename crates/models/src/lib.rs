//! Typed records exchanged with the movie API and persisted by the client.
//! - `movie`: catalog entries (read-only on the client)
//! - `user`: profile, credentials, registration and patch inputs with validation
//! - `session`: the single canonical `{token, profile}` record

pub mod errors;
pub mod movie;
pub mod session;
pub mod user;

pub use errors::ModelError;
pub use movie::{Director, Genre, Movie, MovieId};
pub use session::{LoginResponse, Session};
pub use user::{Credentials, FavoriteSet, Profile, ProfilePatch, Registration};
