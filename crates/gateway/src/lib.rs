//! Remote data gateway for the movie API.
//!
//! [`MovieApi`] is the seam every other layer talks to. [`HttpGateway`]
//! implements it over reqwest, attaching the bearer token and normalizing
//! every failure into an [`ApiError`]. [`mock::MockMovieApi`] is an in-memory
//! stand-in with the same contract.

pub mod api;
pub mod error;
pub mod http;
pub mod mock;
pub mod observability;
pub mod routes;

pub use api::MovieApi;
pub use error::{ApiError, ErrorKind};
pub use http::HttpGateway;
