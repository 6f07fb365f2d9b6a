//! Shared runtime helpers for the movieflix workspace: logging bootstrap and
//! environment preparation used by the CLI and the test harnesses.

pub mod env;
pub mod utils;
