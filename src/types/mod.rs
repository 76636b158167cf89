//! Shared types

pub mod error;

pub use error::{AvolveError, Result};
