//! # Clapper Common Library
//!
//! Shared code for the clapper movie-night bot:
//! - Database models, migrations and queries
//! - Error type
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
