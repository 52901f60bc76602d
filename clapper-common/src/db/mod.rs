//! Database models and queries
//!
//! Every query is keyed first by tenant id; no function reads or writes
//! rows belonging to another tenant.

pub mod init;
pub mod migrations;
pub mod models;
pub mod reviews;
pub mod selections;
pub mod suggestions;
pub mod tenant_config;

pub use init::*;
pub use migrations::run_migrations;
pub use models::*;
