//! API handlers
//!
//! Author: Lore Contributors

pub mod documents;
pub mod health;
pub mod ingest;
pub mod query;
