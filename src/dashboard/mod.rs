//! Read-only dashboard over the anomaly log.

pub mod cache;
pub mod filter;
pub mod render;
pub mod server;
pub mod summary;
