/// Durable local snapshot slot.
pub mod local_store;
/// Scoreboard data model shared across layers.
pub mod models;
/// Client for the remote authoritative row store.
pub mod remote_store;
/// Error types for local persistence.
pub mod storage;
