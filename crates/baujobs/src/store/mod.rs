//! Persistence adapters. Every repository seam has an in-memory implementation
//! and a MongoDB implementation selected at startup.

pub mod codec;
pub mod memory;
pub mod mongo;

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Fresh document identifier, hex encoded so in-memory and MongoDB records look alike.
pub fn new_object_id() -> String {
    bson::oid::ObjectId::new().to_hex()
}
