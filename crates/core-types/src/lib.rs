//! Core identifiers and shared lightweight types for SemSearch.
//!
//! These types intentionally avoid heavy dependencies and aim to be
//! serialization-friendly for the persisted corpus and API payloads.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Embedding dimensionality produced by the corpus model.
pub const EMBEDDING_DIM: usize = 768;

/// Content-derived identifier: lowercase-hex SHA-256 of the entry text.
///
/// Identical text hashes to the identical id by design; the digest doubles
/// as the store's uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(String);

impl EntryId {
    /// Derive the identifier for a piece of text.
    pub fn from_text(text: &str) -> Self {
        EntryId(hex::encode(Sha256::digest(text.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One (id, text, embedding) record in the store.
///
/// Entries are immutable once inserted; there is no update or delete, only
/// a full reload of the persisted corpus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A query as handed over by the API layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub id: Uuid,
    pub query: String,
    pub top_k: u32,
    pub use_cache: bool,
}

/// One scored hit; hits are ordered by descending score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: EntryId,
    pub text: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub id: Uuid,
    pub hits: Vec<SearchHit>,
    pub cache_hit: bool,
    pub took_ms: u32,
}

pub mod config;
