//! Embedding collaborators.
//!
//! The model that turns text into a vector is external to this system and
//! consumed as an opaque function behind the `Embedder` trait.

use std::time::Duration;

use async_trait::async_trait;
use core_types::EMBEDDING_DIM;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbedderError {
    #[error("embedding request failed: {0}")]
    Network(String),
    #[error("embedding request timed out")]
    Timeout,
    #[error("embedding service returned a bad response: {0}")]
    BadResponse(String),
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a piece of text into the corpus vector space.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError>;

    /// Dimensionality of produced vectors.
    fn dim(&self) -> usize {
        EMBEDDING_DIM
    }
}

/// Deterministic local embedder for demos and tests.
///
/// Stretches the SHA-256 digest of the text across the vector by repeated
/// re-hashing, so identical text always maps to the identical vector. The
/// vectors carry no semantics.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let mut block: [u8; 32] = Sha256::digest(text.as_bytes()).into();
        let mut out = Vec::with_capacity(EMBEDDING_DIM);
        while out.len() < EMBEDDING_DIM {
            for byte in block {
                if out.len() == EMBEDDING_DIM {
                    break;
                }
                out.push((f32::from(byte) / 255.0) * 2.0 - 1.0);
            }
            block = Sha256::digest(block).into();
        }
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

/// Client for an external embedding service.
///
/// Expects a JSON endpoint taking `{ "text": ... }` and returning
/// `{ "embedding": [...] }`. The per-request timeout lives on the client;
/// retry policy is the coordinator's concern.
pub struct HttpEmbedder {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpEmbedder {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, EmbedderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EmbedderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbedderError::Timeout
                } else {
                    EmbedderError::Network(e.to_string())
                }
            })?
            .error_for_status()
            .map_err(|e| EmbedderError::Network(e.to_string()))?;

        let body: EmbedResponse = resp
            .json()
            .await
            .map_err(|e| EmbedderError::BadResponse(e.to_string()))?;
        if body.embedding.len() != EMBEDDING_DIM {
            return Err(EmbedderError::BadResponse(format!(
                "expected {EMBEDDING_DIM}-dim embedding, got {}",
                body.embedding.len()
            )));
        }
        Ok(body.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_embedder_is_deterministic() {
        let a = HashEmbedder.embed("photosynthesis").await.unwrap();
        let b = HashEmbedder.embed("photosynthesis").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn hash_embedder_produces_corpus_dimension() {
        let v = HashEmbedder.embed("anything").await.unwrap();
        assert_eq!(v.len(), EMBEDDING_DIM);
        assert_eq!(HashEmbedder.dim(), EMBEDDING_DIM);
        assert!(v.iter().all(|x| (-1.0..=1.0).contains(x)));
    }

    #[tokio::test]
    async fn different_texts_differ() {
        let a = HashEmbedder.embed("water cycle").await.unwrap();
        let b = HashEmbedder.embed("plate tectonics").await.unwrap();
        assert_ne!(a, b);
    }
}
