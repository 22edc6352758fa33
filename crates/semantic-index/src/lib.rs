//! Cosine-similarity ranking over the entry corpus.
//!
//! The shipped engine is an exhaustive linear scan, the right trade at demo
//! corpus scale. An ANN backend can replace `CosineRanker` behind the same
//! `Ranker` contract without touching any caller.

use core_types::{Entry, SearchHit};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RankError {
    #[error("top_k must be greater than zero")]
    InvalidTopK,
}

/// Rank entries against a query embedding, best first.
pub trait Ranker: Send + Sync {
    fn rank(&self, query: &[f32], entries: &[Entry], k: usize) -> Result<Vec<SearchHit>, RankError>;
}

/// Cosine similarity: dot product over the product of magnitudes.
///
/// Either vector having zero magnitude yields 0.0. The raw value is
/// returned unclamped.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Exhaustive-scan ranker.
#[derive(Debug, Default, Clone, Copy)]
pub struct CosineRanker;

impl Ranker for CosineRanker {
    fn rank(&self, query: &[f32], entries: &[Entry], k: usize) -> Result<Vec<SearchHit>, RankError> {
        if k == 0 {
            return Err(RankError::InvalidTopK);
        }

        let mut hits: Vec<SearchHit> = Vec::with_capacity(entries.len());
        for entry in entries {
            // Insert-time validation makes a mismatch unlikely; skip the
            // entry rather than fail the whole query if one slips through.
            if entry.embedding.len() != query.len() {
                debug!(id = %entry.id, len = entry.embedding.len(), "skipping entry with mismatched embedding length");
                continue;
            }
            hits.push(SearchHit {
                id: entry.id.clone(),
                text: entry.text.clone(),
                score: cosine_similarity(query, &entry.embedding),
            });
        }

        // Stable sort: equal scores keep insertion order, so results are
        // deterministic.
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(k);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::EntryId;

    fn entry(text: &str, embedding: Vec<f32>) -> Entry {
        Entry {
            id: EntryId::from_text(text),
            text: text.to_string(),
            embedding,
        }
    }

    #[test]
    fn cosine_of_identical_vectors_is_one() {
        let v = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_opposite_vectors_is_minus_one() {
        let got = cosine_similarity(&[1.0, 0.0, 0.0], &[-1.0, 0.0, 0.0]);
        assert!((got + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_norm_yields_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 1.0], &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn ranks_descending_with_insertion_order_tie_break() {
        let entries = vec![
            entry("a", vec![2.0, 0.0, 0.0]), // score 1.0
            entry("b", vec![1.0, 1.0, 0.0]), // score ~0.707
            entry("c", vec![1.0, 0.0, 0.0]), // score 1.0, ties with "a"
        ];

        let hits = CosineRanker.rank(&[1.0, 0.0, 0.0], &entries, 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "a");
        assert_eq!(hits[1].text, "c");
    }

    #[test]
    fn k_larger_than_corpus_returns_everything() {
        let entries = vec![
            entry("a", vec![1.0, 0.0]),
            entry("b", vec![0.0, 1.0]),
            entry("c", vec![1.0, 1.0]),
        ];
        let hits = CosineRanker.rank(&[1.0, 0.0], &entries, 100).unwrap();
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn zero_k_is_rejected() {
        assert_eq!(
            CosineRanker.rank(&[1.0, 0.0], &[], 0).unwrap_err(),
            RankError::InvalidTopK
        );
    }

    #[test]
    fn mismatched_dimension_entries_are_skipped() {
        let entries = vec![
            entry("ok", vec![1.0, 0.0, 0.0]),
            entry("short", vec![1.0, 0.0]),
            entry("also ok", vec![0.0, 1.0, 0.0]),
        ];
        let hits = CosineRanker.rank(&[1.0, 0.0, 0.0], &entries, 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits.iter().all(|h| h.text != "short"));
    }

    #[test]
    fn empty_corpus_yields_empty_result() {
        let hits = CosineRanker.rank(&[1.0, 0.0], &[], 5).unwrap();
        assert!(hits.is_empty());
    }
}
