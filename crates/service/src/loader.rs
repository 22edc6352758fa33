//! Offline corpus population: read a sentences file, embed each line, and
//! insert into the store. The query path never writes entries; this loader
//! is the only producer.

use std::path::Path;

use entry_store::{EntryStore, StoreError};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::embedder::{Embedder, EmbedderError};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),
    #[error("embedding unavailable: {0}")]
    Embedder(#[from] EmbedderError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub inserted: usize,
    pub skipped_duplicates: usize,
}

/// Load a sentences file (one sentence per line, blank lines ignored).
///
/// Sentences already present in the store are skipped and counted; any
/// other failure aborts the load. `on_progress` is called with
/// (processed, total) after each sentence.
pub async fn load_corpus(
    store: &EntryStore,
    embedder: &dyn Embedder,
    path: &Path,
    mut on_progress: impl FnMut(usize, usize),
) -> Result<LoadReport, LoadError> {
    let raw = fs::read_to_string(path).await?;
    let sentences: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let total = sentences.len();
    let mut report = LoadReport::default();
    for (i, text) in sentences.into_iter().enumerate() {
        let embedding = embedder.embed(text).await?;
        match store.insert(text, embedding) {
            Ok(id) => {
                report.inserted += 1;
                debug!(%id, "inserted sentence");
            }
            Err(StoreError::DuplicateEntry(id)) => {
                report.skipped_duplicates += 1;
                warn!(%id, "sentence already present; skipping");
            }
            Err(err) => return Err(err.into()),
        }
        on_progress(i + 1, total);
    }

    info!(
        inserted = report.inserted,
        skipped = report.skipped_duplicates,
        "corpus load complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedder::HashEmbedder;
    use tempfile::tempdir;

    #[tokio::test]
    async fn loads_sentences_and_skips_duplicates() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path().join("db.json")).unwrap();

        let corpus = dir.path().join("sentences.txt");
        std::fs::write(
            &corpus,
            "the water cycle\n\nphotosynthesis\nthe water cycle\n  \n",
        )
        .unwrap();

        let report = load_corpus(&store, &HashEmbedder, &corpus, |_, _| {})
            .await
            .unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped_duplicates, 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn progress_reports_every_sentence() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path().join("db.json")).unwrap();

        let corpus = dir.path().join("sentences.txt");
        std::fs::write(&corpus, "one\ntwo\nthree\n").unwrap();

        let mut seen = Vec::new();
        load_corpus(&store, &HashEmbedder, &corpus, |done, total| {
            seen.push((done, total));
        })
        .await
        .unwrap();

        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let store = EntryStore::open(dir.path().join("db.json")).unwrap();

        let err = load_corpus(&store, &HashEmbedder, &dir.path().join("nope.txt"), |_, _| {})
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
