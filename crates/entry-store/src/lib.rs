//! Persistent, validated collection of (id, text, embedding) entries.
//!
//! The store favors correctness over write throughput: an insert validates,
//! persists the whole collection, and only then publishes a new snapshot to
//! readers. Readers work on immutable snapshots and never observe a
//! partially applied insert. Appropriate while the corpus stays small and
//! inserts are rare relative to queries.

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use core_types::{EMBEDDING_DIM, Entry, EntryId};
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("entry already exists: {0}")]
    DuplicateEntry(EntryId),
    #[error("embedding dimension mismatch: expected {expected}, got {got}")]
    InvalidDimension { expected: usize, got: usize },
    #[error("entry text must not be empty")]
    EmptyText,
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug)]
struct Inner {
    snapshot: Arc<[Entry]>,
    ids: HashSet<EntryId>,
}

/// Durable store of corpus entries, keyed by content-derived id.
#[derive(Debug)]
pub struct EntryStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl EntryStore {
    /// Open the store, loading the persisted corpus if present.
    ///
    /// A missing file is a first run and yields an empty store; an
    /// unreadable or corrupt file is fatal.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let entries: Vec<Entry> = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                StoreError::Persistence(format!("corrupt corpus file {}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StoreError::Io(e)),
        };

        let ids = entries.iter().map(|e| e.id.clone()).collect();
        info!(path = %path.display(), entries = entries.len(), "opened entry store");
        Ok(Self {
            path,
            inner: RwLock::new(Inner {
                snapshot: entries.into(),
                ids,
            }),
        })
    }

    /// Validate and append a new entry, persisting before acknowledging.
    ///
    /// The duplicate check is correctness-critical: the content hash is the
    /// sole uniqueness guard. On any failure memory and disk are left
    /// exactly as they were.
    pub fn insert(&self, text: &str, embedding: Vec<f32>) -> Result<EntryId, StoreError> {
        if text.trim().is_empty() {
            return Err(StoreError::EmptyText);
        }
        if embedding.len() != EMBEDDING_DIM {
            return Err(StoreError::InvalidDimension {
                expected: EMBEDDING_DIM,
                got: embedding.len(),
            });
        }

        let id = EntryId::from_text(text);
        let mut inner = self.inner.write();
        if inner.ids.contains(&id) {
            return Err(StoreError::DuplicateEntry(id));
        }

        let mut next: Vec<Entry> = inner.snapshot.to_vec();
        next.push(Entry {
            id: id.clone(),
            text: text.to_string(),
            embedding,
        });
        // Persist before the entry becomes visible to readers; a failed
        // write leaves the previous snapshot in place on both sides.
        self.persist(&next)?;

        inner.ids.insert(id.clone());
        inner.snapshot = next.into();
        debug!(%id, entries = inner.snapshot.len(), "inserted entry");
        Ok(id)
    }

    /// Point-in-time snapshot of all entries, in insertion order.
    pub fn all(&self) -> Arc<[Entry]> {
        self.inner.read().snapshot.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // Whole-collection rewrite: serialize to a sibling temp file and rename
    // into place so a failed write never clobbers the previous corpus.
    fn persist(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| StoreError::Persistence(format!("serialize corpus: {e}")))?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, &json)
            .map_err(|e| StoreError::Persistence(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            StoreError::Persistence(format!(
                "rename {} -> {}: {e}",
                tmp.display(),
                self.path.display()
            ))
        })?;
        Ok(())
    }
}
