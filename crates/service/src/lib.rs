//! Service support library for SemSearch: embedding collaborators, the
//! query coordinator, corpus bulk loading, and tracing bootstrap.

pub mod coordinator;
pub mod embedder;
pub mod loader;
mod logging;

pub use coordinator::{CoordinatorConfig, QueryCoordinator, SearchError};
pub use embedder::{Embedder, EmbedderError, HashEmbedder, HttpEmbedder};
pub use loader::{LoadError, LoadReport, load_corpus};
pub use logging::{init_tracing, init_tracing_with_config};
