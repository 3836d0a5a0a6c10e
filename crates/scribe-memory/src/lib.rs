//! # scribe-memory
//!
//! Semantic memory for documentation runs.
//!
//! Writers commit what they learned about a file (`remember`) and later
//! invocations retrieve related context (`recall`) instead of re-reading whole
//! files. Content is split into overlapping chunks, embedded, and kept in an
//! in-process index for the lifetime of the store.
//!
//! The store is constructed explicitly by the process entry point and shared
//! through an `Arc`; it is safe to insert and search concurrently.

mod chunking;
mod embedding;
mod store;

pub use chunking::{TextChunk, TextSplitter};
pub use embedding::{cosine_similarity, Embedder, HashingEmbedder};
pub use store::{MemoryChunk, MemoryStore};
