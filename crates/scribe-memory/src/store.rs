//! Memory store - chunked, embedded, in-process similarity index

use crate::chunking::TextSplitter;
use crate::embedding::{cosine_similarity, Embedder, HashingEmbedder};
use scribe_core::{MemorySettings, Result, ScribeError};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::{debug, info};

/// A stored slice of remembered content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryChunk {
    pub text: String,
    /// Where the content came from (usually a project-relative file path)
    pub source_tag: String,
}

struct IndexedChunk {
    chunk: MemoryChunk,
    embedding: Vec<f32>,
}

/// Shared semantic memory
///
/// Chunks are appended and never mutated or removed. Embedding runs outside
/// the lock; the index itself is guarded by an `RwLock`, so callers never need
/// their own synchronization.
pub struct MemoryStore {
    splitter: TextSplitter,
    embedder: Box<dyn Embedder>,
    index: RwLock<Vec<IndexedChunk>>,
}

impl MemoryStore {
    pub fn new(splitter: TextSplitter, embedder: Box<dyn Embedder>) -> Self {
        info!(
            "Initializing memory store (chunk_size={}, overlap={}, dimension={})",
            splitter.chunk_size(),
            splitter.overlap(),
            embedder.dimension()
        );
        Self {
            splitter,
            embedder,
            index: RwLock::new(Vec::new()),
        }
    }

    /// Build a store with the hashing embedder from configuration
    pub fn from_settings(settings: &MemorySettings) -> Result<Self> {
        let splitter = TextSplitter::new(settings.chunk_size, settings.chunk_overlap)?;
        Ok(Self::new(
            splitter,
            Box::new(HashingEmbedder::new(settings.embedding_dimension)),
        ))
    }

    /// Split, embed and index `content`; returns the number of chunks added
    pub fn insert(&self, content: &str, source_tag: &str) -> Result<usize> {
        let texts: Vec<String> = self
            .splitter
            .split(content)
            .into_iter()
            .map(|c| c.text)
            .collect();

        if texts.is_empty() {
            debug!("Nothing to remember from '{}'", source_tag);
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(&texts)?;
        if embeddings.len() != texts.len() {
            return Err(ScribeError::Memory(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                texts.len()
            )));
        }

        let added = texts.len();
        let mut index = self
            .index
            .write()
            .map_err(|_| ScribeError::Memory("index lock poisoned".to_string()))?;
        index.extend(
            texts
                .into_iter()
                .zip(embeddings)
                .map(|(text, embedding)| IndexedChunk {
                    chunk: MemoryChunk {
                        text,
                        source_tag: source_tag.to_string(),
                    },
                    embedding,
                }),
        );

        info!("Added {} chunk(s) from '{}' to memory", added, source_tag);
        Ok(added)
    }

    /// Up to `k` chunks ranked by similarity to `query`, best first
    ///
    /// Equal scores keep insertion order.
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<MemoryChunk>> {
        debug!("Querying memory for: '{}'", query);

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query)?;
        let index = self
            .index
            .read()
            .map_err(|_| ScribeError::Memory("index lock poisoned".to_string()))?;

        let mut scored: Vec<(f32, usize)> = index
            .iter()
            .enumerate()
            .map(|(pos, entry)| (cosine_similarity(&query_embedding, &entry.embedding), pos))
            .collect();

        // Stable sort keeps insertion order among ties
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, pos)| index[pos].chunk.clone())
            .collect())
    }

    /// Number of stored chunks
    pub fn len(&self) -> usize {
        self.index.read().map(|index| index.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Distinct source tags, in the order they were first remembered
    pub fn sources(&self) -> Vec<String> {
        let Ok(index) = self.index.read() else {
            return Vec::new();
        };

        let mut sources: Vec<String> = Vec::new();
        for entry in index.iter() {
            if !sources.contains(&entry.chunk.source_tag) {
                sources.push(entry.chunk.source_tag.clone());
            }
        }
        sources
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(TextSplitter::default(), Box::new(HashingEmbedder::default()))
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("splitter", &self.splitter)
            .field("chunks", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    /// Embeds every text to the same vector, so all scores tie
    struct ConstantEmbedder;

    impl Embedder for ConstantEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    struct FailingEmbedder;

    impl Embedder for FailingEmbedder {
        fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(ScribeError::Memory("model unavailable".to_string()))
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_search_empty_store() {
        let store = MemoryStore::default();
        assert!(store.search("anything", 3).unwrap().is_empty());
    }

    #[test]
    fn test_insert_then_search_returns_source_tag() {
        let store = MemoryStore::default();
        let added = store
            .insert(
                "OrderService validates orders and publishes OrderCreated events",
                "src/OrderService.java",
            )
            .unwrap();
        assert_eq!(added, 1);

        let results = store.search("order service events", 3).unwrap();
        assert!(!results.is_empty());
        assert_eq!(results[0].source_tag, "src/OrderService.java");
    }

    #[test]
    fn test_search_ranks_by_similarity() {
        let store = MemoryStore::default();
        store
            .insert("Weather station collects rainfall readings", "weather.txt")
            .unwrap();
        store
            .insert("InvoiceRepository stores invoices in postgres", "Invoice.java")
            .unwrap();
        store
            .insert("Lighthouse keeper logs ships passing", "lighthouse.txt")
            .unwrap();

        let results = store.search("invoice repository", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source_tag, "Invoice.java");
    }

    #[test]
    fn test_search_respects_k() {
        let store = MemoryStore::default();
        for i in 0..5 {
            store
                .insert(&format!("note number {}", i), &format!("n{}", i))
                .unwrap();
        }
        assert_eq!(store.search("note", 3).unwrap().len(), 3);
        assert_eq!(store.search("note", 10).unwrap().len(), 5);
        assert!(store.search("note", 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let store = MemoryStore::new(TextSplitter::default(), Box::new(ConstantEmbedder));
        store.insert("first", "a").unwrap();
        store.insert("second", "b").unwrap();
        store.insert("third", "c").unwrap();

        let tags: Vec<String> = store
            .search("q", 3)
            .unwrap()
            .into_iter()
            .map(|c| c.source_tag)
            .collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_long_content_is_chunked_with_metadata() {
        let store = MemoryStore::new(TextSplitter::new(100, 10).unwrap(), Box::new(HashingEmbedder::default()));
        let content = "word ".repeat(50); // 250 chars
        let added = store.insert(&content, "Long.java").unwrap();

        assert_eq!(added, 3);
        assert_eq!(store.len(), 3);
        assert_eq!(store.sources(), vec!["Long.java".to_string()]);
    }

    #[test]
    fn test_empty_content_adds_nothing() {
        let store = MemoryStore::default();
        assert_eq!(store.insert("", "empty").unwrap(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_embedder_failure_propagates_and_leaves_index_untouched() {
        let store = MemoryStore::new(TextSplitter::default(), Box::new(FailingEmbedder));
        let result = store.insert("content", "a");
        assert!(matches!(result, Err(ScribeError::Memory(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_from_settings_rejects_bad_overlap() {
        let settings = MemorySettings {
            chunk_size: 100,
            chunk_overlap: 100,
            ..MemorySettings::default()
        };
        assert!(MemoryStore::from_settings(&settings).is_err());
    }

    #[test]
    fn test_sources_in_first_seen_order() {
        let store = MemoryStore::default();
        store.insert("one", "b.java").unwrap();
        store.insert("two", "a.java").unwrap();
        store.insert("three", "b.java").unwrap();
        assert_eq!(store.sources(), vec!["b.java".to_string(), "a.java".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_insert_and_search() {
        let store = Arc::new(MemoryStore::default());
        let mut handles = Vec::new();

        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::task::spawn_blocking(move || {
                store
                    .insert(&format!("component {} handles requests", i), &format!("c{}", i))
                    .unwrap();
                store.search("component requests", 3).unwrap();
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.len(), 8);
        assert_eq!(store.sources().len(), 8);
    }
}
