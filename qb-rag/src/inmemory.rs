//! In-memory vector store using cosine distance.
//!
//! [`InMemoryVectorStore`] keeps collections in a `HashMap` behind a
//! `tokio::sync::RwLock`. Nothing is persisted; it is meant for tests and
//! single-session use.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{Chunk, DistanceMatch};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, cosine_distance};

#[derive(Debug, Default)]
struct MemCollection {
    dimensions: usize,
    chunks: HashMap<String, Chunk>,
}

/// An in-memory vector store with exact nearest-neighbor search.
///
/// Writes take the lock exclusively (single-writer); searches share it.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, MemCollection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::VectorStore {
        backend: "InMemory".to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(name.to_string())
            .or_insert_with(|| MemCollection { dimensions, chunks: HashMap::new() });
        Ok(())
    }

    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for chunk in chunks {
            if chunk.embedding.len() != store.dimensions {
                return Err(RagError::VectorStore {
                    backend: "InMemory".to_string(),
                    message: format!(
                        "chunk '{}' has embedding dimension {} but collection '{collection}' expects {}",
                        chunk.id,
                        chunk.embedding.len(),
                        store.dimensions
                    ),
                });
            }
            store.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<DistanceMatch>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut matches: Vec<DistanceMatch> = store
            .chunks
            .values()
            .map(|chunk| DistanceMatch {
                chunk: chunk.clone(),
                distance: cosine_distance(&chunk.embedding, embedding),
            })
            .collect();

        matches
            .sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(store.chunks.len())
    }
}
