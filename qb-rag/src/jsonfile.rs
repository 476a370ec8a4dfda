//! Durable vector store backed by one JSON file per collection.
//!
//! [`JsonFileVectorStore`] mirrors the in-memory store's semantics but
//! persists every collection under a root directory as `<name>.json`.
//! Reopening the same directory and collection name across process
//! restarts yields the same content. Files are rewritten in full and
//! renamed into place before [`add`](crate::VectorStore::add) returns, so
//! chunks are durably queryable once the call completes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::document::{Chunk, DistanceMatch};
use crate::error::{RagError, Result};
use crate::vectorstore::{VectorStore, cosine_distance};

/// On-disk representation of one collection.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedCollection {
    dimensions: usize,
    chunks: Vec<Chunk>,
}

#[derive(Debug)]
struct FileCollection {
    dimensions: usize,
    chunks: HashMap<String, Chunk>,
}

/// A file-backed vector store with exact nearest-neighbor search.
///
/// Collections load lazily on `create_collection` and live in memory for
/// the lifetime of the store; `add` flushes the whole collection back to
/// disk synchronously. Open one store per process and share it.
#[derive(Debug)]
pub struct JsonFileVectorStore {
    dir: PathBuf,
    collections: RwLock<HashMap<String, FileCollection>>,
}

fn backend_error(message: impl Into<String>) -> RagError {
    RagError::VectorStore { backend: "JsonFile".to_string(), message: message.into() }
}

fn missing(collection: &str) -> RagError {
    backend_error(format!("collection '{collection}' does not exist"))
}

impl JsonFileVectorStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)
            .map_err(|e| backend_error(format!("failed to create '{}': {e}", dir.display())))?;
        Ok(Self { dir, collections: RwLock::new(HashMap::new()) })
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    async fn flush(&self, name: &str, collection: &FileCollection) -> Result<()> {
        let mut chunks: Vec<Chunk> = collection.chunks.values().cloned().collect();
        chunks.sort_by(|a, b| a.id.cmp(&b.id));
        let persisted = PersistedCollection { dimensions: collection.dimensions, chunks };

        let bytes = serde_json::to_vec(&persisted)
            .map_err(|e| backend_error(format!("failed to serialize '{name}': {e}")))?;

        let path = self.collection_path(name);
        let tmp = self.dir.join(format!("{name}.json.tmp"));
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| backend_error(format!("failed to write '{}': {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| backend_error(format!("failed to replace '{}': {e}", path.display())))?;

        debug!(collection = name, chunks = persisted.chunks.len(), "flushed collection");
        Ok(())
    }
}

#[async_trait]
impl VectorStore for JsonFileVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(name) {
            return Ok(());
        }

        let path = self.collection_path(name);
        let collection = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let persisted: PersistedCollection = serde_json::from_slice(&bytes)
                    .map_err(|e| backend_error(format!("corrupt collection file '{}': {e}", path.display())))?;
                let chunks =
                    persisted.chunks.into_iter().map(|c| (c.id.clone(), c)).collect::<HashMap<_, _>>();
                debug!(collection = name, chunks = chunks.len(), "loaded collection from disk");
                FileCollection { dimensions: persisted.dimensions, chunks }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                FileCollection { dimensions, chunks: HashMap::new() }
            }
            Err(e) => {
                return Err(backend_error(format!("failed to read '{}': {e}", path.display())));
            }
        };

        collections.insert(name.to_string(), collection);
        Ok(())
    }

    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        for chunk in chunks {
            if chunk.embedding.len() != store.dimensions {
                return Err(backend_error(format!(
                    "chunk '{}' has embedding dimension {} but collection '{collection}' expects {}",
                    chunk.id,
                    chunk.embedding.len(),
                    store.dimensions
                )));
            }
            store.chunks.insert(chunk.id.clone(), chunk.clone());
        }
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        self.flush(collection, store).await
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
