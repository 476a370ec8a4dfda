//! Vector store trait for persisting chunks and searching by embedding.

use async_trait::async_trait;

use crate::document::{Chunk, DistanceMatch};
use crate::error::Result;

/// A storage backend for chunks with nearest-neighbor search.
///
/// Collections are named; reopening a durable backend with the same name
/// yields the same content across process restarts. The store is
/// append-only from the pipeline's perspective: chunks are added with
/// caller-assigned ids and never updated or deleted. Two chunks with
/// different ids and identical text are stored as distinct entries.
///
/// # Example
///
/// ```rust,ignore
/// use qb_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("docs", 384).await?;
/// store.add("docs", &chunks).await?;
/// let matches = store.search("docs", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection with the given embedding dimension.
    /// No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Add chunks to a collection.
    ///
    /// Each chunk must carry a fresh unique id and an embedding matching the
    /// collection dimension. Chunks are durably queryable when this returns.
    async fn add(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `top_k` nearest chunks to the given embedding.
    ///
    /// Returns matches ordered by ascending distance (closest first).
    /// Fewer than `top_k` results are returned only when the collection
    /// holds fewer than `top_k` chunks.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
    ) -> Result<Vec<DistanceMatch>>;

    /// Return the number of chunks stored in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;
}

/// Compute cosine distance (`1 − cosine similarity`) between two vectors.
///
/// Both vectors are L2-normalized before computing the dot product, so the
/// result lies in `[0, 2]`. Returns 1.0 (orthogonal) if either vector has
/// zero magnitude.
pub(crate) fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_vectors_have_zero_distance() {
        let v = [0.5f32, -0.25, 1.0];
        assert!(cosine_distance(&v, &v).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_have_distance_two() {
        let a = [1.0f32, 0.0];
        let b = [-1.0f32, 0.0];
        assert!((cosine_distance(&a, &b) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_is_treated_as_orthogonal() {
        let a = [0.0f32, 0.0];
        let b = [1.0f32, 0.0];
        assert!((cosine_distance(&a, &b) - 1.0).abs() < 1e-6);
    }
}
