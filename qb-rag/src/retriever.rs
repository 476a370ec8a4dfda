//! Query-time retrieval: augment, embed, search, filter.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::RagConfig;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::memory::ConversationMemory;
use crate::vectorstore::VectorStore;

/// A retrieved chunk text with its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    /// The chunk text, in retrieval order.
    pub text: String,
    /// Similarity score (`1 − distance`), higher is closer.
    pub similarity: f32,
}

/// The outcome of a retrieval pass.
///
/// Zero qualifying chunks is not an error and not an empty list: it is the
/// [`NoMatch`](Retrieval::NoMatch) sentinel, which the answer composer turns
/// into a fixed message without invoking the language model.
#[derive(Debug, Clone, PartialEq)]
pub enum Retrieval {
    /// Chunks that passed the similarity filter, most similar first.
    Grounded(Vec<ScoredChunk>),
    /// No chunk qualified.
    NoMatch,
}

/// Embeds an augmented query and retrieves qualifying chunks from the store.
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    top_k: usize,
    similarity_threshold: f32,
    memory_window: usize,
}

impl Retriever {
    /// Create a retriever over the given capabilities and configuration.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        config: &RagConfig,
    ) -> Self {
        Self {
            embedding_provider,
            vector_store,
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
            memory_window: config.memory_window,
        }
    }

    /// Render the augmented query: the last configured window of
    /// conversation turns (oldest first) as `User:`/`Assistant:` lines,
    /// the new question, then a trailing assistant-turn marker.
    pub fn augmented_query(&self, question: &str, memory: &ConversationMemory) -> String {
        let mut query = String::new();
        for turn in memory.recent(self.memory_window) {
            query.push_str("User: ");
            query.push_str(&turn.user);
            query.push_str("\nAssistant: ");
            query.push_str(&turn.assistant);
            query.push('\n');
        }
        query.push_str("User: ");
        query.push_str(question);
        query.push_str("\nAssistant:");
        query
    }

    /// Embed the augmented query, search the store, and filter by the
    /// similarity threshold.
    ///
    /// # Errors
    ///
    /// Surfaces embedding and store failures as-is; an empty result set is
    /// never an error (see [`Retrieval::NoMatch`]).
    pub async fn retrieve(&self, collection: &str, augmented_query: &str) -> Result<Retrieval> {
        let query_embedding =
            self.embedding_provider.embed(augmented_query).await.map_err(|e| {
                RagError::Pipeline(format!("query embedding failed: {e}"))
            })?;

        let matches =
            self.vector_store.search(collection, &query_embedding, self.top_k).await.map_err(
                |e| RagError::Pipeline(format!("search failed in collection '{collection}': {e}")),
            )?;

        let candidates = matches.len();
        let qualifying: Vec<ScoredChunk> = matches
            .into_iter()
            .map(|m| ScoredChunk { text: m.chunk.text, similarity: 1.0 - m.distance })
            .filter(|scored| scored.similarity >= self.similarity_threshold)
            .collect();

        debug!(candidates, qualifying = qualifying.len(), "filtered retrieval results");

        if qualifying.is_empty() {
            info!(collection, "no chunk passed the similarity threshold");
            Ok(Retrieval::NoMatch)
        } else {
            Ok(Retrieval::Grounded(qualifying))
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::document::{Chunk, DistanceMatch};

    struct FixedEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0, 0.0])
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    /// A store that replays canned distances regardless of the query.
    struct FixedStore {
        distances: Vec<f32>,
    }

    #[async_trait]
    impl VectorStore for FixedStore {
        async fn create_collection(&self, _name: &str, _dimensions: usize) -> Result<()> {
            Ok(())
        }

        async fn add(&self, _collection: &str, _chunks: &[Chunk]) -> Result<()> {
            Ok(())
        }

        async fn search(
            &self,
            _collection: &str,
            _embedding: &[f32],
            top_k: usize,
        ) -> Result<Vec<DistanceMatch>> {
            Ok(self
                .distances
                .iter()
                .take(top_k)
                .enumerate()
                .map(|(i, &distance)| DistanceMatch {
                    chunk: Chunk {
                        id: format!("c{i}"),
                        text: format!("chunk {i}"),
                        embedding: vec![1.0, 0.0],
                        source_ref: "test".into(),
                    },
                    distance,
                })
                .collect())
        }

        async fn count(&self, _collection: &str) -> Result<usize> {
            Ok(self.distances.len())
        }
    }

    fn retriever_with(distances: Vec<f32>, threshold: f32) -> Retriever {
        let config = RagConfig { similarity_threshold: threshold, ..RagConfig::default() };
        Retriever::new(Arc::new(FixedEmbedder), Arc::new(FixedStore { distances }), &config)
    }

    #[tokio::test]
    async fn permissive_threshold_keeps_only_results_above_it() {
        // distances [0.2, 1.6] → similarities [0.8, -0.6]
        let retriever = retriever_with(vec![0.2, 1.6], -0.5);
        let retrieval = retriever.retrieve("docs", "q").await.unwrap();
        match retrieval {
            Retrieval::Grounded(chunks) => {
                assert_eq!(chunks.len(), 1);
                assert!((chunks[0].similarity - 0.8).abs() < 1e-6);
            }
            Retrieval::NoMatch => panic!("expected one qualifying chunk"),
        }
    }

    #[tokio::test]
    async fn all_results_below_threshold_yield_the_sentinel() {
        // similarities [-0.55, -0.6], both below -0.5
        let retriever = retriever_with(vec![1.55, 1.6], -0.5);
        assert_eq!(retriever.retrieve("docs", "q").await.unwrap(), Retrieval::NoMatch);
    }

    #[tokio::test]
    async fn default_threshold_requires_non_negative_similarity() {
        let retriever = retriever_with(vec![1.1], 0.0);
        assert_eq!(retriever.retrieve("docs", "q").await.unwrap(), Retrieval::NoMatch);
    }

    #[tokio::test]
    async fn empty_store_yields_the_sentinel() {
        let retriever = retriever_with(Vec::new(), 0.0);
        assert_eq!(retriever.retrieve("docs", "q").await.unwrap(), Retrieval::NoMatch);
    }

    #[test]
    fn augmented_query_renders_the_recent_window_and_marker() {
        let retriever = retriever_with(Vec::new(), 0.0);
        let mut memory = ConversationMemory::new();
        memory.append("first q", "first a");
        memory.append("second q", "second a");

        let query = retriever.augmented_query("third q", &memory);
        assert_eq!(
            query,
            "User: first q\nAssistant: first a\n\
             User: second q\nAssistant: second a\n\
             User: third q\nAssistant:"
        );
    }

    #[test]
    fn augmented_query_windows_long_histories() {
        let retriever = retriever_with(Vec::new(), 0.0);
        let mut memory = ConversationMemory::new();
        for i in 0..5 {
            memory.append(format!("q{i}"), format!("a{i}"));
        }

        let query = retriever.augmented_query("now", &memory);
        // Default window of 3: turns 2, 3, 4 only.
        assert!(!query.contains("q1"));
        assert!(query.starts_with("User: q2\n"));
        assert!(query.ends_with("User: now\nAssistant:"));
    }

    #[test]
    fn augmented_query_with_no_history_is_just_the_question() {
        let retriever = retriever_with(Vec::new(), 0.0);
        let memory = ConversationMemory::new();
        assert_eq!(retriever.augmented_query("hi", &memory), "User: hi\nAssistant:");
    }
}
