//! Pipeline orchestrator.
//!
//! [`RagPipeline`] coordinates the full ingest-and-ask workflow by
//! composing an [`EmbeddingProvider`], a [`VectorStore`], a [`Chunker`],
//! and a [`LanguageModel`].
//!
//! # Example
//!
//! ```rust,ignore
//! use qb_rag::{RagPipeline, RagConfig, InMemoryVectorStore, LineChunker};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(LineChunker::default()))
//!     .language_model(Arc::new(my_model))
//!     .build()?;
//!
//! pipeline.create_collection("docs").await?;
//! pipeline.ingest("docs", &document).await?;
//! let answer = pipeline.ask("docs", "What does the document say?", &mut memory).await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::chunking::Chunker;
use crate::composer::{AnswerComposer, LanguageModel};
use crate::config::RagConfig;
use crate::document::{Chunk, Document};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::memory::ConversationMemory;
use crate::retriever::Retriever;
use crate::source::DocumentSource;
use crate::vectorstore::VectorStore;

/// Summary of one batch ingestion run.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Documents whose chunks reached the store.
    pub documents_ingested: usize,
    /// Total chunks stored across all documents.
    pub chunks_stored: usize,
    /// Per-item failures, none of which aborted the batch.
    pub failures: Vec<crate::source::IngestFailure>,
}

/// The ingestion and question-answering orchestrator.
///
/// Construct one via [`RagPipeline::builder()`] at process start and share
/// it; the embedding provider, store handle, and model client it holds are
/// expensive and meant to live for the lifetime of the process.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Build the retriever backed by this pipeline's capabilities.
    pub fn retriever(&self) -> Retriever {
        Retriever::new(self.embedding_provider.clone(), self.vector_store.clone(), &self.config)
    }

    /// Create a named collection in the vector store, sized to the
    /// embedding provider's output dimension.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] if the vector store operation fails.
    pub async fn create_collection(&self, name: &str) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(name, dimensions).await.map_err(|e| {
            error!(collection = name, error = %e, "failed to create collection");
            RagError::Pipeline(format!("failed to create collection '{name}': {e}"))
        })
    }

    /// Ingest a single document: chunk → drop empties → assign ids →
    /// embed → store.
    ///
    /// Returns the chunks that were stored, each with a fresh UUID id and
    /// its embedding attached. A document with no usable text yields zero
    /// chunks, which is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] if embedding or storage fails,
    /// naming the document in the message.
    pub async fn ingest(&self, collection: &str, document: &Document) -> Result<Vec<Chunk>> {
        let source_ref =
            document.source_uri.clone().unwrap_or_else(|| document.id.clone());

        let texts: Vec<String> = self
            .chunker
            .chunk(&document.text)
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .collect();

        if texts.is_empty() {
            info!(document.id = %document.id, chunk_count = 0, "ingested document (empty)");
            return Ok(Vec::new());
        }

        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = self.embedding_provider.embed_batch(&text_refs).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
            RagError::Pipeline(format!("embedding failed for document '{}': {e}", document.id))
        })?;

        let chunks: Vec<Chunk> = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| Chunk {
                id: Uuid::new_v4().to_string(),
                text,
                embedding,
                source_ref: source_ref.clone(),
            })
            .collect();

        self.vector_store.add(collection, &chunks).await.map_err(|e| {
            error!(document.id = %document.id, error = %e, "store add failed during ingestion");
            RagError::Pipeline(format!("store add failed for document '{}': {e}", document.id))
        })?;

        info!(document.id = %document.id, chunk_count = chunks.len(), "ingested document");
        Ok(chunks)
    }

    /// Ingest everything a source yields, sequentially.
    ///
    /// Failures — whether from loading the source's items or from
    /// ingesting an individual document — are collected in the report and
    /// never abort sibling documents.
    ///
    /// # Errors
    ///
    /// Fails only when the source as a whole is unreachable.
    pub async fn ingest_source(
        &self,
        collection: &str,
        source: &dyn DocumentSource,
    ) -> Result<IngestReport> {
        info!(source = %source.describe(), collection, "ingesting source");
        let batch = source.load().await?;

        let mut report = IngestReport { failures: batch.failures, ..IngestReport::default() };
        for document in &batch.documents {
            match self.ingest(collection, document).await {
                Ok(chunks) => {
                    report.documents_ingested += 1;
                    report.chunks_stored += chunks.len();
                }
                Err(e) => {
                    let item = document.source_uri.clone().unwrap_or_else(|| document.id.clone());
                    error!(item = %item, error = %e, "document ingestion failed");
                    report
                        .failures
                        .push(crate::source::IngestFailure { item, reason: e.to_string() });
                }
            }
        }

        info!(
            source = %source.describe(),
            ingested = report.documents_ingested,
            chunks = report.chunks_stored,
            failed = report.failures.len(),
            "source ingestion finished"
        );
        Ok(report)
    }

    /// Answer one user turn: retrieve → compose → record the turn.
    ///
    /// Always yields either a grounded answer or the fixed
    /// no-relevant-information message; retrieval filtering is never
    /// surfaced as a raw failure. The completed turn is appended to
    /// `memory`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] when the pipeline was built without a
    /// language model, and surfaces embedding/store/model failures as-is.
    pub async fn ask(
        &self,
        collection: &str,
        question: &str,
        memory: &mut ConversationMemory,
    ) -> Result<String> {
        let model = self.language_model.clone().ok_or_else(|| {
            RagError::Config("pipeline was built without a language model".to_string())
        })?;

        let retriever = self.retriever();
        let augmented_query = retriever.augmented_query(question, memory);
        let retrieval = retriever.retrieve(collection, &augmented_query).await?;

        let composer = AnswerComposer::new(model);
        let answer = composer.compose(&retrieval, &augmented_query).await?;

        memory.append(question, answer.clone());
        info!(turns = memory.len(), "answered user turn");
        Ok(answer)
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// The language model is optional; a pipeline without one can ingest and
/// retrieve but not [`ask`](RagPipeline::ask).
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the text chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the language model used to compose answers.
    pub fn language_model(mut self, model: Arc<dyn LanguageModel>) -> Self {
        self.language_model = Some(model);
        self
    }

    /// Build the [`RagPipeline`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            chunker,
            language_model: self.language_model,
        })
    }
}
