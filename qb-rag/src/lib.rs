//! # qb-rag
//!
//! The ingestion-and-retrieval core of Query Bridge: ingest documents
//! (PDF files or wiki pages) into a searchable vector index, then answer
//! natural-language questions grounded in the indexed content.
//!
//! ## Overview
//!
//! Write path: document → extraction ([`extract`]) → chunking
//! ([`LineChunker`]) → embedding ([`EmbeddingProvider`]) → storage
//! ([`VectorStore`]). Read path: question + recent conversation window
//! ([`ConversationMemory`]) → [`Retriever`] (embed, search, threshold
//! filter) → [`AnswerComposer`] → [`LanguageModel`].
//!
//! [`RagPipeline`] wires the pieces together; capabilities are traits, so
//! backends plug in behind [`EmbeddingProvider`], [`VectorStore`], and
//! [`LanguageModel`]. Two store backends ship here:
//! [`InMemoryVectorStore`] for tests and [`JsonFileVectorStore`] for
//! durable single-process use.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use qb_rag::{
//!     ConversationMemory, Document, JsonFileVectorStore, LineChunker, RagConfig, RagPipeline,
//! };
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(embedder)
//!     .vector_store(Arc::new(JsonFileVectorStore::open("./qb_storage")?))
//!     .chunker(Arc::new(LineChunker::default()))
//!     .language_model(model)
//!     .build()?;
//!
//! pipeline.create_collection("documents").await?;
//! pipeline.ingest("documents", &Document::new("doc-1", extracted_text)).await?;
//!
//! let mut memory = ConversationMemory::new();
//! let answer = pipeline.ask("documents", "What is in the document?", &mut memory).await?;
//! ```
//!
//! ## Features
//!
//! - `gemini` — REST-backed [`gemini::GeminiEmbeddingProvider`] and
//!   [`gemini::GeminiLanguageModel`]
//! - `confluence` — [`WikiSpaceSource`] over the `qb-confluence` client

pub mod chunking;
pub mod composer;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod inmemory;
pub mod jsonfile;
pub mod memory;
pub mod pipeline;
pub mod retriever;
pub mod source;
pub mod vectorstore;

pub use chunking::{Chunker, LineChunker};
pub use composer::{AnswerComposer, LanguageModel, NO_MATCH_MESSAGE};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, DistanceMatch, Document};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use jsonfile::JsonFileVectorStore;
pub use memory::{ConversationMemory, ConversationTurn};
pub use pipeline::{IngestReport, RagPipeline, RagPipelineBuilder};
pub use retriever::{Retrieval, Retriever, ScoredChunk};
pub use source::{DocumentSource, IngestFailure, PdfFileSource, SourceBatch};
#[cfg(feature = "confluence")]
pub use source::WikiSpaceSource;
pub use vectorstore::VectorStore;
