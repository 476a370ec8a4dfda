//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A source document with extracted text content and metadata.
///
/// Documents are ephemeral: they exist only during ingestion and are not
/// persisted themselves. Only their [`Chunk`]s reach the vector store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The extracted, whitespace-normalized text of the document.
    pub text: String,
    /// Key-value metadata (title, space key, file name, ...).
    pub metadata: HashMap<String, String>,
    /// Opaque descriptor of the original source (file name, `space/title`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with the given id and text and no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), metadata: HashMap::new(), source_uri: None }
    }

    /// Attach a source descriptor.
    pub fn with_source_uri(mut self, uri: impl Into<String>) -> Self {
        self.source_uri = Some(uri.into());
        self
    }
}

/// A bounded segment of a [`Document`] paired with its vector embedding.
///
/// Chunk ids are assigned fresh at ingestion time (UUID v4) and are
/// immutable once stored. The chunk text is never empty; empty chunks are
/// dropped before storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: String,
    /// The text content of the chunk (non-empty).
    pub text: String,
    /// The vector embedding for this chunk's text.
    pub embedding: Vec<f32>,
    /// Opaque reference to the source document this chunk came from.
    pub source_ref: String,
}

/// A retrieved [`Chunk`] paired with its embedding distance to the query.
///
/// Lower distance means closer. Produced transiently per query, never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceMatch {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// Embedding distance to the query (ascending order = most relevant first).
    pub distance: f32,
}
