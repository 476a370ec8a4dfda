//! End-to-end pipeline tests over the in-memory store with deterministic
//! test capabilities standing in for the embedding and model backends.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use qb_rag::{
    Chunker, ConversationMemory, Document, DocumentSource, EmbeddingProvider, InMemoryVectorStore,
    IngestFailure, LanguageModel, LineChunker, NO_MATCH_MESSAGE, RagConfig, RagPipeline, Result,
    SourceBatch, VectorStore,
};

const DIM: usize = 8;

/// Deterministic embedder: folds byte values into a fixed-dimension vector.
struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut v = vec![0.0f32; DIM];
        for (i, b) in text.bytes().enumerate() {
            v[i % DIM] += f32::from(b) / 255.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Echoes a marker and counts invocations.
struct EchoModel {
    calls: AtomicUsize,
}

impl EchoModel {
    fn new() -> Arc<Self> {
        Arc::new(Self { calls: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("generated from {} chars", prompt.len()))
    }
}

fn pipeline_with(config: RagConfig, model: Arc<EchoModel>) -> RagPipeline {
    RagPipeline::builder()
        .config(config.clone())
        .embedding_provider(Arc::new(HashEmbedder))
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .chunker(Arc::new(LineChunker::new(config.chunk_size, config.chunk_overlap)))
        .language_model(model)
        .build()
        .unwrap()
}

#[tokio::test]
async fn ingest_then_retrieve_near_the_average_embedding() {
    let config = RagConfig::builder().chunk_size(20).chunk_overlap(5).build().unwrap();
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(HashEmbedder))
        .vector_store(store.clone())
        .chunker(Arc::new(LineChunker::new(20, 5)))
        .build()
        .unwrap();
    pipeline.create_collection("docs").await.unwrap();

    let document = Document::new("doc-1", "Alpha line.\nBeta line.\nGamma line.");
    let chunks = pipeline.ingest("docs", &document).await.unwrap();

    // Multiple overlapping chunks, none exceeding the bound, all with
    // distinct ids.
    assert!(chunks.len() > 1);
    for chunk in &chunks {
        assert!(chunk.text.chars().count() <= 20);
        assert!(!chunk.text.trim().is_empty());
        assert_eq!(chunk.embedding.len(), DIM);
    }
    let ids: HashSet<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids.len(), chunks.len());

    // A query at the document's average embedding finds every chunk.
    let mut average = vec![0.0f32; DIM];
    for chunk in &chunks {
        for (slot, value) in average.iter_mut().zip(&chunk.embedding) {
            *slot += value / chunks.len() as f32;
        }
    }
    let matches = store.search("docs", &average, 5).await.unwrap();
    assert_eq!(matches.len(), chunks.len());
    let retrieved: HashSet<&str> = matches.iter().map(|m| m.chunk.id.as_str()).collect();
    assert_eq!(retrieved, ids);
}

#[tokio::test]
async fn store_round_trip_returns_the_chunk_itself_first() {
    let config = RagConfig::builder().chunk_size(20).chunk_overlap(5).build().unwrap();
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(HashEmbedder))
        .vector_store(store.clone())
        .chunker(Arc::new(LineChunker::new(20, 5)))
        .build()
        .unwrap();
    pipeline.create_collection("docs").await.unwrap();

    let chunks = pipeline
        .ingest("docs", &Document::new("doc-1", "Alpha line.\nBeta line.\nGamma line."))
        .await
        .unwrap();

    let first = &chunks[0];
    let matches = store.search("docs", &first.embedding, 5).await.unwrap();
    assert_eq!(matches[0].chunk.text, first.text);
    assert!(matches[0].distance.abs() < 1e-5);
    assert_eq!(matches.len(), chunks.len().min(5));
}

#[tokio::test]
async fn asking_records_the_turn_in_memory() {
    let config = RagConfig::builder().chunk_size(50).chunk_overlap(10).build().unwrap();
    let model = EchoModel::new();
    let pipeline = pipeline_with(config, model.clone());
    pipeline.create_collection("docs").await.unwrap();
    pipeline.ingest("docs", &Document::new("doc-1", "The sky is blue.")).await.unwrap();

    let mut memory = ConversationMemory::new();
    let answer = pipeline.ask("docs", "What color is the sky?", &mut memory).await.unwrap();

    assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    assert_eq!(memory.len(), 1);
    assert_eq!(memory.recent(1)[0].user, "What color is the sky?");
    assert_eq!(memory.recent(1)[0].assistant, answer);
}

#[tokio::test]
async fn asking_an_empty_collection_yields_the_sentinel_without_generation() {
    let config = RagConfig::default();
    let model = EchoModel::new();
    let pipeline = pipeline_with(config, model.clone());
    pipeline.create_collection("docs").await.unwrap();

    let mut memory = ConversationMemory::new();
    let answer = pipeline.ask("docs", "Anything there?", &mut memory).await.unwrap();

    assert_eq!(answer, NO_MATCH_MESSAGE);
    assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    // The sentinel turn still lands in conversation memory.
    assert_eq!(memory.len(), 1);
}

#[tokio::test]
async fn empty_documents_yield_zero_chunks_without_error() {
    let config = RagConfig::default();
    let pipeline = pipeline_with(config, EchoModel::new());
    pipeline.create_collection("docs").await.unwrap();

    let chunks = pipeline.ingest("docs", &Document::new("empty", "   \n  ")).await.unwrap();
    assert!(chunks.is_empty());
}

/// A source with one good document and one pre-recorded fetch failure.
struct FlakySource;

#[async_trait]
impl DocumentSource for FlakySource {
    fn describe(&self) -> String {
        "flaky test source".to_string()
    }

    async fn load(&self) -> Result<SourceBatch> {
        Ok(SourceBatch {
            documents: vec![Document::new("good", "A perfectly fine document.\nWith two lines.")],
            failures: vec![IngestFailure {
                item: "broken.pdf".to_string(),
                reason: "simulated fetch failure".to_string(),
            }],
        })
    }
}

#[tokio::test]
async fn source_failures_are_reported_but_do_not_abort_the_batch() {
    let config = RagConfig::default();
    let pipeline = pipeline_with(config, EchoModel::new());
    pipeline.create_collection("docs").await.unwrap();

    let report = pipeline.ingest_source("docs", &FlakySource).await.unwrap();
    assert_eq!(report.documents_ingested, 1);
    assert!(report.chunks_stored >= 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].item, "broken.pdf");
}

#[tokio::test]
async fn deterministic_chunking_is_stable_across_runs() {
    let chunker = LineChunker::new(20, 5);
    let text = "Alpha line.\nBeta line.\nGamma line.";
    assert_eq!(chunker.chunk(text), chunker.chunk(text));
}
