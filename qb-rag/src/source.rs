//! Polymorphic ingestion sources.
//!
//! A [`DocumentSource`] turns an external location (PDF files on disk, a
//! wiki space, ...) into extracted [`Document`]s. Per-item failures are
//! collected in the returned [`SourceBatch`] instead of aborting sibling
//! work; one bad document never stops a batch.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::document::Document;
use crate::error::Result;
use crate::extract;

/// A per-item ingestion failure, reported rather than raised.
#[derive(Debug, Clone)]
pub struct IngestFailure {
    /// Which item failed (file name, page title, attachment name).
    pub item: String,
    /// Why it failed.
    pub reason: String,
}

/// The outcome of loading a source: extracted documents plus the items
/// that could not be loaded.
#[derive(Debug, Default)]
pub struct SourceBatch {
    /// Successfully extracted documents.
    pub documents: Vec<Document>,
    /// Items that failed extraction or fetching.
    pub failures: Vec<IngestFailure>,
}

/// A location documents can be ingested from.
///
/// Implementations share one contract: extract every reachable document,
/// isolate per-item failures, and fail outright only when the source as a
/// whole is unreachable.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// A short human-readable description of the source for reports.
    fn describe(&self) -> String;

    /// Load and extract all documents from the source.
    ///
    /// # Errors
    ///
    /// Returns an error only when the source itself cannot be reached;
    /// per-document problems land in [`SourceBatch::failures`].
    async fn load(&self) -> Result<SourceBatch>;
}

/// Ingests standalone PDF files from disk.
#[derive(Debug, Clone)]
pub struct PdfFileSource {
    paths: Vec<PathBuf>,
}

impl PdfFileSource {
    /// Create a source over the given PDF file paths.
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl DocumentSource for PdfFileSource {
    fn describe(&self) -> String {
        format!("{} PDF file(s)", self.paths.len())
    }

    async fn load(&self) -> Result<SourceBatch> {
        let mut batch = SourceBatch::default();

        for path in &self.paths {
            let path_display = path.display().to_string();
            let bytes = match tokio::fs::read(path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(file = %path_display, error = %e, "failed to read PDF file");
                    batch
                        .failures
                        .push(IngestFailure { item: path_display, reason: format!("read failed: {e}") });
                    continue;
                }
            };

            match extract::pdf_to_text(&bytes) {
                Ok(text) => {
                    info!(file = %path_display, text_len = text.len(), "extracted PDF");
                    batch.documents.push(
                        Document::new(Uuid::new_v4().to_string(), text).with_source_uri(path_display),
                    );
                }
                Err(e) => {
                    warn!(file = %path_display, error = %e, "failed to extract PDF");
                    batch.failures.push(IngestFailure { item: path_display, reason: e.to_string() });
                }
            }
        }

        Ok(batch)
    }
}

#[cfg(feature = "confluence")]
pub use self::wiki::WikiSpaceSource;

#[cfg(feature = "confluence")]
mod wiki {
    use std::sync::Arc;

    use qb_confluence::ConfluenceClient;

    use super::*;

    /// Ingests every page of a Confluence space, plus PDF attachments.
    ///
    /// Page bodies go through the markup extractor; attachments with a PDF
    /// media type are downloaded and go through the PDF extractor. Fetch or
    /// extraction failures are reported per page/attachment and never stop
    /// the rest of the space.
    pub struct WikiSpaceSource {
        client: Arc<ConfluenceClient>,
        space_key: String,
    }

    impl WikiSpaceSource {
        /// Create a source over one space of the given Confluence instance.
        pub fn new(client: Arc<ConfluenceClient>, space_key: impl Into<String>) -> Self {
            Self { client, space_key: space_key.into() }
        }
    }

    #[async_trait]
    impl DocumentSource for WikiSpaceSource {
        fn describe(&self) -> String {
            format!("wiki space '{}'", self.space_key)
        }

        async fn load(&self) -> Result<SourceBatch> {
            // Listing failing means the source as a whole is unreachable.
            let pages = self.client.list_pages(&self.space_key).await?;
            info!(space = %self.space_key, pages = pages.len(), "listed wiki space");

            let mut batch = SourceBatch::default();
            for page in pages {
                let text = extract::markup_to_text(&page.body_html);
                let source_uri = format!("{}/{}", self.space_key, page.title);
                if !text.is_empty() {
                    let mut document = Document::new(Uuid::new_v4().to_string(), text)
                        .with_source_uri(source_uri.clone());
                    document.metadata.insert("title".to_string(), page.title.clone());
                    document.metadata.insert("space".to_string(), self.space_key.clone());
                    batch.documents.push(document);
                }

                for attachment in &page.attachments {
                    if !attachment.is_pdf() {
                        continue;
                    }
                    let item = format!("{source_uri}#{}", attachment.title);
                    let bytes = match self.client.download_attachment(attachment).await {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!(attachment = %item, error = %e, "failed to download attachment");
                            batch
                                .failures
                                .push(IngestFailure { item, reason: e.to_string() });
                            continue;
                        }
                    };
                    match extract::pdf_to_text(&bytes) {
                        Ok(text) if !text.trim().is_empty() => {
                            batch.documents.push(
                                Document::new(Uuid::new_v4().to_string(), text)
                                    .with_source_uri(item),
                            );
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(attachment = %item, error = %e, "failed to extract attachment");
                            batch.failures.push(IngestFailure { item, reason: e.to_string() });
                        }
                    }
                }
            }

            Ok(batch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreadable_files_are_reported_not_fatal() {
        let source = PdfFileSource::new(vec![PathBuf::from("/definitely/not/here.pdf")]);
        let batch = source.load().await.unwrap();
        assert!(batch.documents.is_empty());
        assert_eq!(batch.failures.len(), 1);
        assert!(batch.failures[0].reason.contains("read failed"));
    }

    #[tokio::test]
    async fn undecodable_pdf_is_isolated_from_siblings() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.pdf");
        std::fs::write(&bad, b"this is not a pdf").unwrap();

        let source = PdfFileSource::new(vec![bad, PathBuf::from("/also/missing.pdf")]);
        let batch = source.load().await.unwrap();
        assert!(batch.documents.is_empty());
        assert_eq!(batch.failures.len(), 2);
    }
}
