//! Answer composition: retrieved context + augmented query → language model.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;
use crate::retriever::Retrieval;

/// The fixed response returned when retrieval produced no qualifying chunk.
pub const NO_MATCH_MESSAGE: &str = "No relevant information found.";

/// A synchronous-per-turn language-model capability.
///
/// Implementations wrap a concrete model API. The composer calls
/// [`generate`](LanguageModel::generate) at most once per user turn.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Assembles retrieved chunks and the augmented query into a prompt and
/// delegates to the language model.
pub struct AnswerComposer {
    model: Arc<dyn LanguageModel>,
}

impl AnswerComposer {
    /// Create a composer over the given language model.
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Produce the answer for one user turn.
    ///
    /// A [`Retrieval::NoMatch`] sentinel short-circuits to
    /// [`NO_MATCH_MESSAGE`] without invoking the model. Otherwise the
    /// retrieved chunk texts (in retrieval order) and the augmented query
    /// form the prompt, and the model's output is returned verbatim.
    ///
    /// # Errors
    ///
    /// Surfaces language-model failures as-is; no retry is attempted.
    pub async fn compose(&self, retrieval: &Retrieval, augmented_query: &str) -> Result<String> {
        let chunks = match retrieval {
            Retrieval::NoMatch => {
                info!("retrieval produced no qualifying chunks, skipping generation");
                return Ok(NO_MATCH_MESSAGE.to_string());
            }
            Retrieval::Grounded(chunks) => chunks,
        };

        let context: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let prompt = format!("{}\n\n{augmented_query}", context.join("\n\n"));
        debug!(context_chunks = chunks.len(), prompt_len = prompt.len(), "generating answer");

        self.model.generate(&prompt).await
    }
}
