//! Text chunking.
//!
//! This module provides the [`Chunker`] trait and [`LineChunker`], which
//! splits text into bounded, overlapping chunks preferring newline
//! boundaries.

/// A strategy for splitting extracted text into chunks.
///
/// Implementations are pure: identical input and parameters always yield
/// an identical sequence of chunks. Returned chunks carry no embeddings;
/// those are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split text into an ordered sequence of chunk strings.
    ///
    /// Returns an empty `Vec` for empty or whitespace-only input.
    fn chunk(&self, text: &str) -> Vec<String>;
}

/// Splits text into overlapping chunks bounded by a maximum character count,
/// breaking at the last newline inside the window when one exists.
///
/// When a single newline-delimited unit exceeds `max_size`, it is hard-split
/// at the bound rather than silently exceeding it. Consecutive chunks share
/// `overlap` characters: each chunk after the first starts `overlap`
/// characters before the previous chunk's end.
///
/// Sizes are measured in `char`s, so multi-byte text never splits inside a
/// code point.
///
/// # Example
///
/// ```rust,ignore
/// use qb_rag::LineChunker;
///
/// let chunker = LineChunker::new(5000, 500);
/// let chunks = chunker.chunk(&text);
/// ```
#[derive(Debug, Clone)]
pub struct LineChunker {
    max_size: usize,
    overlap: usize,
}

impl LineChunker {
    /// Create a new `LineChunker`.
    ///
    /// # Arguments
    ///
    /// * `max_size` — maximum number of characters per chunk
    /// * `overlap` — number of overlapping characters between consecutive chunks
    pub fn new(max_size: usize, overlap: usize) -> Self {
        Self { max_size, overlap }
    }
}

impl Default for LineChunker {
    /// The default parameters used for document ingestion.
    fn default() -> Self {
        Self::new(5000, 500)
    }
}

impl Chunker for LineChunker {
    fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() || self.max_size == 0 {
            return Vec::new();
        }

        // bounds[i] is the byte offset of the i-th char; bounds[total] == text.len()
        let mut bounds: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        bounds.push(text.len());
        let total = bounds.len() - 1;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < total {
            let limit = (start + self.max_size).min(total);
            let end = if limit == total {
                total
            } else {
                // Break after the last newline inside the window, if any.
                match text[bounds[start]..bounds[limit]].rfind('\n') {
                    Some(pos) => {
                        // '\n' is a single byte, so pos + 1 is a char boundary.
                        let break_byte = bounds[start] + pos + 1;
                        bounds.partition_point(|&b| b < break_byte)
                    }
                    None => limit,
                }
            };

            chunks.push(text[bounds[start]..bounds[end]].to_string());

            if end == total {
                break;
            }
            // Step back by the overlap, but always make forward progress.
            start = end.saturating_sub(self.overlap).max(start + 1);
        }

        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_input_yield_no_chunks() {
        let chunker = LineChunker::new(100, 10);
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("   \n\t \n").is_empty());
    }

    #[test]
    fn short_input_is_a_single_chunk() {
        let chunker = LineChunker::new(100, 10);
        assert_eq!(chunker.chunk("hello world"), vec!["hello world".to_string()]);
    }

    #[test]
    fn chunks_never_exceed_max_size() {
        let chunker = LineChunker::new(20, 5);
        let text = "Alpha line.\nBeta line.\nGamma line.";
        let chunks = chunker.chunk(text);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20, "chunk too long: {chunk:?}");
        }
    }

    #[test]
    fn splits_prefer_newline_boundaries() {
        let chunker = LineChunker::new(15, 0);
        let chunks = chunker.chunk("first\nsecond\nthird\n");
        // "first\nsecond\n" is 13 chars and fits; the break lands on the newline.
        assert_eq!(chunks[0], "first\nsecond\n");
        assert_eq!(chunks[1], "third\n");
    }

    #[test]
    fn oversized_single_line_is_hard_split() {
        let chunker = LineChunker::new(10, 2);
        let chunks = chunker.chunk(&"x".repeat(25));
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 10);
        }
        // No newline to break on, so the first chunk fills the bound exactly.
        assert_eq!(chunks[0].len(), 10);
    }

    #[test]
    fn consecutive_chunks_share_the_overlap() {
        let chunker = LineChunker::new(10, 4);
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunker.chunk(text);
        for pair in chunks.windows(2) {
            let tail: String = pair[0].chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
            let head: String = pair[1].chars().take(4).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn stripping_overlaps_reconstructs_the_input() {
        let chunker = LineChunker::new(12, 3);
        let text = "one two three four five six seven eight nine ten";
        let chunks = chunker.chunk(text);
        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(3));
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = LineChunker::new(17, 6);
        let text = "line one\nline two\nline three\nline four\n";
        assert_eq!(chunker.chunk(text), chunker.chunk(text));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let chunker = LineChunker::new(4, 1);
        let text = "héllö wörld ünïcode";
        let chunks = chunker.chunk(text);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 4);
        }
        // Rebuilding with the single-char overlap stripped restores the input.
        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(1));
        }
        assert_eq!(rebuilt, text);
    }
}
