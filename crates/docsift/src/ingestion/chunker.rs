//! Sentence-aware text chunking for retrieval indexing.

use unicode_segmentation::UnicodeSegmentation;

use crate::config::ChunkingConfig;

/// A bounded-length segment of document text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub content: String,
    /// 0-indexed position within the document's chunk sequence.
    pub chunk_index: u32,
    /// Byte offsets into the source text (approximate for overlapped chunks).
    pub char_start: usize,
    pub char_end: usize,
}

/// Splits text on sentence boundaries into chunks of roughly `chunk_size`
/// characters with `overlap` characters carried between neighbours.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
    min_size: usize,
}

impl TextChunker {
    pub fn new(chunk_size: usize, overlap: usize, min_size: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            min_size,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.min_chunk_size)
    }

    /// Chunk a document's text. Chunks shorter than the minimum are dropped.
    pub fn chunk_text(&self, text: &str) -> Vec<TextChunk> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_start = 0usize;
        let mut position = 0usize;
        let mut index = 0u32;

        for sentence in text.split_sentence_bounds() {
            if !current.is_empty() && current.len() + sentence.len() > self.chunk_size {
                if current.trim().len() >= self.min_size {
                    chunks.push(TextChunk {
                        content: current.trim().to_string(),
                        chunk_index: index,
                        char_start: current_start,
                        char_end: position,
                    });
                    index += 1;
                }

                // Carry the tail of the finished chunk into the next one.
                current = self.overlap_tail(&current);
                current_start = position.saturating_sub(current.len());
            }

            current.push_str(sentence);
            position += sentence.len();
        }

        if current.trim().len() >= self.min_size {
            chunks.push(TextChunk {
                content: current.trim().to_string(),
                chunk_index: index,
                char_start: current_start,
                char_end: position,
            });
        }

        chunks
    }

    /// Last `overlap` characters of a chunk, snapped forward to a word
    /// boundary so the next chunk does not open mid-word.
    fn overlap_tail(&self, text: &str) -> String {
        if self.overlap == 0 {
            return String::new();
        }
        if text.len() <= self.overlap {
            return text.to_string();
        }

        let mut start = text.len() - self.overlap;
        while start > 0 && !text.is_char_boundary(start) {
            start -= 1;
        }
        let tail = &text[start..];

        match tail.find(' ') {
            Some(pos) => tail[pos + 1..].to_string(),
            None => tail.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker() -> TextChunker {
        TextChunker::new(100, 20, 10)
    }

    #[test]
    fn empty_text_produces_no_chunks() {
        assert!(chunker().chunk_text("").is_empty());
        assert!(chunker().chunk_text("   \n  ").is_empty());
    }

    #[test]
    fn short_text_is_a_single_chunk() {
        let chunks = chunker().chunk_text("A simple sentence that fits in one chunk.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
    }

    #[test]
    fn text_below_min_size_is_dropped() {
        assert!(chunker().chunk_text("tiny.").is_empty());
    }

    #[test]
    fn long_text_splits_with_overlap() {
        let sentence = "The quarterly invoice total must match the line items. ";
        let text = sentence.repeat(10);

        let chunks = chunker().chunk_text(&text);
        assert!(chunks.len() > 1, "expected multiple chunks");

        // Indexes are sequential.
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i as u32);
            assert!(chunk.content.len() <= 100 + sentence.len());
        }

        // Overlap carries trailing words into the next chunk.
        let first_tail: String = chunks[0]
            .content
            .chars()
            .rev()
            .take(10)
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        assert!(chunks[1].content.contains(first_tail.trim()));
    }

    #[test]
    fn zero_overlap_does_not_duplicate_text() {
        let chunker = TextChunker::new(60, 0, 10);
        let text = "One short sentence here. Another short sentence here. A third one closes it.";
        let chunks = chunker.chunk_text(text);
        assert!(chunks.len() > 1);

        let rebuilt: String = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert!(rebuilt.matches("Another short sentence").count() == 1);
    }
}
