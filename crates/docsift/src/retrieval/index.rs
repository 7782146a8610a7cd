//! In-memory nearest-neighbour index over embedded chunks.
//!
//! Exact cosine search over one document's chunks. An approximate index
//! would be overkill at this scale: a document yields tens of chunks, not
//! millions of vectors.

/// A chunk with its embedding, as stored in the index.
#[derive(Debug, Clone)]
pub struct IndexedChunk {
    pub content: String,
    pub embedding: Vec<f32>,
    pub chunk_index: u32,
}

/// A retrieved chunk with its similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub content: String,
    pub similarity: f32,
    pub chunk_index: u32,
}

/// Immutable index built once per distinct document text.
#[derive(Debug)]
pub struct ChunkIndex {
    chunks: Vec<IndexedChunk>,
}

impl ChunkIndex {
    pub fn new(chunks: Vec<IndexedChunk>) -> Self {
        Self { chunks }
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Top-k chunks by cosine similarity, sorted descending.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                content: chunk.content.clone(),
                similarity: cosine_similarity(&chunk.embedding, query_embedding),
                chunk_index: chunk.chunk_index,
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);
        scored
    }
}

/// Cosine similarity; 0.0 for zero-length or mismatched vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(content: &str, embedding: Vec<f32>, index: u32) -> IndexedChunk {
        IndexedChunk {
            content: content.to_string(),
            embedding,
            chunk_index: index,
        }
    }

    #[test]
    fn identical_vectors_score_one() {
        let similarity = cosine_similarity(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]);
        assert!((similarity - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let similarity = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]);
        assert!(similarity.abs() < 1e-6);
    }

    #[test]
    fn mismatched_lengths_score_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn search_returns_most_similar_first() {
        let index = ChunkIndex::new(vec![
            chunk("about cats", vec![1.0, 0.0, 0.0], 0),
            chunk("about dogs", vec![0.0, 1.0, 0.0], 1),
            chunk("cats and dogs", vec![0.7, 0.7, 0.0], 2),
        ]);

        let results = index.search(&[1.0, 0.0, 0.0], 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].content, "about cats");
        assert_eq!(results[1].content, "cats and dogs");
        assert!(results[0].similarity > results[1].similarity);
    }

    #[test]
    fn top_k_larger_than_index_returns_everything() {
        let index = ChunkIndex::new(vec![chunk("only one", vec![1.0], 0)]);
        assert_eq!(index.search(&[1.0], 10).len(), 1);
    }
}
