//! Question answering over a document via retrieval.

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::ingestion::TextChunker;
use crate::providers::{EmbeddingProvider, LlmProvider};
use crate::types::response::{ContextSnippet, QaResponse};

use super::cache::IndexCache;
use super::index::{ChunkIndex, IndexedChunk, ScoredChunk};

/// Grounded QA prompt: context chunks, then the question.
fn qa_prompt(question: &str, context: &[ScoredChunk]) -> String {
    let mut rendered = String::new();
    for (i, chunk) in context.iter().enumerate() {
        rendered.push_str(&format!("[{}]\n{}\n\n---\n\n", i + 1, chunk.content));
    }

    format!(
        "Answer the question using ONLY the document excerpts below. If the \
         answer is not in the excerpts, say \"The answer is not available in \
         the provided document.\" Do not use outside knowledge.\n\n\
         Document excerpts:\n{rendered}\
         Question: {question}\n\n\
         Answer:"
    )
}

/// Answer a question against the given document text.
///
/// The chunk index for the exact text is served from the cache when fresh;
/// otherwise the text is chunked, embedded, indexed, and cached.
#[allow(clippy::too_many_arguments)]
pub async fn answer_question(
    embedder: &dyn EmbeddingProvider,
    llm: &dyn LlmProvider,
    chunker: &TextChunker,
    cache: &IndexCache,
    config: &RetrievalConfig,
    document_text: &str,
    question: &str,
    top_k: Option<usize>,
    similarity_threshold: Option<f32>,
) -> Result<QaResponse> {
    let top_k = top_k.unwrap_or(config.top_k);
    let threshold = similarity_threshold.unwrap_or(config.similarity_threshold);

    let (index, from_cache) = match cache.get(document_text) {
        Some(index) => (index, true),
        None => {
            let index = build_index(embedder, chunker, document_text).await?;
            let index = Arc::new(index);
            cache.put(document_text, Arc::clone(&index));
            (index, false)
        }
    };

    let query_embedding = embedder.embed(question).await?;

    let mut retrieved = index.search(&query_embedding, top_k);
    retrieved.retain(|chunk| chunk.similarity >= threshold);

    if retrieved.is_empty() {
        return Ok(QaResponse::not_found(from_cache, 0));
    }

    let answer = llm.generate(&qa_prompt(question, &retrieved)).await?;

    let context = retrieved
        .into_iter()
        .map(|chunk| ContextSnippet {
            content: chunk.content,
            similarity: chunk.similarity,
            chunk_index: chunk.chunk_index,
        })
        .collect();

    Ok(QaResponse {
        answer,
        context,
        from_cache,
        processing_time_ms: 0, // stamped by the route handler
    })
}

/// Chunk and embed the document text into a fresh index.
async fn build_index(
    embedder: &dyn EmbeddingProvider,
    chunker: &TextChunker,
    document_text: &str,
) -> Result<ChunkIndex> {
    let chunks = chunker.chunk_text(document_text);
    if chunks.is_empty() {
        return Err(Error::BadRequest(
            "document text produced no chunks to index".to_string(),
        ));
    }

    let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    let indexed = chunks
        .into_iter()
        .zip(embeddings)
        .map(|(chunk, embedding)| IndexedChunk {
            content: chunk.content,
            embedding,
            chunk_index: chunk.chunk_index,
        })
        .collect();

    Ok(ChunkIndex::new(indexed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embeds each text to a vector encoding which keywords appear in it, so
    /// retrieval is deterministic in tests.
    struct KeywordEmbedder {
        calls: AtomicUsize,
    }

    impl KeywordEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let lower = text.to_lowercase();
            Ok(vec![
                lower.contains("invoice") as u8 as f32,
                lower.contains("payment") as u8 as f32,
                lower.contains("shipping") as u8 as f32,
            ])
        }

        fn dimensions(&self) -> usize {
            3
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "keyword"
        }
    }

    struct AnswerLlm;

    #[async_trait]
    impl LlmProvider for AnswerLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            assert!(prompt.contains("Document excerpts"));
            Ok("the answer".to_string())
        }

        async fn generate_with_image(
            &self,
            _prompt: &str,
            _image: &[u8],
            _mime: &str,
        ) -> Result<String> {
            unreachable!()
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "answer"
        }

        fn model(&self) -> &str {
            "answer-1"
        }
    }

    fn retrieval_config() -> RetrievalConfig {
        RetrievalConfig {
            top_k: 2,
            similarity_threshold: 0.1,
            cache_max_entries: 4,
            cache_ttl_secs: 3600,
        }
    }

    const DOC: &str = "The invoice total for March is 420 dollars and covers consulting work. \
         Payment is due within thirty days of receipt by bank transfer only. \
         Shipping to the warehouse happens every second Friday of the month.";

    #[tokio::test]
    async fn answers_with_relevant_context() {
        let embedder = KeywordEmbedder::new();
        let chunker = TextChunker::new(80, 0, 10);
        let cache = IndexCache::new(4, 3600);

        let response = answer_question(
            &embedder,
            &AnswerLlm,
            &chunker,
            &cache,
            &retrieval_config(),
            DOC,
            "what is the invoice total?",
            None,
            None,
        )
        .await
        .unwrap();

        assert_eq!(response.answer, "the answer");
        assert!(!response.from_cache);
        assert!(!response.context.is_empty());
        assert!(response.context[0].content.to_lowercase().contains("invoice"));
    }

    #[tokio::test]
    async fn second_question_reuses_cached_index() {
        let embedder = KeywordEmbedder::new();
        let chunker = TextChunker::new(80, 0, 10);
        let cache = IndexCache::new(4, 3600);
        let config = retrieval_config();

        let first = answer_question(
            &embedder, &AnswerLlm, &chunker, &cache, &config, DOC,
            "what is the invoice total?", None, None,
        )
        .await
        .unwrap();
        assert!(!first.from_cache);
        let calls_after_first = embedder.calls.load(Ordering::SeqCst);

        let second = answer_question(
            &embedder, &AnswerLlm, &chunker, &cache, &config, DOC,
            "when is payment due?", None, None,
        )
        .await
        .unwrap();
        assert!(second.from_cache);

        // Only the question itself was embedded the second time.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), calls_after_first + 1);
    }

    #[tokio::test]
    async fn empty_document_is_a_bad_request() {
        let embedder = KeywordEmbedder::new();
        let chunker = TextChunker::new(80, 0, 10);
        let cache = IndexCache::new(4, 3600);

        let err = answer_question(
            &embedder,
            &AnswerLlm,
            &chunker,
            &cache,
            &retrieval_config(),
            "",
            "anything?",
            None,
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::BadRequest(_)));
    }

    #[tokio::test]
    async fn no_chunk_above_threshold_returns_not_found_answer() {
        let embedder = KeywordEmbedder::new();
        let chunker = TextChunker::new(80, 0, 10);
        let cache = IndexCache::new(4, 3600);

        let response = answer_question(
            &embedder,
            &AnswerLlm,
            &chunker,
            &cache,
            &retrieval_config(),
            DOC,
            "completely unrelated query",
            None,
            None,
        )
        .await
        .unwrap();

        assert!(response.context.is_empty());
        assert!(response.answer.contains("not available"));
    }
}
