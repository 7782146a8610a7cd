//! Retrieval-augmented QA over a single document's text.

pub mod cache;
pub mod index;
pub mod qa;

pub use cache::{CacheStats, IndexCache};
pub use index::{ChunkIndex, IndexedChunk, ScoredChunk};
pub use qa::answer_question;
