//! Passage index and the retrieval tool built on it

pub mod index;
pub mod tool;

pub use index::{cosine_similarity, DocumentIndex, SqliteVectorIndex, VectorTable};
pub use tool::{RetrievalTool, DEFAULT_TOP_K, SEARCH_TOOL_NAME};
