//! The `search` tool the conversation graph offers to the model

use std::sync::Arc;

use crate::providers::ToolSpec;
use crate::types::RetrievedPassage;

use super::index::DocumentIndex;

/// Name the model uses to invoke retrieval
pub const SEARCH_TOOL_NAME: &str = "search";

/// Default number of passages per search
pub const DEFAULT_TOP_K: usize = 5;

/// Stateless retrieval tool over a document index
#[derive(Clone)]
pub struct RetrievalTool {
    index: Arc<dyn DocumentIndex>,
    top_k: usize,
}

impl RetrievalTool {
    pub fn new(index: Arc<dyn DocumentIndex>, top_k: usize) -> Self {
        Self {
            index,
            top_k: top_k.max(1),
        }
    }

    /// Declaration offered to the model in the deciding step
    pub fn spec(&self) -> ToolSpec {
        ToolSpec::query_tool(
            SEARCH_TOOL_NAME,
            "Cari informasi beasiswa LPDP yang relevan dari basis dokumen.",
        )
    }

    /// Search with the configured `k`
    pub async fn search(&self, query: &str) -> Vec<RetrievedPassage> {
        self.search_k(query, self.top_k).await
    }

    /// Up to `k` passages by decreasing relevance.
    ///
    /// Index faults are logged and yield an empty list.
    pub async fn search_k(&self, query: &str, k: usize) -> Vec<RetrievedPassage> {
        if query.trim().is_empty() {
            tracing::debug!("Empty retrieval query, returning no passages");
            return Vec::new();
        }

        match self.index.search(query, k).await {
            Ok(mut passages) => {
                passages.truncate(k);
                tracing::debug!("Retrieved {} passages for {:?}", passages.len(), query);
                passages
            }
            Err(e) => {
                tracing::warn!("Retrieval failed for {:?}: {}", query, e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::types::PassageInput;
    use async_trait::async_trait;

    struct BrokenIndex;

    #[async_trait]
    impl DocumentIndex for BrokenIndex {
        async fn add(&self, _passages: Vec<PassageInput>) -> Result<usize> {
            Err(Error::VectorDb("read-only".into()))
        }

        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<RetrievedPassage>> {
            Err(Error::VectorDb("index file is corrupt".into()))
        }

        async fn count(&self) -> Result<usize> {
            Ok(0)
        }

        async fn clear(&self) -> Result<usize> {
            Ok(0)
        }

        fn name(&self) -> &str {
            "broken"
        }

        fn embedding_model(&self) -> &str {
            "none"
        }
    }

    /// Returns more passages than asked for
    struct GreedyIndex;

    #[async_trait]
    impl DocumentIndex for GreedyIndex {
        async fn add(&self, passages: Vec<PassageInput>) -> Result<usize> {
            Ok(passages.len())
        }

        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<RetrievedPassage>> {
            Ok((0..10)
                .map(|i| RetrievedPassage {
                    content: format!("passage {}", i),
                    source: "doc".into(),
                    score: 1.0 - i as f32 / 10.0,
                })
                .collect())
        }

        async fn count(&self) -> Result<usize> {
            Ok(10)
        }

        async fn clear(&self) -> Result<usize> {
            Ok(10)
        }

        fn name(&self) -> &str {
            "greedy"
        }

        fn embedding_model(&self) -> &str {
            "none"
        }
    }

    #[tokio::test]
    async fn test_index_fault_yields_empty_list() {
        let tool = RetrievalTool::new(Arc::new(BrokenIndex), DEFAULT_TOP_K);
        assert!(tool.search("syarat usia").await.is_empty());
    }

    #[tokio::test]
    async fn test_result_bounded_by_k() {
        let tool = RetrievalTool::new(Arc::new(GreedyIndex), 3);
        let passages = tool.search("apa saja").await;
        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].content, "passage 0");
        assert!(tool.search("   ").await.is_empty());
    }

    #[test]
    fn test_spec_declares_query_argument() {
        let tool = RetrievalTool::new(Arc::new(GreedyIndex), DEFAULT_TOP_K);
        let spec = tool.spec();
        assert_eq!(spec.name, SEARCH_TOOL_NAME);
        assert_eq!(spec.parameters["required"][0], "query");
    }
}
