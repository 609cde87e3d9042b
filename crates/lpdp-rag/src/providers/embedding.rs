//! Text to vector seam used by the document index

use async_trait::async_trait;

use crate::error::Result;

/// Turns passages and questions into vectors of a fixed width.
///
/// Questions and stored passages must go through the same provider, or
/// cosine scores between them mean nothing.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per text, in order. Ollama has no batch endpoint, so the
    /// default embeds one text at a time.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }

    /// Width every returned vector must have
    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}
