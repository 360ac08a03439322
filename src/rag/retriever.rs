//! Query-time retrieval over the embedding store.

use super::index::{Metric, VectorIndex};
use super::store::EmbeddingStore;
use crate::core::errors::{GenerationError, SetupError};
use crate::embedding::{EmbedDirection, Embedder};

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedChunk {
    pub text: String,
    pub source_id: String,
    pub chunk_index: usize,
    pub score: f32,
}

/// Chunks in rank order, best first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub chunks: Vec<RetrievedChunk>,
}

impl RetrievedContext {
    pub fn texts(&self) -> Vec<&str> {
        self.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    pub fn joined(&self, separator: &str) -> String {
        self.texts().join(separator)
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }
}

/// Owns the store, the index built from it, and the embedder used for
/// queries. The index is built once in [`ContextRetriever::new`].
pub struct ContextRetriever {
    store: EmbeddingStore,
    index: VectorIndex,
    embedder: Box<dyn Embedder>,
}

impl ContextRetriever {
    pub fn new(
        store: EmbeddingStore,
        metric: Metric,
        embedder: Box<dyn Embedder>,
    ) -> Result<Self, SetupError> {
        let index = VectorIndex::build(store.chunks(), metric)?;
        tracing::info!(
            "Retriever ready: {} chunks, metric {}, query model {}",
            store.len(),
            metric,
            embedder.model_id()
        );
        Ok(Self {
            store,
            index,
            embedder,
        })
    }

    pub fn store(&self) -> &EmbeddingStore {
        &self.store
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn embedder(&self) -> &dyn Embedder {
        self.embedder.as_ref()
    }

    /// Embeds `query_text` as a query and returns the top `k` chunks.
    pub async fn retrieve(
        &self,
        query_text: &str,
        k: usize,
    ) -> Result<RetrievedContext, GenerationError> {
        let query = self
            .embedder
            .embed_one(query_text, EmbedDirection::Query)
            .await?;
        self.retrieve_by_vector(&query, k)
    }

    pub fn retrieve_by_vector(
        &self,
        query: &[f32],
        k: usize,
    ) -> Result<RetrievedContext, GenerationError> {
        let hits = self.index.search(query, k)?;
        let chunks = hits
            .into_iter()
            .filter_map(|hit| {
                self.store.get(hit.position).map(|chunk| RetrievedChunk {
                    text: chunk.text.clone(),
                    source_id: chunk.source_id.clone(),
                    chunk_index: chunk.chunk_index,
                    score: hit.score,
                })
            })
            .collect();
        Ok(RetrievedContext { chunks })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::Chunk;
    use crate::testing::{FailingEmbedder, KeywordEmbedder};

    fn first_aid_store() -> EmbeddingStore {
        EmbeddingStore::from_chunks(vec![
            Chunk {
                text: "Apply direct pressure to the wound.".to_string(),
                embedding: vec![1.0, 0.0],
                source_id: "bec.pdf".to_string(),
                chunk_index: 0,
            },
            Chunk {
                text: "Elevate the limb above heart level.".to_string(),
                embedding: vec![0.0, 1.0],
                source_id: "bec.pdf".to_string(),
                chunk_index: 1,
            },
        ])
        .unwrap()
    }

    fn embedder() -> Box<dyn Embedder> {
        Box::new(KeywordEmbedder::new(&["pressure", "elevate"]))
    }

    #[tokio::test]
    async fn nearest_chunk_is_returned_for_k_one() {
        for metric in [Metric::L2, Metric::Cosine] {
            let retriever = ContextRetriever::new(first_aid_store(), metric, embedder()).unwrap();
            let context = retriever
                .retrieve("How much pressure should I apply?", 1)
                .await
                .unwrap();
            assert_eq!(context.texts(), vec!["Apply direct pressure to the wound."]);
        }
    }

    #[tokio::test]
    async fn k_beyond_store_returns_all_in_rank_order() {
        let retriever = ContextRetriever::new(first_aid_store(), Metric::Cosine, embedder()).unwrap();
        let context = retriever.retrieve("Should I elevate it?", 5).await.unwrap();
        assert_eq!(
            context.joined("\n"),
            "Elevate the limb above heart level.\nApply direct pressure to the wound."
        );
        assert_eq!(context.chunks[0].chunk_index, 1);
    }

    #[tokio::test]
    async fn embedding_failure_propagates() {
        let retriever = ContextRetriever::new(
            first_aid_store(),
            Metric::L2,
            Box::new(FailingEmbedder),
        )
        .unwrap();
        assert!(retriever.retrieve("anything", 1).await.is_err());
    }

    #[test]
    fn retrieval_by_stored_vector() {
        let retriever = ContextRetriever::new(first_aid_store(), Metric::L2, embedder()).unwrap();
        let query = retriever.store().chunks()[1].embedding.clone();
        let context = retriever.retrieve_by_vector(&query, 1).unwrap();
        assert_eq!(context.chunks[0].text, "Elevate the limb above heart level.");
        assert_eq!(context.chunks[0].score, 0.0);
    }
}
