//! Retrieval coordinator: the pipeline's single entry point into the index.

use tracing::{debug, instrument, warn};

use tutorgraph_shared::{Result, RetrievalResult, TutorError};

use crate::index::SimilarityIndex;

/// Wraps a [`SimilarityIndex`] and guarantees the ranked-result contract:
/// at most `k` results, similarity in `[0, 1]`, sorted descending with ties
/// in index order.
pub struct RetrievalCoordinator {
    index: Box<dyn SimilarityIndex>,
}

impl RetrievalCoordinator {
    pub fn new(index: impl SimilarityIndex + 'static) -> Self {
        Self {
            index: Box::new(index),
        }
    }

    /// Number of documents the underlying index holds.
    pub fn document_count(&self) -> usize {
        self.index.len()
    }

    /// Return up to `k` passages relevant to `query`, most relevant first.
    ///
    /// An empty index or a query nothing matches yields an empty list, not an error.
    #[instrument(skip(self, query))]
    pub async fn search(&self, query: &str, k: usize) -> Result<Vec<RetrievalResult>> {
        if k == 0 {
            return Err(TutorError::validation("retrieval count must be at least 1"));
        }
        if self.index.is_empty() {
            debug!("index is empty, skipping search");
            return Ok(Vec::new());
        }

        let raw = self.index.search(query, k).await.map_err(|e| match e {
            TutorError::Retrieval(_) => e,
            other => TutorError::Retrieval(other.to_string()),
        })?;
        let returned = raw.len();

        let mut results: Vec<RetrievalResult> = raw
            .into_iter()
            .filter(|r| r.similarity.is_finite())
            .map(|mut r| {
                r.similarity = r.similarity.clamp(0.0, 1.0);
                r
            })
            .collect();
        if results.len() != returned {
            warn!(dropped = returned - results.len(), "index returned non-finite similarities");
        }

        results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        results.truncate(k);

        debug!(results = results.len(), "retrieval complete");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::LexicalIndex;
    use async_trait::async_trait;
    use tutorgraph_shared::{Document, DocumentMetadata};

    /// Index that returns a canned, deliberately unsorted result list.
    struct CannedIndex(Vec<f32>);

    #[async_trait]
    impl SimilarityIndex for CannedIndex {
        async fn add_document(&mut self, _text: String, _metadata: DocumentMetadata) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<RetrievalResult>> {
            Ok(self
                .0
                .iter()
                .enumerate()
                .map(|(i, s)| RetrievalResult {
                    document: Document {
                        id: format!("doc-{i}"),
                        text: format!("passage {i}"),
                        metadata: DocumentMetadata::default(),
                    },
                    similarity: *s,
                })
                .collect())
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    #[tokio::test]
    async fn enforces_count_and_order() {
        let coordinator = RetrievalCoordinator::new(CannedIndex(vec![0.2, 0.9, 0.5, 0.9, 0.1]));
        let results = coordinator.search("anything", 3).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        // Ties keep the index's order.
        assert_eq!(results[0].document.id, "doc-1");
        assert_eq!(results[1].document.id, "doc-3");
        assert_eq!(results[2].document.id, "doc-2");
    }

    #[tokio::test]
    async fn drops_non_finite_and_clamps() {
        let coordinator = RetrievalCoordinator::new(CannedIndex(vec![f32::NAN, 1.7, -0.3]));
        let results = coordinator.search("anything", 5).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].similarity, 1.0);
        assert_eq!(results[1].similarity, 0.0);
    }

    struct BrokenIndex;

    #[async_trait]
    impl SimilarityIndex for BrokenIndex {
        async fn add_document(&mut self, _text: String, _metadata: DocumentMetadata) -> Result<()> {
            Ok(())
        }

        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<RetrievalResult>> {
            Err(TutorError::Network("vector store unreachable".into()))
        }

        fn len(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn index_failure_is_a_retrieval_error() {
        let coordinator = RetrievalCoordinator::new(BrokenIndex);
        let err = coordinator.search("vibrato", 3).await.unwrap_err();
        assert!(matches!(&err, TutorError::Retrieval(msg) if msg.contains("vector store unreachable")));
    }

    #[tokio::test]
    async fn zero_k_is_rejected() {
        let coordinator = RetrievalCoordinator::new(CannedIndex(vec![0.5]));
        let err = coordinator.search("anything", 0).await.unwrap_err();
        assert!(matches!(err, TutorError::Validation { .. }));
    }

    #[tokio::test]
    async fn empty_index_returns_empty() {
        let coordinator = RetrievalCoordinator::new(LexicalIndex::new(0.0));
        assert!(coordinator.search("What is vibrato?", 3).await.unwrap().is_empty());
        assert_eq!(coordinator.document_count(), 0);
    }

    #[tokio::test]
    async fn length_never_exceeds_k() {
        let mut index = LexicalIndex::new(0.0);
        for i in 0..10 {
            index
                .add_document(format!("breath exercise number {i}"), DocumentMetadata::default())
                .await
                .unwrap();
        }
        let coordinator = RetrievalCoordinator::new(index);

        for k in 1..=12 {
            let results = coordinator.search("breath exercise", k).await.unwrap();
            assert!(results.len() <= k);
            assert!(results.windows(2).all(|w| w[0].similarity >= w[1].similarity));
        }
    }
}
