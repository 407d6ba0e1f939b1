//! Document retrieval for TutorGraph.
//!
//! This crate provides:
//! - [`SimilarityIndex`]: the similarity-search contract the pipeline depends on
//! - [`LexicalIndex`]: default in-memory index (term-frequency cosine similarity)
//! - [`RetrievalCoordinator`]: enforces result-count and ordering guarantees
//! - [`corpus`]: corpus file parsing

pub mod corpus;
mod coordinator;
mod index;

pub use coordinator::RetrievalCoordinator;
pub use corpus::{CorpusEntry, CorpusFile, parse_corpus};
pub use index::{LexicalIndex, SimilarityIndex, tokenize};
