//! Concept graph and query expansion for TutorGraph.
//!
//! This crate provides:
//! - [`ConceptGraph`]: immutable in-memory graph of learning concepts with
//!   prerequisite, related, and next-step edges, plus cycle-safe traversals
//! - [`expand_query`]: finds the concepts a learner's question mentions

mod expansion;
mod graph;

pub use expansion::expand_query;
pub use graph::{ConceptGraph, EdgeKind};
