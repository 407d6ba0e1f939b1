//! Question-answering orchestration and domain logic for TutorGraph.
//!
//! This crate ties retrieval, prompt construction, generation, concept-graph
//! scaffolding, and fact verification into end-to-end workflows
//! (e.g., [`pipeline::Orchestrator::ask`]).

pub mod app;
pub mod assembler;
pub mod bootstrap;
pub mod generation;
pub mod pipeline;
pub mod prompt;
pub mod support;
pub mod verification;

#[cfg(test)]
mod testing;
