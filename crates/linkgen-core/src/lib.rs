//! Core library for the LinkGen draft-generation engine.
//!
//! This crate contains the draft-generation pipeline, the LLM client core,
//! the prompt engine and store, the scheduler/seeder, and the shared
//! storage and error types the CLI binary wires together.
pub mod config;
pub mod domain;
pub mod error;
pub mod llm;
pub mod prompt_engine;
pub mod queue;
pub mod runtime;
pub mod scheduler;
pub mod seeder;
pub mod storage;
pub mod usecases;

pub use error::*;

/// Returns the version of the linkgen-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
