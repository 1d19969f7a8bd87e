//! Application use-cases: the orchestration layer composing the domain,
//! prompt engine, LLM client, and storage behind each public operation.

pub mod generate_drafts;
pub mod generate_ideas;
pub mod refine_draft;

pub use generate_drafts::generate_drafts;
pub use generate_ideas::generate_ideas;
pub use refine_draft::refine_draft;
