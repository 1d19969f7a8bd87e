//! LLM client core: typed request layer, retry executor, and tolerant
//! structured-output parsing.

pub mod client;
pub mod parsing;
pub mod retry;

pub use client::{DraftsResult, LlmClient};
pub use retry::{Attempt, RetryConfig};
