//! Domain entities: `User`, `Topic`, `Idea`, `Prompt`, `Draft`.
//!
//! Each type mirrors a row in `storage` but carries the invariants the
//! storage layer itself does not enforce (state transitions, length
//! bounds, normalisation). Construction happens through factories where
//! the spec calls for normalisation; plain struct literals are fine
//! everywhere else since these are plain data.

pub mod draft;
pub mod idea;
pub mod object_id;
pub mod prompt;
pub mod topic;
pub mod user;

pub use draft::{Draft, DraftStatus, DraftType, RefinementEntry};
pub use idea::Idea;
pub use object_id::ObjectId;
pub use prompt::{Prompt, PromptType};
pub use topic::Topic;
pub use user::User;
