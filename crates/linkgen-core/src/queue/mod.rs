//! Durable queue transport for draft-generation jobs (NATS JetStream).

pub mod consumer;
pub mod message;
pub mod publisher;

pub use consumer::{Consumer, ConsumerConfig, DraftHandler};
pub use message::DraftGenerationMessage;
pub use publisher::Publisher;
