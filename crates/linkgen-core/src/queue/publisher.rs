//! Publisher: request-scoped publish of `DraftGenerationMessage`.

use async_nats::jetstream::{self, stream};

use crate::error::QueueError;

use super::message::DraftGenerationMessage;

/// Publishes draft-generation jobs to a JetStream stream backing `subject`.
#[derive(Clone)]
pub struct Publisher {
    jetstream: jetstream::Context,
    subject: String,
}

impl Publisher {
    /// Connect to `nats_url` and ensure a stream named `stream_name` exists
    /// covering `subject`.
    pub async fn connect(nats_url: &str, stream_name: &str, subject: &str) -> Result<Self, QueueError> {
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;
        let jetstream = jetstream::new(client);
        jetstream
            .get_or_create_stream(stream::Config {
                name: stream_name.to_string(),
                subjects: vec![subject.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        Ok(Self { jetstream, subject: subject.to_string() })
    }

    /// Publish is best-effort with the broker's own durability: success is
    /// returned only once the broker acknowledges the publish.
    pub async fn publish(&self, message: &DraftGenerationMessage) -> Result<(), QueueError> {
        let payload =
            serde_json::to_vec(message).map_err(|e| QueueError::Decode(e.to_string()))?;

        let ack_future = self
            .jetstream
            .publish(self.subject.clone(), payload.into())
            .await
            .map_err(|e| QueueError::PublishFailed(e.to_string()))?;

        ack_future
            .await
            .map_err(|e| QueueError::PublishFailed(e.to_string()))?;

        Ok(())
    }
}
