use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport ack already sent")]
    AlreadyAcknowledged,
}

/// Sends the platform acknowledgement for a single inbound envelope.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    async fn acknowledge(&self) -> Result<(), TransportError>;
}

/// For envelopes whose transport needs no explicit ack.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopAcknowledger;

#[async_trait]
impl Acknowledger for NoopAcknowledger {
    async fn acknowledge(&self) -> Result<(), TransportError> {
        Ok(())
    }
}
