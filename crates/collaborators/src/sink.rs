//! Fire-and-forget transfer/hangup sink. The real telephony
//! transfer and call-teardown mechanics are out of scope; this records
//! the event so an operator dashboard or log pipeline can pick it up.

use async_trait::async_trait;
use taxi_domain::contracts::HumanTransferSink;

#[derive(Debug, Clone, Default)]
pub struct LoggingTransferSink;

#[async_trait]
impl HumanTransferSink for LoggingTransferSink {
    async fn transfer(&self, reason: &str) {
        tracing::warn!(reason, "transferring call to human operator");
    }

    async fn hangup(&self, text: &str) {
        tracing::info!(text, "hanging up call");
    }
}
