use async_trait::async_trait;

use crate::domain::errors::DiscoveryResult;

/// Port for capturing a device's diagnostic log around one listing run.
///
/// Sequencing contract: `setup`, then `start`, then any number of `stop`
/// calls. `finish` marks a clean end of the attempt and is still followed by
/// a `stop`.
#[async_trait]
pub trait LogCollector: Send {
    /// Prepare the capture. Idempotent.
    async fn setup(&mut self) -> DiscoveryResult<()>;

    /// Begin capturing
    async fn start(&mut self) -> DiscoveryResult<()>;

    /// End capturing and return everything accumulated so far.
    /// Safe to call more than once.
    async fn stop(&mut self) -> String;

    /// Signal that the attempt completed successfully
    async fn finish(&mut self);
}
