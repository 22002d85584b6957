use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::domain::errors::DiscoveryResult;
use crate::domain::models::{TestEvent, TestRunnerRequest};
use crate::domain::ports::log_collector::LogCollector;

/// Receiving half of an instrumentation run. Each message is one batch of
/// events in arrival order; the channel closes when the run finishes.
pub type EventReceiver = mpsc::Receiver<Vec<TestEvent>>;

/// Port for the remote execution target.
#[async_trait]
pub trait Device: Send + Sync {
    /// Serial number used to name the target in errors and logs
    fn serial_number(&self) -> &str;

    /// Instrumentation protocol features the device supports
    fn supported_features(&self) -> Vec<String>;

    /// Create a fresh diagnostic log collector bound to this device
    fn log_collector(&self) -> Box<dyn LogCollector>;

    /// Start an instrumentation run and return its event stream
    async fn execute_test_request(&self, request: TestRunnerRequest) -> DiscoveryResult<EventReceiver>;
}
