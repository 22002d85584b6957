//! Event stream parser for one instrumentation listing run.
//!
//! Consumes event batches strictly in arrival order and records every test
//! that reports `test_ended`. Two device-reported error signatures abort the
//! attempt with [`DiscoveryError::AnnotationProducerNotFound`].

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::domain::errors::{DiscoveryError, DiscoveryResult};
use crate::domain::models::{TestBundle, TestCatalog, TestEvent};
use crate::domain::ports::{EventReceiver, LogCollector};
use crate::services::annotation_extractor::{AnnotationExtractor, TEST_ANNOTATION_PRODUCER};
use crate::services::test_bundle_identifier::TestBundleIdentifier;

/// Instrumentation argument used to inject the annotation listener
pub const LISTENER_ARGUMENT: &str = "listener";


/// Reported on wearables when the listener is missing from the classpath
const PROCESS_CRASHED_MARKER: &str = "Process crashed";

/// Outcome of a single timed receive.
#[derive(Debug)]
pub enum Received {
    Events(Vec<TestEvent>),
    Closed,
    TimedOut,
}

/// Wait for the next batch, bounded by `timeout` and aborted by `cancel`.
pub async fn receive(
    events: &mut EventReceiver,
    timeout: Duration,
    cancel: &CancellationToken,
) -> DiscoveryResult<Received> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DiscoveryError::Cancelled),
        received = tokio::time::timeout(timeout, events.recv()) => Ok(match received {
            Ok(Some(batch)) => Received::Events(batch),
            Ok(None) => Received::Closed,
            Err(_) => Received::TimedOut,
        }),
    }
}

/// Per-attempt discovery state. Dropped when the attempt ends.
#[derive(Debug, Default)]
pub struct DiscoveryAttemptState {
    pub observed_annotations: bool,
    pub tests: TestCatalog,
}

/// Parses the event stream of a single listing run.
#[derive(Debug, Clone)]
pub struct EventStreamParser {
    extractor: AnnotationExtractor,
    bundle_identifier: Arc<TestBundleIdentifier>,
    output_timeout: Duration,
}

impl EventStreamParser {
    pub fn new(bundle_identifier: Arc<TestBundleIdentifier>, output_timeout: Duration) -> Self {
        Self {
            extractor: AnnotationExtractor::new(),
            bundle_identifier,
            output_timeout,
        }
    }

    pub const fn output_timeout(&self) -> Duration {
        self.output_timeout
    }

    /// Drain `events` until the channel closes.
    ///
    /// `serial` names the device in the timeout error. The collector is
    /// stopped (and its text captured) whenever the run reports a failure.
    pub async fn parse(
        &self,
        serial: &str,
        bundle: &TestBundle,
        events: &mut EventReceiver,
        collector: &mut dyn LogCollector,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<DiscoveryAttemptState> {
        let mut state = DiscoveryAttemptState::default();

        loop {
            match receive(events, self.output_timeout, cancel).await? {
                Received::Events(batch) => {
                    for event in batch {
                        self.handle(event, bundle, &mut state, collector).await?;
                    }
                }
                Received::Closed => break,
                Received::TimedOut => {
                    return Err(DiscoveryError::Timeout {
                        serial: serial.to_string(),
                    })
                }
            }
        }

        if !state.observed_annotations {
            warn!(
                bundle = %bundle.id,
                "Bundle {} did not report any test annotations. If you need test annotations retrieval, \
                 remote test parser requires the {} listener to be configured",
                bundle.id,
                TEST_ANNOTATION_PRODUCER
            );
        }

        Ok(state)
    }

    async fn handle(
        &self,
        event: TestEvent,
        bundle: &TestBundle,
        state: &mut DiscoveryAttemptState,
        collector: &mut dyn LogCollector,
    ) -> DiscoveryResult<()> {
        match event {
            TestEvent::TestRunStarted { .. }
            | TestEvent::TestStarted { .. }
            | TestEvent::TestFailed { .. }
            | TestEvent::TestAssumptionFailed { .. }
            | TestEvent::TestIgnored { .. }
            | TestEvent::TestRunStopped
            | TestEvent::TestRunEnded => {}
            TestEvent::TestEnded { ref id, ref metrics } => {
                let annotations = self.extractor.extract_from_metrics(metrics);
                if !annotations.is_empty() {
                    state.observed_annotations = true;
                }
                let test = id.to_test(annotations);
                trace!(test = %test, "test reported");
                self.bundle_identifier.put(test.id(), bundle);
                state.tests.insert(test);
            }
            TestEvent::TestRunFailing { error } => {
                let logcat = collector.stop().await;
                if error.contains(&format!("Could not find extra class {TEST_ANNOTATION_PRODUCER}")) {
                    return Err(producer_not_found(bundle, logcat));
                }
            }
            TestEvent::TestRunFailed { error } => {
                let logcat = collector.stop().await;
                if error.contains(PROCESS_CRASHED_MARKER) {
                    return Err(producer_not_found(bundle, logcat));
                }
            }
        }
        Ok(())
    }
}

fn producer_not_found(bundle: &TestBundle, logcat: String) -> DiscoveryError {
    DiscoveryError::AnnotationProducerNotFound {
        instrumentation_package: bundle.instrumentation_info.instrumentation_package.clone(),
        test_application: bundle.test_application.clone(),
        logcat,
    }
}
