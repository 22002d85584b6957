//! Per-bundle discovery with adaptive retry.
//!
//! Each attempt installs the bundle, starts a diagnostic log capture, runs
//! the instrumentation in listing mode and parses its event stream. Failed
//! attempts are retried up to the [`RetryPolicy`] budget, except for
//! cancellation which is returned immediately.
//!
//! A misconfiguration failure (the injected annotation listener could not be
//! loaded) sets the run-wide suppression flag in [`DiscoveryRunState`], so the
//! listener override is left out of every later attempt of this bundle and of
//! every bundle after it in the same run.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::domain::errors::{DiscoveryError, DiscoveryResult, FailureKind};
use crate::domain::models::{
    DiscoveryConfig, InstrumentOptions, TestBundle, TestCatalog, TestParserConfig, TestRunnerRequest,
};
use crate::domain::ports::{AppInstaller, Device, LogCollector};
use crate::services::annotation_extractor::TEST_ANNOTATION_PRODUCER;
use crate::services::event_stream_parser::{EventStreamParser, LISTENER_ARGUMENT};
use crate::services::retry_policy::RetryPolicy;
use crate::services::test_bundle_identifier::TestBundleIdentifier;

/// State shared by every attempt of every bundle within one discovery run.
///
/// The suppression flag is monotonic: once set it stays set until the run
/// ends, and it is not reset between bundles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryRunState {
    listener_override_suppressed: bool,
}

impl DiscoveryRunState {
    pub const fn new() -> Self {
        Self {
            listener_override_suppressed: false,
        }
    }

    pub const fn is_listener_override_suppressed(&self) -> bool {
        self.listener_override_suppressed
    }

    pub fn suppress_listener_override(&mut self) {
        self.listener_override_suppressed = true;
    }
}

/// Result of a single discovery attempt.
#[derive(Debug)]
pub enum AttemptOutcome {
    Discovered(TestCatalog),
    Retryable(DiscoveryError),
    Fatal(DiscoveryError),
}

impl From<DiscoveryResult<TestCatalog>> for AttemptOutcome {
    fn from(result: DiscoveryResult<TestCatalog>) -> Self {
        match result {
            Ok(tests) => Self::Discovered(tests),
            Err(err) => match err.kind() {
                FailureKind::Cancellation => Self::Fatal(err),
                FailureKind::Timeout | FailureKind::Misconfiguration | FailureKind::Unclassified => {
                    Self::Retryable(err)
                }
            },
        }
    }
}

/// Instrumentation argument overrides for the next attempt.
///
/// Only remote mode carries overrides. Under suppression the exact
/// `listener=<annotation producer>` pair is removed; everything else stays.
pub fn instrumentation_overrides(
    parser_config: &TestParserConfig,
    suppress_listener: bool,
) -> BTreeMap<String, String> {
    match parser_config {
        TestParserConfig::Remote {
            instrumentation_args,
        } => instrumentation_args
            .iter()
            .filter(|(key, value)| {
                !(suppress_listener
                    && key.as_str() == LISTENER_ARGUMENT
                    && value.as_str() == TEST_ANNOTATION_PRODUCER)
            })
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
        TestParserConfig::Local => BTreeMap::new(),
    }
}

/// Drives discovery of one bundle to completion or fatal failure.
pub struct BundleDiscoveryCoordinator {
    config: DiscoveryConfig,
    installer: Arc<dyn AppInstaller>,
    parser: EventStreamParser,
    retry: RetryPolicy,
}

impl BundleDiscoveryCoordinator {
    pub fn new(
        config: DiscoveryConfig,
        installer: Arc<dyn AppInstaller>,
        bundle_identifier: Arc<TestBundleIdentifier>,
    ) -> Self {
        let parser = EventStreamParser::new(bundle_identifier, config.test_output_timeout());
        Self {
            config,
            installer,
            parser,
            retry: RetryPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Discover the tests of `bundle`, retrying recoverable failures.
    ///
    /// On exhaustion the last failure is returned unchanged, including any
    /// captured device log.
    pub async fn discover(
        &self,
        device: &dyn Device,
        bundle: &TestBundle,
        run_state: &mut DiscoveryRunState,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<TestCatalog> {
        let mut attempt = 1;
        loop {
            debug!(bundle = %bundle.id, attempt, "starting discovery attempt");
            let outcome = self
                .attempt(device, bundle, run_state.is_listener_override_suppressed(), cancel)
                .await;

            let err = match outcome {
                AttemptOutcome::Discovered(tests) => {
                    info!(bundle = %bundle.id, attempt, tests = tests.len(), "bundle discovered");
                    return Ok(tests);
                }
                AttemptOutcome::Fatal(err) => return Err(err),
                AttemptOutcome::Retryable(err) => err,
            };

            if let DiscoveryError::AnnotationProducerNotFound {
                instrumentation_package,
                test_application,
                logcat,
            } = &err
            {
                warn!(
                    bundle = %bundle.id,
                    attempt,
                    "Previous parsing attempt failed for {}\n file: {}\n due to test parser misconfiguration: \
                     test annotation producer was not found.\n Next parsing attempt will remove overridden test run listener.\n \
                     Device log:\n{}",
                    instrumentation_package,
                    test_application.display(),
                    logcat
                );
                run_state.suppress_listener_override();
            } else {
                debug!(bundle = %bundle.id, attempt, error = %err, "Remote parsing failed. Retrying");
            }

            if !self.retry.allows_retry_after(attempt) {
                warn!(
                    bundle = %bundle.id,
                    attempts = attempt,
                    error = %err,
                    "test discovery failed after all attempts"
                );
                return Err(err);
            }
            attempt += 1;

            if !self.retry.delay().is_zero() {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(DiscoveryError::Cancelled),
                    () = tokio::time::sleep(self.retry.delay()) => {}
                }
            }
        }
    }

    async fn attempt(
        &self,
        device: &dyn Device,
        bundle: &TestBundle,
        suppress_listener: bool,
        cancel: &CancellationToken,
    ) -> AttemptOutcome {
        AttemptOutcome::from(self.run_attempt(device, bundle, suppress_listener, cancel).await)
    }

    async fn run_attempt(
        &self,
        device: &dyn Device,
        bundle: &TestBundle,
        suppress_listener: bool,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<TestCatalog> {
        if cancel.is_cancelled() {
            return Err(DiscoveryError::Cancelled);
        }
        self.installer.prepare_partial_installation(device, bundle).await?;

        let mut collector = device.log_collector();
        collector.setup().await?;

        let result = self
            .listen(device, bundle, suppress_listener, collector.as_mut(), cancel)
            .await;

        // Always release the capture session, whatever the outcome
        collector.stop().await;
        result
    }

    async fn listen(
        &self,
        device: &dyn Device,
        bundle: &TestBundle,
        suppress_listener: bool,
        collector: &mut dyn LogCollector,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<TestCatalog> {
        let request = self.runner_request(device, bundle, suppress_listener);

        collector.start().await?;
        let mut events = device.execute_test_request(request).await?;
        let state = self
            .parser
            .parse(device.serial_number(), bundle, &mut events, collector, cancel)
            .await?;
        collector.finish().await;

        Ok(state.tests)
    }

    fn runner_request(
        &self,
        device: &dyn Device,
        bundle: &TestBundle,
        suppress_listener: bool,
    ) -> TestRunnerRequest {
        let info = &bundle.instrumentation_info;
        TestRunnerRequest {
            test_package: info.instrumentation_package.clone(),
            runner_class: info.test_runner_class.clone(),
            instrument_options: InstrumentOptions {
                log: true,
                overrides: instrumentation_overrides(&self.config.test_parser, suppress_listener),
            },
            supported_features: device.supported_features(),
        }
    }
}
