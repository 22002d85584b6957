//! Multi-bundle test discovery.

use std::fmt::Write as _;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::domain::errors::DiscoveryResult;
use crate::domain::models::{DiscoveryConfig, Test, TestBundle, TestCatalog};
use crate::domain::ports::{AppInstaller, Device};
use crate::services::bundle_discovery::{BundleDiscoveryCoordinator, DiscoveryRunState};
use crate::services::retry_policy::RetryPolicy;
use crate::services::test_bundle_identifier::TestBundleIdentifier;

/// Discovers the tests of every bundle on a device by observing listing runs.
///
/// Bundles are processed in order. Tests are deduplicated by identity across
/// bundles; when two bundles report the same test the first one wins. A bundle
/// that exhausts its retries fails the whole run.
pub struct RemoteTestParser {
    coordinator: BundleDiscoveryCoordinator,
    bundle_identifier: Arc<TestBundleIdentifier>,
}

impl RemoteTestParser {
    pub fn new(
        config: DiscoveryConfig,
        installer: Arc<dyn AppInstaller>,
        bundle_identifier: Arc<TestBundleIdentifier>,
    ) -> Self {
        Self {
            coordinator: BundleDiscoveryCoordinator::new(config, installer, bundle_identifier.clone()),
            bundle_identifier,
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.coordinator = self.coordinator.with_retry_policy(retry);
        self
    }

    pub fn bundle_identifier(&self) -> &Arc<TestBundleIdentifier> {
        &self.bundle_identifier
    }

    /// Discover all tests of `bundles` on `device` with fresh run state.
    pub async fn extract(
        &self,
        device: &dyn Device,
        bundles: &[TestBundle],
        cancel: &CancellationToken,
    ) -> DiscoveryResult<Vec<Test>> {
        let mut run_state = DiscoveryRunState::new();
        self.extract_with_state(device, bundles, &mut run_state, cancel)
            .await
    }

    /// Discover all tests of `bundles`, threading `run_state` through every
    /// bundle so listener suppression persists for the rest of the run.
    pub async fn extract_with_state(
        &self,
        device: &dyn Device,
        bundles: &[TestBundle],
        run_state: &mut DiscoveryRunState,
        cancel: &CancellationToken,
    ) -> DiscoveryResult<Vec<Test>> {
        debug!("{}", bundle_summary(bundles));

        let mut catalog = TestCatalog::new();
        for bundle in bundles {
            let tests = self
                .coordinator
                .discover(device, bundle, run_state, cancel)
                .await?;
            let reported = tests.len();
            let added = catalog.merge(tests);
            debug!(bundle = %bundle.id, reported, added, "merged bundle tests");
        }

        info!(
            serial = device.serial_number(),
            bundles = bundles.len(),
            tests = catalog.len(),
            "test discovery complete"
        );
        Ok(catalog.into_vec())
    }
}

fn bundle_summary(bundles: &[TestBundle]) -> String {
    let mut summary = String::from("Parsing bundle(s):");
    for info in bundles.iter().map(|b| &b.instrumentation_info) {
        let _ = write!(summary, "\n- testPackage: {}", info.instrumentation_package);
        if !info.application_package.trim().is_empty() {
            let _ = write!(summary, "\n  targetPackage: {}", info.application_package);
        }
    }
    summary
}
