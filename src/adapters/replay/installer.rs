use async_trait::async_trait;
use tracing::debug;

use crate::domain::errors::DiscoveryResult;
use crate::domain::models::TestBundle;
use crate::domain::ports::{AppInstaller, Device};

/// Installer for devices that already have every bundle available.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopInstaller;

#[async_trait]
impl AppInstaller for NoopInstaller {
    async fn prepare_partial_installation(
        &self,
        device: &dyn Device,
        bundle: &TestBundle,
    ) -> DiscoveryResult<()> {
        debug!(
            serial = device.serial_number(),
            bundle = %bundle.id,
            test_application = %bundle.test_application.display(),
            "skipping installation"
        );
        Ok(())
    }
}
