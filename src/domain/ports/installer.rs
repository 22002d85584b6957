use async_trait::async_trait;

use crate::domain::errors::DiscoveryResult;
use crate::domain::models::TestBundle;
use crate::domain::ports::device::Device;

/// Port for installing bundle artifacts onto a device.
#[async_trait]
pub trait AppInstaller: Send + Sync {
    /// Install just enough of the bundle to list its tests
    async fn prepare_partial_installation(
        &self,
        device: &dyn Device,
        bundle: &TestBundle,
    ) -> DiscoveryResult<()>;
}
