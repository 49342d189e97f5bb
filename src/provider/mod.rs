//! Provisioning capability consumed by the orchestrator, and its OCI implementation.

mod oci;
mod signer;
mod types;
mod wire;

use async_trait::async_trait;

use crate::error::HunterError;

pub use oci::{OciClient, OciSettings};
pub use signer::RequestSigner;
pub use types::{LifecycleState, Placement, ProvisionRequest, ProvisionedInstance};

/// Operations the hunter needs from a cloud provider.
#[async_trait]
pub trait ProvisioningApi: Send + Sync {
    /// Launches an instance; the returned state is whatever the provider reported at launch.
    async fn create_instance(
        &self,
        request: &ProvisionRequest,
    ) -> Result<ProvisionedInstance, HunterError>;

    /// Current details, including network addresses when known.
    async fn get_instance_details(
        &self,
        instance_id: &str,
    ) -> Result<ProvisionedInstance, HunterError>;

    /// Best-effort readiness probe. Query failures read as "not running".
    async fn is_running(&self, instance_id: &str) -> bool {
        match self.get_instance_details(instance_id).await {
            Ok(instance) => instance.lifecycle_state.is_running(),
            Err(err) => {
                log::warn!("error checking state of {instance_id}: {err}");
                false
            }
        }
    }

    /// Requests termination. Never fails; the flag reports whether the request was accepted.
    async fn terminate_instance(&self, instance_id: &str) -> bool;

    async fn availability_domains(&self) -> Result<Vec<String>, HunterError>;

    /// Subnet to attach the primary VNIC to, if the compartment has one.
    async fn default_subnet(&self) -> Result<Option<String>, HunterError>;
}
