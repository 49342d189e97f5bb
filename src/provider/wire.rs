//! JSON bodies of the OCI Core and Identity REST APIs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{LifecycleState, ProvisionRequest, ProvisionedInstance};

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct LaunchInstanceDetails<'a> {
    compartment_id: &'a str,
    availability_domain: &'a str,
    display_name: &'a str,
    shape: &'a str,
    shape_config: ShapeConfig,
    source_details: SourceDetails<'a>,
    create_vnic_details: CreateVnicDetails<'a>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ShapeConfig {
    ocpus: u32,
    #[serde(rename = "memoryInGBs")]
    memory_in_gbs: u32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SourceDetails<'a> {
    source_type: &'static str,
    image_id: &'a str,
    #[serde(rename = "bootVolumeSizeInGBs")]
    boot_volume_size_in_gbs: u32,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateVnicDetails<'a> {
    subnet_id: &'a str,
    assign_public_ip: bool,
}

impl<'a> From<&'a ProvisionRequest> for LaunchInstanceDetails<'a> {
    fn from(req: &'a ProvisionRequest) -> Self {
        Self {
            compartment_id: &req.compartment_id,
            availability_domain: &req.availability_domain,
            display_name: &req.display_name,
            shape: &req.shape,
            shape_config: ShapeConfig {
                ocpus: req.ocpus,
                memory_in_gbs: req.memory_gb,
            },
            source_details: SourceDetails {
                source_type: "image",
                image_id: &req.image_id,
                boot_volume_size_in_gbs: req.boot_volume_gb,
            },
            create_vnic_details: CreateVnicDetails {
                subnet_id: &req.subnet_id,
                assign_public_ip: req.assign_public_ip,
            },
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct Instance {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    pub lifecycle_state: LifecycleState,
    #[serde(default)]
    pub availability_domain: String,
    #[serde(default)]
    pub shape: String,
    pub time_created: DateTime<Utc>,
}

impl Instance {
    pub fn into_provisioned(
        self,
        public_ip: Option<String>,
        private_ip: Option<String>,
    ) -> ProvisionedInstance {
        ProvisionedInstance {
            instance_id: self.id,
            display_name: self.display_name,
            lifecycle_state: self.lifecycle_state,
            availability_domain: self.availability_domain,
            shape: self.shape,
            created_at: self.time_created,
            public_ip,
            private_ip,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct VnicAttachment {
    pub vnic_id: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct Vnic {
    pub public_ip: Option<String>,
    pub private_ip: Option<String>,
}

#[derive(Deserialize, Debug)]
pub(super) struct AvailabilityDomain {
    pub name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct Vcn {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub(super) struct Subnet {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub prohibit_public_ip_on_vnic: bool,
}

#[derive(Deserialize, Debug)]
pub(super) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
