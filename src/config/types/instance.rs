use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    pub shape: String,
    pub ocpus: u32,
    pub memory_gb: u32,
    pub boot_volume_gb: u32,
    /// Pins the image, bypassing region image resolution.
    pub image_id: Option<String>,
    pub subnet_id: Option<String>,
    pub availability_domain: Option<String>,
    pub name_prefix: String,
    pub assign_public_ip: bool,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            shape: "VM.Standard.A1.Flex".to_string(),
            ocpus: 2,
            memory_gb: 12,
            boot_volume_gb: 50,
            image_id: None,
            subnet_id: None,
            availability_domain: None,
            name_prefix: "AutoVM".to_string(),
            assign_public_ip: true,
        }
    }
}
