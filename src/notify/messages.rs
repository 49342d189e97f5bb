use std::sync::Arc;
use std::time::Duration;

use super::NotificationChannel;
use crate::config::{InstanceConfig, NotificationConfig};
use crate::provider::ProvisionedInstance;

const UNKNOWN: &str = "N/A";

/// Replaces every `{key}` in `template` with its value.
pub fn render_template(template: &str, values: &[(&str, &str)]) -> String {
    values
        .iter()
        .fold(template.to_string(), |text, (key, value)| {
            text.replace(&format!("{{{key}}}"), value)
        })
}

/// Operator-editable notice templates.
#[derive(Debug, Clone)]
pub struct MessageTemplates {
    pub progress: String,
    pub success: String,
    pub error: String,
}

impl MessageTemplates {
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self {
            progress: config.progress_message.clone(),
            success: config.success_message.clone(),
            error: config.error_message.clone(),
        }
    }
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self::from_config(&NotificationConfig::default())
    }
}

/// Shape of the instance being hunted, as announced at start.
#[derive(Debug, Clone)]
pub struct InstanceSummary {
    pub shape: String,
    pub ocpus: u32,
    pub memory_gb: u32,
    pub boot_volume_gb: u32,
}

impl From<&InstanceConfig> for InstanceSummary {
    fn from(config: &InstanceConfig) -> Self {
        Self {
            shape: config.shape.clone(),
            ocpus: config.ocpus,
            memory_gb: config.memory_gb,
            boot_volume_gb: config.boot_volume_gb,
        }
    }
}

/// Formats the hunter's notices and pushes them to a channel.
///
/// Delivery failures are logged and reported as `false`; they never propagate.
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn NotificationChannel>,
    templates: MessageTemplates,
}

impl Notifier {
    pub fn new(channel: Arc<dyn NotificationChannel>, templates: MessageTemplates) -> Self {
        Self { channel, templates }
    }

    pub async fn test_connection(&self) -> bool {
        self.channel.test_connection().await
    }

    pub async fn send(&self, text: &str) -> bool {
        let delivered = self.channel.send_message(text).await;
        if !delivered {
            log::warn!("notification not delivered");
        }
        delivered
    }

    pub async fn start(&self, summary: &InstanceSummary) -> bool {
        let text = format!(
            "🚀 *Instance hunt started*\n\n\
             • Shape: {}\n\
             • OCPUs: {}\n\
             • Memory: {}GB\n\
             • Storage: {}GB\n\n\
             ⏳ Trying to launch the instance...",
            summary.shape, summary.ocpus, summary.memory_gb, summary.boot_volume_gb
        );
        self.send(&text).await
    }

    pub async fn progress(&self, attempt: u32, max_attempts: u32) -> bool {
        let attempt = attempt.to_string();
        let max_attempts = max_attempts.to_string();
        let text = render_template(
            &self.templates.progress,
            &[
                ("attempt", attempt.as_str()),
                ("max_attempts", max_attempts.as_str()),
            ],
        );
        self.send(&text).await
    }

    /// Error notice; with an attempt number it uses the fixed per-attempt format.
    pub async fn error(&self, message: &str, attempt: Option<u32>) -> bool {
        let text = match attempt {
            Some(attempt) => format!("❌ *Launch failed* (attempt #{attempt})\n\n`{message}`"),
            None => render_template(&self.templates.error, &[("error_message", message)]),
        };
        self.send(&text).await
    }

    pub async fn retry(&self, attempt: u32, max_attempts: u32, wait: Duration) -> bool {
        let text = format!(
            "⏳ *Waiting to retry* ({attempt}/{max_attempts})\n\n\
             Next attempt in: {}s\n\
             Still trying to launch the instance...",
            wait.as_secs()
        );
        self.send(&text).await
    }

    pub async fn success(&self, instance: &ProvisionedInstance) -> bool {
        let public_ip = instance.public_ip.as_deref().unwrap_or(UNKNOWN);
        let private_ip = instance.private_ip.as_deref().unwrap_or(UNKNOWN);
        let created = instance.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let headline = render_template(
            &self.templates.success,
            &[
                ("instance_name", instance.display_name.as_str()),
                ("public_ip", public_ip),
                ("private_ip", private_ip),
                ("created_time", created.as_str()),
                ("instance_id", instance.instance_id.as_str()),
                ("shape", instance.shape.as_str()),
                ("availability_domain", instance.availability_domain.as_str()),
            ],
        );
        let text = format!(
            "{headline}\n\n\
             *Instance Details:*\n\
             • *ID*: `{}`\n\
             • *Name*: {}\n\
             • *Shape*: {}\n\
             • *Public IP*: `{public_ip}`\n\
             • *Private IP*: `{private_ip}`\n\
             • *Availability Domain*: {}\n\
             • *Status*: {}\n\
             • *Created*: {created}\n\n\
             🎉 *The instance is up!*",
            instance.instance_id,
            instance.display_name,
            instance.shape,
            instance.availability_domain,
            instance.lifecycle_state,
        );
        self.send(&text).await
    }

    pub async fn final_failure(&self, max_attempts: u32, last_error: &str) -> bool {
        let text = format!(
            "💥 *Instance hunt failed*\n\n\
             • Attempts: {max_attempts}\n\
             • Last error: `{last_error}`\n\n\
             All attempts were used up. Check the configuration; the hunt restarts after a pause."
        );
        self.send(&text).await
    }

    pub async fn stopped(&self) -> bool {
        self.send("🛑 Instance hunt stopped.").await
    }
}
