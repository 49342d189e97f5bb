use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub bot_token: Option<SecretString>,
    pub chat_id: Option<String>,
    pub api_base: String,
    pub parse_mode: String,
    pub progress_message: String,
    pub success_message: String,
    pub error_message: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            chat_id: None,
            api_base: "https://api.telegram.org".to_string(),
            parse_mode: "Markdown".to_string(),
            progress_message: "🔄 *Launch attempt {attempt}/{max_attempts}*".to_string(),
            success_message:
                "✅ *Instance {instance_name} is running*\nPublic IP: `{public_ip}`".to_string(),
            error_message: "❌ *Instance launch error*\n\n`{error_message}`".to_string(),
        }
    }
}
