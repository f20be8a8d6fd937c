use serde::Deserialize;

pub const CREATE_COMMAND: &str = "/create";
pub const DASHBOARD_COMMAND: &str = "/todo";

/// Form fields Slack posts for a slash command invocation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SlashCommandPayload {
    pub command: String,
    #[serde(default)]
    pub text: String,
    pub channel_id: String,
    pub user_id: String,
    pub trigger_id: String,
    pub response_url: String,
}

/// Canonical routing form: trimmed, lowercase, with exactly one leading slash.
pub fn normalize_command_name(command: &str) -> String {
    let trimmed = command.trim().trim_start_matches('/');
    format!("/{}", trimmed.to_ascii_lowercase())
}
