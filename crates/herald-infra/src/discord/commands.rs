//! Slash command registration.

use reqwest::Method;

use herald_types::error::DeliveryError;

use super::client::DiscordClient;
use super::types::{CommandDefinition, RegisteredCommand};

/// The single `/notify` command that triggers a workflow.
pub fn notify_command() -> CommandDefinition {
    CommandDefinition {
        name: "notify".to_string(),
        description: "Send a notification".to_string(),
        kind: 1,
    }
}

impl DiscordClient {
    /// Replace the application's global commands with `/notify`.
    ///
    /// Global commands can take a while to appear in every guild.
    pub async fn register_commands(
        &self,
        application_id: &str,
    ) -> Result<Vec<RegisteredCommand>, DeliveryError> {
        let path = format!("/applications/{application_id}/commands");
        let commands = vec![notify_command()];
        let registered: Vec<RegisteredCommand> = self
            .request_json(Method::PUT, &path, application_id, Some(&commands))
            .await?;
        tracing::info!(
            application_id,
            count = registered.len(),
            "registered application commands"
        );
        Ok(registered)
    }

    /// List the application's registered global commands.
    pub async fn list_commands(
        &self,
        application_id: &str,
    ) -> Result<Vec<RegisteredCommand>, DeliveryError> {
        let path = format!("/applications/{application_id}/commands");
        self.request_json::<_, ()>(Method::GET, &path, application_id, None)
            .await
    }
}
