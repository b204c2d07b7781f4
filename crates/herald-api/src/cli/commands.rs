//! Slash command management (`herald commands register|list`).

use anyhow::{Context, Result, bail};
use console::style;

use herald_infra::discord::DiscordClient;
use herald_infra::discord::types::RegisteredCommand;

use crate::state::AppState;

/// The Discord client and application id, or an error explaining what is missing.
fn discord_target(state: &AppState) -> Result<(&DiscordClient, &str)> {
    let Some(client) = state.platform.discord() else {
        bail!("DISCORD_BOT_TOKEN is not set; slash commands need a bot token");
    };
    let Some(application_id) = state.config.discord.application_id.as_deref() else {
        bail!("no application id: set CLIENT_ID or [discord].application_id in herald.toml");
    };
    Ok((client, application_id))
}

/// Register `/notify` as the application's global command.
pub async fn register(state: &AppState, json: bool) -> Result<()> {
    let (client, application_id) = discord_target(state)?;
    let registered = client
        .register_commands(application_id)
        .await
        .context("failed to register application commands")?;

    if json {
        print_json(&registered)?;
    } else {
        println!(
            "\n  {} Registered {} application command(s)",
            style("✓").green().bold(),
            registered.len()
        );
        print_table(&registered);
        println!(
            "  {}\n",
            style("Global commands can take up to an hour to appear in every server.").dim()
        );
    }
    Ok(())
}

/// List the application's registered global commands.
pub async fn list(state: &AppState, json: bool) -> Result<()> {
    let (client, application_id) = discord_target(state)?;
    let commands = client
        .list_commands(application_id)
        .await
        .context("failed to list application commands")?;

    if json {
        print_json(&commands)?;
    } else if commands.is_empty() {
        println!(
            "\n  No commands registered. Run {} to register /notify.\n",
            style("herald commands register").cyan()
        );
    } else {
        println!();
        print_table(&commands);
    }
    Ok(())
}

fn print_json(commands: &[RegisteredCommand]) -> Result<()> {
    let rows: Vec<_> = commands
        .iter()
        .map(|c| serde_json::json!({ "id": c.id, "name": c.name, "description": c.description }))
        .collect();
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_table(commands: &[RegisteredCommand]) {
    for command in commands {
        println!(
            "  /{:<12} {:<24} {}",
            style(&command.name).cyan(),
            command.description,
            style(&command.id).dim()
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use herald_infra::platform::PlatformClient;
    use herald_types::config::HeraldConfig;
    use secrecy::SecretString;

    fn state(token: Option<&str>, application_id: Option<&str>) -> AppState {
        let mut config = HeraldConfig::default();
        config.discord.application_id = application_id.map(str::to_string);
        let platform =
            PlatformClient::from_config(&config, token.map(SecretString::from)).unwrap();
        AppState::from_parts(config, PathBuf::from("herald.toml"), platform)
    }

    #[test]
    fn requires_bot_token() {
        let state = state(None, Some("123"));
        let err = discord_target(&state).err().unwrap();
        assert!(err.to_string().contains("DISCORD_BOT_TOKEN"));
    }

    #[test]
    fn requires_application_id() {
        let state = state(Some("token"), None);
        let err = discord_target(&state).err().unwrap();
        assert!(err.to_string().contains("application id"));
    }

    #[test]
    fn resolves_target() {
        let state = state(Some("token"), Some("123"));
        let (_, application_id) = discord_target(&state).unwrap();
        assert_eq!(application_id, "123");
    }
}
