//! Configuration and connectivity check (`herald status`).

use anyhow::Result;
use console::style;
use serde::Serialize;

use herald_core::adapter::ChannelDirectory;
use herald_infra::platform::PlatformClient;
use herald_types::workflow::ChannelId;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ChannelCheck {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    ok: bool,
    status: String,
}

/// Look every configured channel up on the active platform.
async fn check_channels(platform: &PlatformClient, channels: &[ChannelId]) -> Vec<ChannelCheck> {
    let mut checks = Vec::with_capacity(channels.len());
    for channel in channels {
        let check = match platform.lookup(channel).await {
            Ok(Some(info)) if info.text_capable => ChannelCheck {
                id: channel.to_string(),
                name: Some(info.name),
                ok: true,
                status: "ok".to_string(),
            },
            Ok(Some(info)) => ChannelCheck {
                id: channel.to_string(),
                name: Some(info.name),
                ok: false,
                status: "not a text channel".to_string(),
            },
            Ok(None) => ChannelCheck {
                id: channel.to_string(),
                name: None,
                ok: false,
                status: "not found".to_string(),
            },
            Err(e) => ChannelCheck {
                id: channel.to_string(),
                name: None,
                ok: false,
                status: e.to_string(),
            },
        };
        checks.push(check);
    }
    checks
}

/// Display configuration and channel resolution.
pub async fn status(state: &AppState, json: bool) -> Result<()> {
    let destinations = &state.config.destinations;

    let bot_user = match state.platform.discord() {
        Some(client) => match client.current_user().await {
            Ok(user) => Some(Ok(user)),
            Err(e) => Some(Err(e.to_string())),
        },
        None => None,
    };
    let checks = check_channels(&state.platform, &destinations.channels).await;

    if json {
        let bot = match &bot_user {
            Some(Ok(user)) => serde_json::json!({ "id": user.id, "username": user.username }),
            Some(Err(e)) => serde_json::json!({ "error": e }),
            None => serde_json::Value::Null,
        };
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "config_path": state.config_path.display().to_string(),
            "platform": state.platform.name(),
            "bot": bot,
            "application_id": state.config.discord.application_id,
            "channels": checks,
            "recipients": destinations.recipients.len(),
            "open_workflows": state.store.len(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let mark = |ok: bool| {
        if ok {
            format!("{}", style("✓").green())
        } else {
            format!("{}", style("✗").red())
        }
    };

    println!();
    println!(
        "  {} Herald v{}",
        style("📢").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!(
        "  {:<16} {}",
        style("Config").dim(),
        state.config_path.display()
    );
    println!("  {:<16} {}", style("Platform").dim(), state.platform.name());
    match &bot_user {
        Some(Ok(user)) => println!(
            "  {:<16} {} {} ({})",
            style("Bot").dim(),
            mark(true),
            user.username,
            user.id
        ),
        Some(Err(e)) => println!("  {:<16} {} {}", style("Bot").dim(), mark(false), e),
        None => println!(
            "  {:<16} {}",
            style("Bot").dim(),
            style("no token, dry-run mode").yellow()
        ),
    }
    println!(
        "  {:<16} {}",
        style("Application ID").dim(),
        state
            .config
            .discord
            .application_id
            .as_deref()
            .unwrap_or("not set")
    );
    println!(
        "  {:<16} {}",
        style("DM recipients").dim(),
        destinations.recipients.len()
    );
    println!();

    if checks.is_empty() {
        println!("  {} No channels configured", mark(false));
    } else {
        println!("  {}", style("Channels").bold());
        for check in &checks {
            println!(
                "  {} {} {} {}",
                mark(check.ok),
                check.id,
                check.name.as_deref().map(|n| format!("# {n}")).unwrap_or_default(),
                style(&check.status).dim()
            );
        }
    }
    println!();

    Ok(())
}
