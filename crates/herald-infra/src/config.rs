//! Configuration loader for Herald.
//!
//! Reads `herald.toml` (path from `--config`, else `HERALD_CONFIG`, else
//! `~/.herald/herald.toml`) into [`HeraldConfig`], falling back to defaults
//! when the file is missing or malformed. Environment variables then
//! override the file: `NOTIFY_CHANNEL_IDS`, `NOTIFY_USER_IDS`, `CLIENT_ID`.
//! A `.env` file in the working directory is loaded first.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use herald_types::config::HeraldConfig;
use herald_types::workflow::{ChannelId, RecipientId};

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "HERALD_CONFIG";

/// Comma-separated broadcast channel ids.
pub const CHANNEL_IDS_ENV: &str = "NOTIFY_CHANNEL_IDS";

/// Comma-separated direct-message recipient ids.
pub const USER_IDS_ENV: &str = "NOTIFY_USER_IDS";

/// Application id used for slash command registration.
pub const CLIENT_ID_ENV: &str = "CLIENT_ID";

/// Bot token. Never logged.
pub const BOT_TOKEN_ENV: &str = "DISCORD_BOT_TOKEN";

/// Load `.env` from the working directory (or a parent), if present.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!("Loaded environment from {}", path.display()),
        Err(err) if err.not_found() => tracing::debug!("No .env file found"),
        Err(err) => tracing::warn!("Failed to load .env: {err}"),
    }
}

/// Resolve the config file path.
///
/// Priority: explicit path, then `HERALD_CONFIG`, then `~/.herald/herald.toml`.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".herald").join("herald.toml");
    }
    PathBuf::from(".herald").join("herald.toml")
}

/// Read and parse a config file.
///
/// - Missing file: returns [`HeraldConfig::default()`].
/// - Unreadable or malformed file: logs a warning and returns the default.
pub async fn load_config_file(path: &Path) -> HeraldConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return HeraldConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return HeraldConfig::default();
        }
    };

    match toml::from_str::<HeraldConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            HeraldConfig::default()
        }
    }
}

/// Apply environment overrides using `var` as the lookup.
///
/// A variable that is set replaces the file value entirely, even when it
/// parses to an empty list.
pub fn apply_env_overrides<F>(config: &mut HeraldConfig, var: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = var(CHANNEL_IDS_ENV) {
        config.destinations.channels = parse_id_list(&raw).into_iter().map(ChannelId).collect();
    }
    if let Some(raw) = var(USER_IDS_ENV) {
        config.destinations.recipients = parse_id_list(&raw).into_iter().map(RecipientId).collect();
    }
    if let Some(raw) = var(CLIENT_ID_ENV) {
        let id = raw.trim();
        if !id.is_empty() {
            config.discord.application_id = Some(id.to_string());
        }
    }
}

/// Load the full configuration: file, then process environment.
pub async fn load_config(explicit: Option<&Path>) -> HeraldConfig {
    let path = resolve_config_path(explicit);
    let mut config = load_config_file(&path).await;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    tracing::debug!(
        path = %path.display(),
        channels = config.destinations.channels.len(),
        recipients = config.destinations.recipients.len(),
        "configuration loaded"
    );
    config
}

/// Split a comma-separated id list, trimming entries and dropping empties.
pub fn parse_id_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// The bot token from the environment, if one is set and non-empty.
pub fn bot_token() -> Option<SecretString> {
    std::env::var(BOT_TOKEN_ENV)
        .ok()
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn load_config_file_missing_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config_file(&tmp.path().join("herald.toml")).await;
        assert!(config.destinations.channels.is_empty());
        assert_eq!(config.workflow.sweep_interval_secs, 600);
    }

    #[tokio::test]
    async fn load_config_file_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("herald.toml");
        tokio::fs::write(
            &path,
            r#"
[destinations]
channels = ["111", "222"]

[discord]
request_timeout_secs = 5
"#,
        )
        .await
        .unwrap();

        let config = load_config_file(&path).await;
        assert_eq!(config.destinations.channels.len(), 2);
        assert_eq!(config.discord.request_timeout_secs, 5);
    }

    #[tokio::test]
    async fn load_config_file_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("herald.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config_file(&path).await;
        assert!(config.destinations.channels.is_empty());
    }

    #[test]
    fn parse_id_list_trims_and_drops_empties() {
        assert_eq!(
            parse_id_list(" 111, 222 ,,333,"),
            vec!["111".to_string(), "222".to_string(), "333".to_string()]
        );
        assert!(parse_id_list("").is_empty());
        assert!(parse_id_list(" , ").is_empty());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let mut config: HeraldConfig = toml::from_str(
            r#"
[destinations]
channels = ["from-file"]
recipients = ["u-file"]
"#,
        )
        .unwrap();

        apply_env_overrides(
            &mut config,
            env(&[
                ("NOTIFY_CHANNEL_IDS", "C1,C2"),
                ("CLIENT_ID", " 4242 "),
            ]),
        );

        assert_eq!(
            config.destinations.channels,
            vec![ChannelId::new("C1"), ChannelId::new("C2")]
        );
        // Not set in the environment: file value kept.
        assert_eq!(config.destinations.recipients, vec![RecipientId::new("u-file")]);
        assert_eq!(config.discord.application_id.as_deref(), Some("4242"));
    }

    #[test]
    fn empty_channel_env_clears_channels() {
        let mut config = HeraldConfig::default();
        config.destinations.channels = vec![ChannelId::new("C1")];

        apply_env_overrides(&mut config, env(&[("NOTIFY_CHANNEL_IDS", "")]));

        assert!(!config.destinations.has_channels());
    }

    #[test]
    fn explicit_config_path_wins() {
        let path = resolve_config_path(Some(Path::new("/etc/herald/herald.toml")));
        assert_eq!(path, PathBuf::from("/etc/herald/herald.toml"));
    }
}
