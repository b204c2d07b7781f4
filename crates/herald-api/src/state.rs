//! Application state wiring the engine to the selected platform.
//!
//! The engine is generic over its delivery ports; AppState pins both to
//! [`PlatformClient`], which is Discord or dry-run depending on whether a
//! bot token is configured.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use herald_core::clock::SystemClock;
use herald_core::workflow::{NotificationEngine, WorkflowStore};
use herald_infra::config::{bot_token, load_config, resolve_config_path};
use herald_infra::platform::PlatformClient;
use herald_types::config::HeraldConfig;

/// Concrete engine type used by the binary.
pub type ConcreteEngine = NotificationEngine<PlatformClient, PlatformClient>;

/// Shared application state, used by CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ConcreteEngine>,
    pub store: Arc<WorkflowStore>,
    pub platform: Arc<PlatformClient>,
    pub config: Arc<HeraldConfig>,
    pub config_path: PathBuf,
}

impl AppState {
    /// Load configuration and credentials, select the platform, build the engine.
    pub async fn init(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = resolve_config_path(config_path);
        let config = load_config(Some(&config_path)).await;
        let platform = PlatformClient::from_config(&config, bot_token())?;
        Ok(Self::from_parts(config, config_path, platform))
    }

    pub fn from_parts(config: HeraldConfig, config_path: PathBuf, platform: PlatformClient) -> Self {
        let platform = Arc::new(platform);
        let store = Arc::new(WorkflowStore::new(Arc::new(SystemClock)));
        let engine = NotificationEngine::new(
            Arc::clone(&store),
            Arc::clone(&platform),
            Arc::clone(&platform),
            config.destinations.clone(),
        );

        Self {
            engine: Arc::new(engine),
            store,
            platform,
            config: Arc::new(config),
            config_path,
        }
    }
}
