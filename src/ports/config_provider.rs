use async_trait::async_trait;
use eyre::Result;
use tokio::sync::mpsc;

use crate::config::models::ServerConfig;

/// Source of [`ServerConfig`] snapshots that can announce changes.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Load the current configuration.
    async fn load_config(&self) -> Result<ServerConfig>;

    /// Take the change-notification channel.
    ///
    /// Each signal means "call `load_config` again". Only the first caller
    /// receives the channel; later calls get `None`.
    fn watch(&self) -> Option<mpsc::Receiver<()>>;
}
