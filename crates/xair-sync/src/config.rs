use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use xair_protocol::{
    IndexBase, DEFAULT_MIXER_HOST, DEFAULT_MIXER_PORT, DEFAULT_RECEIVE_TIMEOUT_MS,
    DEFAULT_SEND_INTERVAL_MS,
};

use crate::discovery::DiscoveryConfig;
use crate::error::{ConfigError, SceneMapError};
use crate::scenes::SceneMap;
use crate::transport::Endpoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Master on/off switch for scene-driven recalls
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Raw JSON mapping; when non-blank it takes precedence over `[scenes]`
    #[serde(default)]
    pub scene_map_json: Option<String>,
    #[serde(default)]
    pub mixer: MixerSection,
    #[serde(default)]
    pub discovery: DiscoverySection,
    /// Scene name → snapshot slot (1-64)
    #[serde(default)]
    pub scenes: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub index_base: IndexBase,
}

impl Default for MixerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            index_base: IndexBase::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoverySection {
    #[serde(default = "default_send_interval")]
    pub send_interval_ms: u64,
    #[serde(default = "default_receive_timeout")]
    pub receive_timeout_ms: u64,
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            send_interval_ms: default_send_interval(),
            receive_timeout_ms: default_receive_timeout(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            scene_map_json: None,
            mixer: MixerSection::default(),
            discovery: DiscoverySection::default(),
            scenes: BTreeMap::new(),
        }
    }
}

// Default value functions
fn default_true() -> bool { true }
fn default_host() -> String { DEFAULT_MIXER_HOST.to_string() }
fn default_port() -> u16 { DEFAULT_MIXER_PORT }
fn default_send_interval() -> u64 { DEFAULT_SEND_INTERVAL_MS }
fn default_receive_timeout() -> u64 { DEFAULT_RECEIVE_TIMEOUT_MS }

impl SyncConfig {
    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml(&raw)
    }

    /// Like [`SyncConfig::load`], but a missing file yields the defaults.
    pub async fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        match Self::load(path).await {
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                info!(path = ?path, "No config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.mixer.host.as_str(), self.mixer.port)
    }

    /// A zero send interval is bumped to 1 ms; the mixer drops unpaced bursts.
    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            send_interval: Duration::from_millis(self.discovery.send_interval_ms.max(1)),
            receive_timeout: Duration::from_millis(self.discovery.receive_timeout_ms.max(1)),
        }
    }

    /// Effective scene mapping: the JSON blob if present, else `[scenes]`.
    pub fn scene_map(&self) -> Result<SceneMap, SceneMapError> {
        match self.scene_map_json.as_deref() {
            Some(raw) if !raw.trim().is_empty() => SceneMap::from_json(raw),
            _ => Ok(SceneMap::from_entries(
                self.scenes.iter().map(|(name, slot)| (name.as_str(), *slot)),
            )),
        }
    }
}
