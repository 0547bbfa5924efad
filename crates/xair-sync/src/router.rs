/// Scene-change entry point.
///
/// The host application forwards "active scene is now S" events here. The
/// router owns the sender for the current configuration epoch and swaps it
/// out only when the mixer address or index base changes.

use tracing::{debug, info, warn};

use xair_protocol::{IndexBase, SnapshotIndex};

use crate::config::SyncConfig;
use crate::error::{RecallError, SceneMapError};
use crate::scenes::SceneMap;
use crate::sender::CommandSender;
use crate::transport::Endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneOutcome {
    /// Master switch is off
    Disabled,
    /// Same scene as the last one handled
    Repeated,
    /// No mapping for this scene
    Unmapped,
    Recalled(SnapshotIndex),
}

pub struct SceneRouter {
    enabled: bool,
    endpoint: Endpoint,
    scenes: SceneMap,
    sender: CommandSender,
    last_scene: Option<String>,
}

impl SceneRouter {
    pub async fn new(config: &SyncConfig) -> Result<Self, SceneMapError> {
        let scenes = config.scene_map()?;
        let endpoint = config.endpoint();
        let sender = CommandSender::connect(endpoint.clone(), config.mixer.index_base).await;

        info!(
            endpoint = %endpoint,
            enabled = config.enabled,
            mappings = scenes.len(),
            "Scene router ready"
        );

        Ok(Self {
            enabled: config.enabled,
            endpoint,
            scenes,
            sender,
            last_scene: None,
        })
    }

    /// Apply a changed configuration. The sender is only rebuilt when the
    /// endpoint or index base differ (or the previous one never came up).
    /// On a bad mapping the previous mapping stays active and the error is
    /// returned; the rest of the configuration is still applied.
    pub async fn reconfigure(&mut self, config: &SyncConfig) -> Result<(), SceneMapError> {
        self.enabled = config.enabled;

        let endpoint = config.endpoint();
        let base = config.mixer.index_base;
        if let Some(reason) = self.reconnect_reason(&endpoint, base) {
            info!(old = %self.endpoint, new = %endpoint, ?base, "Reconnecting: {}", reason);
            self.sender = CommandSender::connect(endpoint.clone(), base).await;
            self.endpoint = endpoint;
        }

        let scenes = config.scene_map().map_err(|e| {
            warn!("Keeping previous scene mapping: {}", e);
            e
        })?;
        self.scenes = scenes;

        info!(
            enabled = self.enabled,
            mappings = self.scenes.len(),
            "Settings updated"
        );
        Ok(())
    }

    fn reconnect_reason(&self, endpoint: &Endpoint, base: IndexBase) -> Option<&'static str> {
        if *endpoint != self.endpoint {
            Some("mixer endpoint changed")
        } else if base != self.sender.index_base() {
            Some("index base changed")
        } else if !self.sender.is_ready() {
            Some("previous connection never came up")
        } else {
            None
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn scenes(&self) -> &SceneMap {
        &self.scenes
    }

    pub fn sender(&self) -> &CommandSender {
        &self.sender
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Handle "active scene changed to `scene`".
    pub async fn on_scene_changed(&mut self, scene: &str) -> Result<SceneOutcome, RecallError> {
        if !self.enabled {
            return Ok(SceneOutcome::Disabled);
        }

        if self.last_scene.as_deref() == Some(scene) {
            debug!(scene, "Scene unchanged");
            return Ok(SceneOutcome::Repeated);
        }
        self.last_scene = Some(scene.to_string());

        debug!(scene, "Scene changed");

        let Some(index) = self.scenes.get(scene) else {
            debug!(scene, "No mixer mapping for scene");
            return Ok(SceneOutcome::Unmapped);
        };

        match self.sender.recall(index.get() as i64).await {
            Ok(()) => Ok(SceneOutcome::Recalled(index)),
            Err(e) => {
                // Allow the same scene to retry on its next activation
                self.last_scene = None;
                Err(e)
            }
        }
    }
}
