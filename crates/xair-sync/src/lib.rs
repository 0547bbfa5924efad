pub mod config;
pub mod discovery;
pub mod error;
pub mod router;
pub mod scenes;
pub mod sender;
pub mod transport;

pub use config::SyncConfig;
pub use discovery::{DiscoveredSnapshot, DiscoveryConfig, DiscoveryResult, DiscoveryStatus, NameDiscoverer};
pub use error::{ConfigError, DiscoveryError, RecallError, SceneMapError, TransportError};
pub use router::{SceneOutcome, SceneRouter};
pub use scenes::SceneMap;
pub use sender::CommandSender;
pub use transport::Endpoint;
