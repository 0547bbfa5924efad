pub mod address;
pub mod message;
pub mod snapshot;

pub use address::AddressError;
pub use message::{decode, encode, Arg, DecodeError, EncodeError, Message};
pub use snapshot::{IndexBase, SnapshotIndex, SnapshotName, ValidationError};

/// Default mixer endpoint
pub const DEFAULT_MIXER_HOST: &str = "192.168.1.15";
pub const DEFAULT_MIXER_PORT: u16 = 10024;

/// Snapshot slot domain (user-facing numbering)
pub const FIRST_SNAPSHOT: u32 = 1;
pub const LAST_SNAPSHOT: u32 = 64;
pub const SNAPSHOT_COUNT: usize = 64;

/// Discovery pacing defaults. The mixer drops control messages that
/// arrive back-to-back, so the inter-send gap must never be zero.
pub const DEFAULT_SEND_INTERVAL_MS: u64 = 5;
pub const DEFAULT_RECEIVE_TIMEOUT_MS: u64 = 500;

/// Receive buffer size for a single datagram
pub const MAX_DATAGRAM_SIZE: usize = 1536;
