/// Fire-and-forget snapshot recall.
///
/// Success means the datagram reached the OS socket. The mixer does not
/// acknowledge `/-snap/load`, so "sent but ignored" cannot be detected here.

use std::net::SocketAddr;

use tracing::{error, info, warn};

use xair_protocol::message::load_command;
use xair_protocol::{IndexBase, SnapshotIndex};

use crate::error::{RecallError, TransportError};
use crate::transport::{Endpoint, Transport};

struct Link {
    transport: Transport,
    target: SocketAddr,
}

pub struct CommandSender {
    endpoint: Option<Endpoint>,
    base: IndexBase,
    link: Option<Link>,
}

impl CommandSender {
    /// A sender with no mixer configured. Every recall returns `NotReady`.
    pub fn unconfigured() -> Self {
        Self {
            endpoint: None,
            base: IndexBase::default(),
            link: None,
        }
    }

    /// Resolve and bind, logging instead of failing. A sender that could
    /// not be set up answers every recall with `NotReady`.
    pub async fn connect(endpoint: Endpoint, base: IndexBase) -> Self {
        match Self::try_connect(endpoint.clone(), base).await {
            Ok(sender) => sender,
            Err(e) => {
                error!(endpoint = %endpoint, "Failed to create OSC client: {}", e);
                Self {
                    endpoint: Some(endpoint),
                    base,
                    link: None,
                }
            }
        }
    }

    pub async fn try_connect(endpoint: Endpoint, base: IndexBase) -> Result<Self, TransportError> {
        let target = endpoint.resolve().await?;
        let transport = Transport::bind_for(target)?;

        info!(
            endpoint = %endpoint,
            target = %target,
            index_base = ?base,
            "OSC client created"
        );

        Ok(Self {
            endpoint: Some(endpoint),
            base,
            link: Some(Link { transport, target }),
        })
    }

    pub fn is_ready(&self) -> bool {
        self.link.is_some()
    }

    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    pub fn index_base(&self) -> IndexBase {
        self.base
    }

    /// Send `/-snap/load` for a user-facing slot (1..=64).
    ///
    /// The slot is validated before anything touches the network.
    pub async fn recall(&self, slot: i64) -> Result<(), RecallError> {
        let index = SnapshotIndex::new(slot).map_err(|e| {
            warn!(slot, "Snapshot {} out of range, not sent", slot);
            e
        })?;

        let Some(link) = &self.link else {
            warn!(slot = %index, "OSC client not initialised, skipping snapshot load");
            return Err(RecallError::NotReady);
        };

        let bytes = load_command(index, self.base).encode()?;
        link.transport.send(link.target, &bytes).await?;

        info!(
            slot = %index,
            wire = self.base.to_wire(index),
            target = %link.target,
            "Snapshot recall sent"
        );
        Ok(())
    }
}
