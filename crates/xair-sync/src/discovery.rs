/// Snapshot name discovery.
///
/// Sends one `/-snap/NN/name` query per slot with a fixed gap between
/// sends, then drains replies until `receive_timeout` has passed since the
/// last query. Traffic during that window never extends it, so the run is
/// bounded by roughly `63 × send_interval + receive_timeout`; anything
/// arriving after the deadline is dropped with the socket.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use xair_protocol::address::{parse_name_slot, AddressError};
use xair_protocol::message::name_query;
use xair_protocol::{
    decode, Message, SnapshotIndex, SnapshotName, ValidationError, DEFAULT_RECEIVE_TIMEOUT_MS,
    DEFAULT_SEND_INTERVAL_MS, SNAPSHOT_COUNT,
};

use crate::error::DiscoveryError;
use crate::transport::{Endpoint, Received, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// Gap between consecutive queries. The mixer drops bursts, keep > 0.
    pub send_interval: Duration,
    /// Collection window after the last query.
    pub receive_timeout: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            send_interval: Duration::from_millis(DEFAULT_SEND_INTERVAL_MS),
            receive_timeout: Duration::from_millis(DEFAULT_RECEIVE_TIMEOUT_MS),
        }
    }
}

impl DiscoveryConfig {
    /// Time spent when nothing answers. Also the upper bound of a run,
    /// excluding name resolution.
    pub fn silent_duration(&self) -> Duration {
        self.send_interval * (SNAPSHOT_COUNT as u32 - 1) + self.receive_timeout
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveredSnapshot {
    pub index: SnapshotIndex,
    pub name: SnapshotName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryStatus {
    Found(usize),
    /// Mixer unreachable or blocked by a firewall
    NoReplies,
}

#[derive(Debug, Clone, Default)]
pub struct DiscoveryResult {
    /// Ascending by slot, one entry per slot
    pub entries: Vec<DiscoveredSnapshot>,
    pub elapsed: Duration,
    /// Datagrams that failed to decode
    pub malformed: usize,
    /// Decoded datagrams that were not a usable name reply
    pub ignored: usize,
}

impl DiscoveryResult {
    pub fn status(&self) -> DiscoveryStatus {
        if self.entries.is_empty() {
            DiscoveryStatus::NoReplies
        } else {
            DiscoveryStatus::Found(self.entries.len())
        }
    }

    pub fn name_of(&self, index: SnapshotIndex) -> Option<&SnapshotName> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .map(|e| &e.name)
    }

    /// `(slot, name)` pairs, ascending.
    pub fn pairs(&self) -> Vec<(u32, &str)> {
        self.entries
            .iter()
            .map(|e| (e.index.get(), e.name.as_str()))
            .collect()
    }
}

/// Why a decoded message was not accepted as a name reply.
#[derive(Debug, Error)]
enum Rejection {
    #[error("not a slot name reply: {0}")]
    Address(#[from] AddressError),
    #[error("slot out of range: {0}")]
    Slot(ValidationError),
    #[error("no string argument")]
    NoName,
    #[error("blank name")]
    BlankName,
}

fn parse_reply(msg: &Message) -> Result<(SnapshotIndex, SnapshotName), Rejection> {
    let slot = parse_name_slot(&msg.addr)?;
    let index = SnapshotIndex::new(slot as i64).map_err(Rejection::Slot)?;
    let raw = msg.first_str().ok_or(Rejection::NoName)?;
    let name = SnapshotName::new(raw).map_err(|_| Rejection::BlankName)?;
    Ok((index, name))
}

/// Per-run accumulator. Later replies for a slot replace earlier ones.
#[derive(Default)]
struct Collector {
    names: BTreeMap<SnapshotIndex, SnapshotName>,
    malformed: usize,
    ignored: usize,
}

impl Collector {
    fn accept(&mut self, data: &[u8]) {
        let msg = match decode(data) {
            Ok(msg) => msg,
            Err(e) => {
                self.malformed += 1;
                debug!(len = data.len(), "Dropping malformed packet: {}", e);
                return;
            }
        };

        match parse_reply(&msg) {
            Ok((index, name)) => {
                if let Some(previous) = self.names.insert(index, name) {
                    debug!(slot = %index, previous = %previous, "Slot answered again, keeping latest");
                }
            }
            Err(reason) => {
                self.ignored += 1;
                debug!(addr = %msg.addr, "Ignoring reply: {}", reason);
            }
        }
    }

    fn finish(self, elapsed: Duration) -> DiscoveryResult {
        DiscoveryResult {
            entries: self
                .names
                .into_iter()
                .map(|(index, name)| DiscoveredSnapshot { index, name })
                .collect(),
            elapsed,
            malformed: self.malformed,
            ignored: self.ignored,
        }
    }
}

pub struct NameDiscoverer {
    config: DiscoveryConfig,
}

impl NameDiscoverer {
    pub fn new(config: DiscoveryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> DiscoveryConfig {
        self.config
    }

    /// Query every slot on `endpoint` and collect the names that come back.
    ///
    /// Each call uses its own socket, so concurrent discoveries and recalls
    /// never share a receive queue. Errors are limited to setting up and
    /// sending; a mixer that stays silent yields an empty result.
    pub async fn discover(&self, endpoint: &Endpoint) -> Result<DiscoveryResult, DiscoveryError> {
        let started = Instant::now();
        let target = endpoint.resolve().await?;
        let transport = Transport::bind_for(target)?;

        debug!(
            endpoint = %endpoint,
            target = %target,
            interval_ms = self.config.send_interval.as_millis() as u64,
            "Sending snapshot name queries"
        );

        for (i, index) in SnapshotIndex::all().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.send_interval).await;
            }
            let bytes = name_query(index).encode()?;
            transport.send(target, &bytes).await?;
        }

        let mut collector = Collector::default();
        let deadline = tokio::time::Instant::now() + self.config.receive_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            match transport.receive(remaining).await {
                Ok(Received::Timeout) => break,
                Ok(Received::Datagram { data, from }) => {
                    if from != target {
                        collector.ignored += 1;
                        debug!(from = %from, "Ignoring datagram from unexpected source");
                        continue;
                    }
                    collector.accept(&data);
                }
                Err(e) => {
                    warn!(endpoint = %endpoint, "Ending discovery early: {}", e);
                    break;
                }
            }
        }

        let result = collector.finish(started.elapsed());
        match result.status() {
            DiscoveryStatus::Found(count) => info!(
                endpoint = %endpoint,
                count,
                malformed = result.malformed,
                ignored = result.ignored,
                elapsed_ms = result.elapsed.as_millis() as u64,
                "Snapshot names discovered"
            ),
            DiscoveryStatus::NoReplies => warn!(
                endpoint = %endpoint,
                elapsed_ms = result.elapsed.as_millis() as u64,
                "No snapshot names received (mixer unreachable or blocked by firewall?)"
            ),
        }

        Ok(result)
    }
}
