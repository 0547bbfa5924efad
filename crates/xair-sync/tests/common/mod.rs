//! Simulated mixer for integration tests.
//!
//! Binds a loopback UDP socket, records every `/-snap/load` it receives and
//! answers name queries according to a script. Slots without a script
//! entry stay silent, like a mixer dropping packets. A script can also make
//! the mixer chatter unsolicited traffic or have a stranger socket answer
//! on its behalf.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::task::JoinHandle;

use xair_protocol::address::parse_name_slot;
use xair_protocol::{decode, encode, Arg, Message};
use xair_sync::{DiscoveryConfig, Endpoint};

/// Fast pacing so the suite stays quick.
pub fn fast_discovery() -> DiscoveryConfig {
    DiscoveryConfig {
        send_interval: Duration::from_millis(1),
        receive_timeout: Duration::from_millis(250),
    }
}

/// Replies to send when a given slot is queried, in order.
#[derive(Debug, Clone, Default)]
pub struct Script {
    on_query: HashMap<u32, Vec<Vec<u8>>>,
    from_stranger: HashMap<u32, Vec<Vec<u8>>>,
    chatter: Option<Duration>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a query for `slot` with a name reply.
    pub fn name(self, slot: u32, name: &str) -> Self {
        let bytes = encode(&format!("/-snap/{:02}/name", slot), &[Arg::Str(name.to_string())])
            .expect("reply should encode");
        self.raw(slot, bytes)
    }

    /// Answer a query for `slot` with arbitrary bytes.
    pub fn raw(mut self, slot: u32, bytes: Vec<u8>) -> Self {
        self.on_query.entry(slot).or_default().push(bytes);
        self
    }

    /// Answer a query for `slot` from a different local socket.
    pub fn stranger(mut self, slot: u32, bytes: Vec<u8>) -> Self {
        self.from_stranger.entry(slot).or_default().push(bytes);
        self
    }

    /// After the first query, send `/meters/1` to the querier every `every`.
    pub fn chatter(mut self, every: Duration) -> Self {
        self.chatter = Some(every);
        self
    }
}

pub struct SimulatedMixer {
    addr: SocketAddr,
    loads: Arc<Mutex<Vec<Message>>>,
    queries: Arc<AtomicUsize>,
    handle: JoinHandle<()>,
    chatter: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SimulatedMixer {
    pub async fn start(script: Script) -> Self {
        let socket = Arc::new(UdpSocket::bind("127.0.0.1:0").await.expect("bind simulated mixer"));
        let stranger = UdpSocket::bind("127.0.0.1:0").await.expect("bind stranger");
        let addr = socket.local_addr().unwrap();
        let loads = Arc::new(Mutex::new(Vec::new()));
        let queries = Arc::new(AtomicUsize::new(0));
        let chatter = Arc::new(Mutex::new(None));

        let handle = {
            let loads = Arc::clone(&loads);
            let queries = Arc::clone(&queries);
            let chatter = Arc::clone(&chatter);
            tokio::spawn(async move {
                let mut buf = [0u8; 1536];
                loop {
                    let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                        continue;
                    };
                    let Ok(msg) = decode(&buf[..len]) else {
                        continue;
                    };

                    if msg.addr == "/-snap/load" {
                        loads.lock().unwrap().push(msg);
                        continue;
                    }

                    if let Ok(slot) = parse_name_slot(&msg.addr) {
                        if msg.args.is_empty() {
                            queries.fetch_add(1, Ordering::SeqCst);
                            for reply in script.on_query.get(&slot).into_iter().flatten() {
                                let _ = socket.send_to(reply, from).await;
                            }
                            for reply in script.from_stranger.get(&slot).into_iter().flatten() {
                                let _ = stranger.send_to(reply, from).await;
                            }
                            if let Some(every) = script.chatter {
                                let mut running = chatter.lock().unwrap();
                                if running.is_none() {
                                    *running = Some(spawn_chatter(Arc::clone(&socket), from, every));
                                }
                            }
                        }
                    }
                }
            })
        };

        Self {
            addr,
            loads,
            queries,
            handle,
            chatter,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.addr.ip().to_string(), self.addr.port())
    }

    pub fn loads(&self) -> Vec<Message> {
        self.loads.lock().unwrap().clone()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Poll until `count` loads have arrived or `timeout` passes.
    pub async fn wait_for_loads(&self, count: usize, timeout: Duration) -> Vec<Message> {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.loads.lock().unwrap().len() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.loads()
    }
}

impl Drop for SimulatedMixer {
    fn drop(&mut self) {
        self.handle.abort();
        if let Some(chatter) = self.chatter.lock().unwrap().take() {
            chatter.abort();
        }
    }
}

fn spawn_chatter(socket: Arc<UdpSocket>, to: SocketAddr, every: Duration) -> JoinHandle<()> {
    let meters = encode("/meters/1", &[Arg::Float(0.5)]).expect("meters should encode");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;
            let _ = socket.send_to(&meters, to).await;
        }
    })
}

/// A bound socket that never answers, so no ICMP unreachable comes back.
pub async fn silent_endpoint() -> (UdpSocket, Endpoint) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    (socket, Endpoint::new(addr.ip().to_string(), addr.port()))
}

/// Receive and decode one datagram, or `None` on timeout.
pub async fn recv_message(socket: &UdpSocket, timeout: Duration) -> Option<Message> {
    let mut buf = [0u8; 1536];
    match tokio::time::timeout(timeout, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(decode(&buf[..len]).expect("sender produced a valid packet")),
        _ => None,
    }
}
