//! The Communication service (spec §4.3): owns the node's single
//! datagram socket, retries outbound sends per [`Policy`], and dispatches
//! inbound datagrams to registered handlers by wire type.

use crate::error::CommError;
use crate::socket::DatagramSocket;
use crate::wire::WireEnvelope;
use ryx_behavior::Policy;
use ryx_types::Message;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Registered per wire type (`"announce"`, `"info"`, `"ca_boundary"`);
/// dispatch matches on the decoded [`WireEnvelope`] variant rather than
/// inspecting raw JSON, per the design note to prefer tagged variants
/// over reflection (spec §9).
pub trait MessageHandler: Send + Sync {
    fn handle(&self, envelope: WireEnvelope, sender: SocketAddr);
}

pub struct Communication {
    socket: Arc<dyn DatagramSocket>,
    policy: Policy,
    handlers: RwLock<HashMap<String, Arc<dyn MessageHandler>>>,
}

impl Communication {
    pub fn new(socket: Arc<dyn DatagramSocket>, policy: Policy) -> Arc<Self> {
        Arc::new(Self {
            socket,
            policy,
            handlers: RwLock::new(HashMap::new()),
        })
    }

    pub async fn register_handler(&self, wire_type: &str, handler: Arc<dyn MessageHandler>) {
        self.handlers.write().await.insert(wire_type.to_string(), handler);
    }

    /// Sends a pre-built envelope, bounding only the socket write with a
    /// timeout (spec §4.3: "timeout bounds only the socket send"). Retries
    /// `retry_count` times with [`Policy::retry_delay`] backoff on
    /// transient I/O failure; never retries a successful write that
    /// simply wasn't acknowledged, since the protocol has no acks.
    async fn send_envelope(&self, envelope: &WireEnvelope, addr: SocketAddr, timeout: Duration) -> Result<(), CommError> {
        let bytes = envelope.encode()?;
        let retry_count = self
            .policy
            .params()
            .get_int("retry_count")
            .unwrap_or(3)
            .max(0) as u32;
        let base_backoff = self
            .policy
            .params()
            .get_duration("retry_backoff_base_ms")
            .unwrap_or(Duration::from_millis(250));

        let mut last_err = None;
        for attempt in 0..=retry_count {
            match tokio::time::timeout(timeout, self.socket.send_to(&bytes, addr)).await {
                Ok(Ok(_)) => return Ok(()),
                Ok(Err(e)) => last_err = Some(CommError::Send(e)),
                Err(_) => last_err = Some(CommError::Timeout(timeout)),
            }
            if attempt < retry_count {
                tokio::time::sleep(self.policy.retry_delay(attempt, base_backoff)).await;
            }
        }
        Err(last_err.unwrap_or(CommError::Timeout(timeout)))
    }

    /// Sends an `info` envelope carrying `message`, using
    /// [`Policy::message_timeout`] scaled by the message's kind.
    pub async fn send_info(&self, addr: SocketAddr, message: &Message, base_timeout: Duration) -> Result<(), CommError> {
        let timeout = self.policy.message_timeout(&message.kind, base_timeout);
        self.send_envelope(&WireEnvelope::info(message), addr, timeout).await
    }

    pub async fn send_announce(&self, addr: SocketAddr, payload: crate::wire::AnnouncePayload, base_timeout: Duration) -> Result<(), CommError> {
        self.send_envelope(&WireEnvelope::Announce(payload), addr, base_timeout).await
    }

    /// Runs until the socket errs fatally. A single malformed or
    /// unrecognized datagram is logged and dropped; it never terminates
    /// the loop (spec §7: peer-side malformed input is non-fatal).
    pub async fn run_receive_loop(self: Arc<Self>) -> std::io::Result<()> {
        let mut buf = vec![0u8; 64 * 1024];
        loop {
            let (n, from) = self.socket.recv_from(&mut buf).await?;
            let Some(envelope) = WireEnvelope::decode(&buf[..n]) else {
                debug!(?from, "dropping undecodable datagram");
                continue;
            };
            let wire_type = envelope.wire_type().to_string();
            let handler = self.handlers.read().await.get(&wire_type).cloned();
            match handler {
                Some(handler) => handler.handle(envelope, from),
                None => warn!(wire_type, ?from, "no handler registered for wire type"),
            }
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}
