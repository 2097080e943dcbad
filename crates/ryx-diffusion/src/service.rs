//! The Diffusion service (spec §4.4): injection, peer reception,
//! forwarding fan-out, and the periodic cleanup sweep.

use crate::eligibility::is_eligible;
use crate::executor::{Task, TaskRegistry};
use crate::store::{MessageStore, StoreStats};
use parking_lot::RwLock as PlRwLock;
use ryx_behavior::Policy;
use ryx_comm::Communication;
use ryx_discovery::Discovery;
use ryx_spatial::BarrierRegistry;
use ryx_types::clock::Clock;
use ryx_types::{hash_payload, Message, MessageId, MessageKind, Metadata, NodeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub struct Diffusion {
    self_id: NodeId,
    store: MessageStore,
    policy: Policy,
    discovery: Arc<Discovery>,
    communication: Arc<Communication>,
    barriers: Arc<BarrierRegistry>,
    clock: Arc<dyn Clock>,
    task_registry: PlRwLock<TaskRegistry>,
}

impl Diffusion {
    pub fn new(
        self_id: NodeId,
        policy: Policy,
        discovery: Arc<Discovery>,
        communication: Arc<Communication>,
        barriers: Arc<BarrierRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            self_id,
            store: MessageStore::new(),
            policy,
            discovery,
            communication,
            barriers,
            clock,
            task_registry: PlRwLock::new(TaskRegistry::new()),
        })
    }

    pub fn register_executor(&self, executor: Box<dyn crate::executor::TaskExecutor>) {
        self.task_registry.write().register(executor);
    }

    /// Whether a task of `task_type` has a registered executor to dispatch
    /// to. Used by the control surface to reject a task injection the node
    /// could never service, rather than accepting it only to have
    /// `dispatch_task` silently log and drop it later.
    pub fn has_executor(&self, task_type: &str) -> bool {
        self.task_registry.read().lookup(task_type).is_some()
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Inject (spec §4.4 steps 1-4). `ttl_seconds` is a duration relative
    /// to now; the behavior policy's class-aware `ttl_scale` is applied
    /// to that duration before it is added to the current time to produce
    /// the stored absolute `ttl` field.
    pub async fn inject(
        self: &Arc<Self>,
        kind: MessageKind,
        payload: Vec<u8>,
        energy: f64,
        ttl_seconds: u64,
        metadata: Metadata,
    ) -> Message {
        let id = hash_payload(&payload);
        if let Some(existing) = self.store.get(&id) {
            debug!(%id, "duplicate injection returns existing record");
            return existing;
        }

        let now = self.clock.now_unix();
        let effective_ttl = self.policy.ttl_scale(&kind, ttl_seconds);
        let msg = Message::inject(self.self_id.clone(), kind, payload, energy, now + effective_ttl, now, metadata);
        let (stored, inserted) = self.store.insert_if_absent(msg);
        if inserted && stored.energy > 0.0 {
            self.spawn_forward(stored.clone());
        }
        stored
    }

    /// Receive from a peer (spec §4.4): dedup by id, dispatch to a task
    /// executor if applicable, then forward using this node's own
    /// identity (not the sender's).
    pub async fn receive_from_peer(self: &Arc<Self>, msg: Message) {
        let id = msg.id;
        let (stored, inserted) = self.store.insert_if_absent(msg);
        if !inserted {
            debug!(%id, "duplicate reception dropped");
            return;
        }
        if stored.kind.as_str() == MessageKind::TASK {
            self.dispatch_task(&stored).await;
        }
        if stored.energy > 0.0 {
            self.spawn_forward(stored);
        }
    }

    /// When a `task` message is stored, looks up an executor by
    /// `task.type` (carried in metadata) and, on success, injects the
    /// result at a low energy — spec §4.4: "enabling consensus by content
    /// address: identical outputs converge to the same id".
    async fn dispatch_task(self: &Arc<Self>, msg: &Message) {
        let Some(task_type) = msg.metadata.get("task_type").and_then(|v| v.as_str()) else {
            warn!(id = %msg.id, "task message missing task_type metadata, skipping dispatch");
            return;
        };
        let parameters = msg.metadata.get("parameters").cloned().unwrap_or(serde_json::Value::Null);
        let task = Task {
            task_type: task_type.to_string(),
            data: msg.payload.clone(),
            parameters,
        };

        let outcome = {
            let registry = self.task_registry.read();
            registry.lookup(&task_type.to_string()).map(|executor| executor.execute(&task))
        };

        match outcome {
            Some(Ok(result)) => {
                self.inject(MessageKind::new(MessageKind::RESULT), result, 1.0, 300, Metadata::new()).await;
            }
            Some(Err(e)) => warn!(id = %msg.id, task_type, error = %e, "task executor failed"),
            None => warn!(id = %msg.id, task_type, "no executor registered for task type"),
        }
    }

    fn spawn_forward(self: &Arc<Self>, msg: Message) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            this.forward(&msg).await;
        });
    }

    /// Forward to every eligible neighbor (spec §4.4). Each send is
    /// best-effort; failures are recorded as a per-neighbor fault sample
    /// and the message is never re-queued.
    async fn forward(&self, msg: &Message) {
        let neighbors = self.discovery.all_neighbors();
        let self_zone = self.discovery.self_spatial().zone;
        let now = self.clock.now_unix();
        let base_decay = self.policy.params().get_float("base_energy_decay").unwrap_or(1.0);
        let base_timeout = self
            .policy
            .params()
            .get_duration("message_timeout_ms")
            .unwrap_or(Duration::from_millis(2000));
        let learning_rate = self.policy.params().get_float("learning_rate").unwrap_or(0.1);

        for neighbor in neighbors {
            if !is_eligible(msg, &neighbor, self_zone.as_deref(), &self.policy, &self.barriers, now) {
                continue;
            }
            let decay = self.policy.energy_decay(msg, &neighbor.node_id, base_decay);
            let forwarded = msg.forwarded_copy(&self.self_id, decay);
            let Ok(addr) = format!("{}:{}", neighbor.address, neighbor.port).parse() else {
                warn!(neighbor = %neighbor.node_id, "unparseable neighbor address, skipping");
                continue;
            };

            match self.communication.send_info(addr, &forwarded, base_timeout).await {
                Ok(()) => self.policy.metrics().record_fault_sample(&neighbor.node_id, msg.kind.as_str(), true, now, learning_rate),
                Err(e) => {
                    self.policy.metrics().record_fault_sample(&neighbor.node_id, msg.kind.as_str(), false, now, learning_rate);
                    warn!(neighbor = %neighbor.node_id, error = %e, "forward send failed");
                }
            }
        }
    }

    /// The cleanup sweep (spec §4.4): cadence governed by
    /// `Policy::cleanup_interval`, batch size bounded by
    /// `cleanup_batch_cap`, critical/emergency/safety messages never
    /// eagerly removed.
    pub fn run_cleanup(&self, memory_pressure: f64) -> usize {
        let batch_cap = self.policy.params().get_int("cleanup_batch_cap").unwrap_or(500).max(0) as usize;
        let now = self.clock.now_unix();
        self.store.cleanup_where(batch_cap, |msg| self.policy.should_cleanup_message(msg, memory_pressure, now))
    }

    pub fn cleanup_interval(&self, current: Duration, load: f64) -> Duration {
        self.policy.cleanup_interval(current, load)
    }

    pub fn get(&self, id: &MessageId) -> Option<Message> {
        self.store.get(id)
    }

    pub fn all(&self) -> Vec<Message> {
        self.store.all()
    }

    pub fn count_by_kind(&self) -> HashMap<String, usize> {
        self.store.count_by_kind()
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ryx_behavior::AdaptiveMetrics;
    use ryx_comm::{Communication, DatagramSocket};
    use ryx_discovery::AnnounceTargets;
    use ryx_params::{ParamValue, Parameters};
    use ryx_spatial::SpatialConfig;
    use ryx_types::clock::test_support::ControllableClock;
    use ryx_types::ClusterTag;

    struct NullSocket;
    #[async_trait::async_trait]
    impl DatagramSocket for NullSocket {
        async fn send_to(&self, bytes: &[u8], _addr: std::net::SocketAddr) -> std::io::Result<usize> {
            Ok(bytes.len())
        }
        async fn recv_from(&self, _buf: &mut [u8]) -> std::io::Result<(usize, std::net::SocketAddr)> {
            std::future::pending().await
        }
        fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
            "127.0.0.1:0".parse().map_err(|_| std::io::Error::new(std::io::ErrorKind::Other, "bad addr"))
        }
    }

    fn diffusion() -> Arc<Diffusion> {
        let params = Arc::new(Parameters::with_defaults());
        params.set("max_neighbors", ParamValue::Int(20)).unwrap();
        let policy = Policy::new(params.clone(), Arc::new(AdaptiveMetrics::new()));
        let discovery = Arc::new(Discovery::new(
            NodeId::new("self"),
            ClusterTag::default(),
            SpatialConfig::none(),
            policy.clone(),
            AnnounceTargets::default_dev(),
        ));
        let communication = Communication::new(Arc::new(NullSocket), policy.clone());
        let barriers = Arc::new(BarrierRegistry::empty());
        let clock = Arc::new(ControllableClock::new(1000));
        Diffusion::new(NodeId::new("self"), policy, discovery, communication, barriers, clock)
    }

    #[test]
    fn has_executor_reflects_registration() {
        let d = diffusion();
        assert!(!d.has_executor("word_count"));
        struct Echo;
        impl crate::executor::TaskExecutor for Echo {
            fn kind(&self) -> &str {
                "word_count"
            }
            fn execute(&self, task: &crate::executor::Task) -> Result<Vec<u8>, crate::executor::ExecutorError> {
                Ok(task.data.clone())
            }
        }
        d.register_executor(Box::new(Echo));
        assert!(d.has_executor("word_count"));
        assert!(!d.has_executor("unknown_kind"));
    }

    #[tokio::test]
    async fn inject_stores_with_hops_zero() {
        let d = diffusion();
        let msg = d.inject(MessageKind::new("text"), b"hello".to_vec(), 3.0, 300, Metadata::new()).await;
        assert_eq!(msg.hops, 0);
        assert_eq!(d.store().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_injection_returns_existing_record() {
        let d = diffusion();
        let first = d.inject(MessageKind::new("text"), b"hello".to_vec(), 3.0, 300, Metadata::new()).await;
        let second = d.inject(MessageKind::new("text"), b"hello".to_vec(), 3.0, 300, Metadata::new()).await;
        assert_eq!(first.id, second.id);
        assert_eq!(d.store().len(), 1);
    }

    #[tokio::test]
    async fn zero_energy_injection_is_stored_but_never_forwarded() {
        let d = diffusion();
        let msg = d.inject(MessageKind::new("text"), b"quiet".to_vec(), 0.0, 300, Metadata::new()).await;
        assert_eq!(msg.energy, 0.0);
        assert_eq!(d.store().len(), 1);
    }

    #[tokio::test]
    async fn receiving_same_message_twice_is_idempotent() {
        let d = diffusion();
        let msg = Message::inject(NodeId::new("peer"), MessageKind::new("text"), b"x".to_vec(), 3.0, 2000, 1000, Metadata::new());
        d.receive_from_peer(msg.clone()).await;
        d.receive_from_peer(msg).await;
        assert_eq!(d.store().len(), 1);
    }

    #[tokio::test]
    async fn critical_ttl_scaled_triple_routine_halved() {
        let d = diffusion();
        let critical = d.inject(MessageKind::new("critical"), b"c".to_vec(), 3.0, 1200, Metadata::new()).await;
        let routine = d.inject(MessageKind::new("routine"), b"r".to_vec(), 3.0, 1200, Metadata::new()).await;
        assert_eq!(critical.ttl, 1000 + 3600);
        assert_eq!(routine.ttl, 1000 + 600);
    }
}
