//! Node wiring (spec §9): Parameters -> Behavior -> Spatial -> Communication
//! -> Discovery -> Diffusion, with handlers registered after construction
//! to avoid a dependency cycle between Communication and the components
//! that consume its inbound dispatch.

use crate::config::NodeConfig;
use crate::demos::word_count::WordCountExecutor;
use ryx_behavior::{AdaptiveMetrics, Policy};
use ryx_comm::{Communication, MessageHandler, UdpDatagramSocket, WireEnvelope};
use ryx_diffusion::Diffusion;
use ryx_discovery::{discovery_port, Discovery};
use ryx_params::{ParamValue, Parameters};
use ryx_spatial::BarrierRegistry;
use ryx_types::clock::{Clock, SystemClock};
use ryx_types::{ClusterTag, NodeId};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

struct AnnounceHandler {
    discovery: Arc<Discovery>,
    clock: Arc<dyn Clock>,
}

impl MessageHandler for AnnounceHandler {
    fn handle(&self, envelope: WireEnvelope, sender: SocketAddr) {
        let WireEnvelope::Announce(payload) = envelope else {
            return;
        };
        let now = self.clock.monotonic();
        match self.discovery.handle_announce(&payload, sender.ip().to_string(), now) {
            Ok(true) => {}
            Ok(false) => warn!(node_id = %payload.node_id, "neighbor table full, candidate not admitted"),
            Err(e) => warn!(node_id = %payload.node_id, error = %e, "announcement rejected"),
        }
    }
}

struct InfoHandler {
    diffusion: Arc<Diffusion>,
}

impl MessageHandler for InfoHandler {
    fn handle(&self, envelope: WireEnvelope, _sender: SocketAddr) {
        let WireEnvelope::Info(wire) = envelope else {
            return;
        };
        match wire.into_message() {
            Ok(msg) => {
                let diffusion = self.diffusion.clone();
                tokio::spawn(async move { diffusion.receive_from_peer(msg).await });
            }
            Err(e) => warn!(error = %e, "undecodable info payload"),
        }
    }
}

struct CaBoundaryHandler;

impl MessageHandler for CaBoundaryHandler {
    fn handle(&self, _envelope: WireEnvelope, _sender: SocketAddr) {
        // No CA engine is implemented; the boundary carrier is accepted
        // on the wire (spec §6.1) but otherwise ignored.
    }
}

pub struct Node {
    pub self_id: NodeId,
    pub cluster_tag: ClusterTag,
    pub policy: Policy,
    pub barriers: Arc<BarrierRegistry>,
    pub clock: Arc<dyn Clock>,
    pub data_comm: Arc<Communication>,
    pub discovery_comm: Arc<Communication>,
    pub discovery: Arc<Discovery>,
    pub diffusion: Arc<Diffusion>,
    pub data_port: u16,
    pub discovery_port: u16,
    pub control_port: u16,
    pub started_at: u64,
    shutdown: broadcast::Sender<()>,
}

impl Node {
    pub async fn build(config: NodeConfig) -> anyhow::Result<Arc<Self>> {
        let params = Arc::new(Parameters::with_defaults());
        for (key, value) in config.param_overrides {
            if let Err(e) = params.set(&key, value) {
                warn!(key, error = %e, "rejecting malformed parameter override");
            }
        }
        let policy = Policy::new(params, Arc::new(AdaptiveMetrics::new()));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let barriers = Arc::new(BarrierRegistry::new(config.barriers));

        let discovery_port_value = discovery_port(config.data_port);
        let data_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), config.data_port);
        let discovery_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), discovery_port_value);

        let data_socket = UdpDatagramSocket::bind(data_addr).await?;
        let discovery_socket = UdpDatagramSocket::bind(discovery_addr).await?;

        let data_comm = Communication::new(data_socket, policy.clone());
        let discovery_comm = Communication::new(discovery_socket, policy.clone());

        let discovery = Arc::new(Discovery::new(
            config.self_id.clone(),
            config.cluster_tag.clone(),
            config.spatial,
            policy.clone(),
            config.announce_targets,
        ));

        let diffusion = Diffusion::new(
            config.self_id.clone(),
            policy.clone(),
            discovery.clone(),
            data_comm.clone(),
            barriers.clone(),
            clock.clone(),
        );
        diffusion.register_executor(Box::new(WordCountExecutor));

        data_comm.register_handler("info", Arc::new(InfoHandler { diffusion: diffusion.clone() })).await;
        data_comm.register_handler("ca_boundary", Arc::new(CaBoundaryHandler)).await;
        discovery_comm
            .register_handler("announce", Arc::new(AnnounceHandler { discovery: discovery.clone(), clock: clock.clone() }))
            .await;

        let (shutdown, _) = broadcast::channel(1);
        let started_at = clock.now_unix();

        info!(node_id = %config.self_id, data_port = config.data_port, discovery_port = discovery_port_value, "node initialized");

        Ok(Arc::new(Self {
            self_id: config.self_id,
            cluster_tag: config.cluster_tag,
            policy,
            barriers,
            clock,
            data_comm,
            discovery_comm,
            discovery,
            diffusion,
            data_port: config.data_port,
            discovery_port: discovery_port_value,
            control_port: config.control_port,
            started_at,
            shutdown,
        }))
    }

    pub fn uptime_secs(&self) -> u64 {
        self.clock.now_unix().saturating_sub(self.started_at)
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown.send(());
    }

    /// Spawns the long-lived task set from spec §5: two receive loops plus
    /// Discovery's announce/stale-cleanup/optimization timers and
    /// Diffusion's cleanup timer. Receive loops are aborted on shutdown
    /// (they have no internal suspension to observe a signal at); timer
    /// loops exit on their own next tick via `select!`.
    pub fn spawn_tasks(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();

        let data_receive = {
            let comm = self.data_comm.clone();
            tokio::spawn(async move {
                if let Err(e) = comm.run_receive_loop().await {
                    warn!(error = %e, "data receive loop terminated");
                }
            })
        };
        handles.push(data_receive);

        let discovery_receive = {
            let comm = self.discovery_comm.clone();
            tokio::spawn(async move {
                if let Err(e) = comm.run_receive_loop().await {
                    warn!(error = %e, "discovery receive loop terminated");
                }
            })
        };
        handles.push(discovery_receive);

        handles.push(self.spawn_announce_timer());
        handles.push(self.spawn_stale_sweep_timer());
        handles.push(self.spawn_optimization_timer());
        handles.push(self.spawn_cleanup_timer());

        handles
    }

    fn spawn_announce_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        let mut shutdown = this.shutdown.subscribe();
        tokio::spawn(async move {
            let period = this
                .policy
                .params()
                .get_duration("announce_interval_ms")
                .unwrap_or(Duration::from_secs(5));
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => this.run_announce_tick().await,
                    _ = shutdown.recv() => break,
                }
            }
        })
    }

    async fn run_announce_tick(&self) {
        let now = self.clock.now_unix();
        let payload = self.discovery.build_announce_payload(self.data_port, now);
        for target in self.discovery.targets() {
            if let Err(e) = self.discovery_comm.send_announce(target, payload.clone(), Duration::from_millis(500)).await {
                tracing::debug!(%target, error = %e, "announce send failed");
            }
        }
    }

    fn spawn_stale_sweep_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        let mut shutdown = this.shutdown.subscribe();
        tokio::spawn(async move {
            let period = this
                .policy
                .params()
                .get_duration("stale_sweep_interval_ms")
                .unwrap_or(Duration::from_secs(30));
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => { this.discovery.run_stale_sweep(this.clock.now_unix()); }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }

    fn spawn_optimization_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        let mut shutdown = this.shutdown.subscribe();
        tokio::spawn(async move {
            let period = this
                .policy
                .params()
                .get_duration("optimization_interval_ms")
                .unwrap_or(Duration::from_secs(60));
            let mut interval = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = interval.tick() => { this.discovery.run_optimization(); }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }

    fn spawn_cleanup_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let this = self.clone();
        let mut shutdown = this.shutdown.subscribe();
        tokio::spawn(async move {
            let mut period = this
                .policy
                .params()
                .get_duration("cleanup_interval_ms")
                .unwrap_or(Duration::from_secs(10));
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(period) => {
                        let load = this.policy.metrics().current_load();
                        this.diffusion.run_cleanup(load);
                        period = this.diffusion.cleanup_interval(period, load);
                    }
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}
