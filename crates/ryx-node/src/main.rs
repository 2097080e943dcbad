//! Entry point: parse process args (spec §6.3), build the node, run its
//! task set and control surface until interrupted.

use clap::Parser;
use ryx_node::{Node, NodeArgs, NodeConfig};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = NodeArgs::parse();
    let config = match NodeConfig::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "invalid startup configuration");
            std::process::exit(1);
        }
    };

    let control_port = config.control_port;
    let node = Node::build(config).await?;
    info!(node_id = %node.self_id, "ryx node starting");

    let mut handles = node.spawn_tasks();

    let http_addr = std::net::SocketAddr::from(([0, 0, 0, 0], control_port));
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    let router = ryx_node::http::router(node.clone());
    handles.push(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            error!(error = %e, "control surface terminated");
        }
    }));

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    node.shutdown();
    for handle in handles {
        handle.abort();
    }

    Ok(())
}
