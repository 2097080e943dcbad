//! The HTTP control surface (spec §6.2): a conventional REST API over the
//! node's state, distinct from the peer wire protocol in `ryx-comm`.

pub mod handlers;
pub mod views;

use crate::node::Node;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/status", get(handlers::get_status))
        .route("/health", get(handlers::get_health))
        .route("/messages", get(handlers::list_messages).post(handlers::inject_message))
        .route("/messages/:id", get(handlers::get_message))
        .route("/tasks", post(handlers::inject_task))
        .route("/results", get(handlers::list_results))
        .route("/results/:id", get(handlers::get_result))
        .route("/parameters", get(handlers::get_parameters).post(handlers::set_parameters_batch))
        .route(
            "/parameters/:key",
            get(handlers::get_parameter).put(handlers::set_parameter),
        )
        .route("/spatial", get(handlers::get_spatial).put(handlers::set_spatial))
        .route("/spatial/neighbors", get(handlers::get_spatial_neighbors))
        .route("/spatial/barriers", get(handlers::get_spatial_barriers))
        .route("/spatial/distance", post(handlers::post_spatial_distance))
        .route("/topology", get(handlers::get_topology))
        .with_state(node)
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
