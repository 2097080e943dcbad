//! Control-surface handlers (spec §6.2). Conventional HTTP status codes
//! rather than a JSON-RPC envelope: 400 for malformed input, 404 for an
//! absent resource, 503 only where the node genuinely cannot serve a
//! request (none of the current routes hit that; reserved for when one
//! does).

use crate::error::ApiError;
use crate::http::views::*;
use crate::node::Node;
use axum::extract::{Path, State};
use axum::Json;
use ryx_params::ParamValue;
use ryx_spatial::{distance_between, SpatialConfig};
use ryx_types::{Metadata, MessageId, MessageKind};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub async fn get_status(State(node): State<Arc<Node>>) -> Json<StatusView> {
    Json(StatusView {
        node_id: node.self_id.to_string(),
        cluster_tag: node.cluster_tag.as_str().to_string(),
        uptime_secs: node.uptime_secs(),
        data_port: node.data_port,
        discovery_port: node.discovery_port,
        neighbor_count: node.discovery.all_neighbors().len(),
        diffusion_stats: node.diffusion.stats(),
    })
}

pub async fn get_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn inject_message(
    State(node): State<Arc<Node>>,
    Json(req): Json<InjectRequest>,
) -> Result<Json<MessageView>, ApiError> {
    let metadata: Metadata = req.metadata.into_iter().collect();
    let msg = node
        .diffusion
        .inject(MessageKind::new(req.kind), req.payload.into_bytes(), req.energy, req.ttl_seconds, metadata)
        .await;
    Ok(Json(MessageView::from(&msg)))
}

pub async fn list_messages(State(node): State<Arc<Node>>) -> Json<Vec<MessageView>> {
    Json(node.diffusion.all().iter().map(MessageView::from).collect())
}

pub async fn get_message(State(node): State<Arc<Node>>, Path(id): Path<String>) -> Result<Json<MessageView>, ApiError> {
    let id = MessageId::from_hex(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    node.diffusion
        .get(&id)
        .map(|m| Json(MessageView::from(&m)))
        .ok_or_else(|| ApiError::NotFound(format!("no message with id {id}")))
}

pub async fn inject_task(
    State(node): State<Arc<Node>>,
    Json(req): Json<TaskInjectRequest>,
) -> Result<Json<MessageView>, ApiError> {
    if !node.diffusion.has_executor(&req.task_type) {
        return Err(ApiError::ServiceUnavailable(format!(
            "no executor registered for task type '{}'",
            req.task_type
        )));
    }
    let mut metadata = Metadata::new();
    metadata.insert("task_type".to_string(), json!(req.task_type));
    metadata.insert("parameters".to_string(), req.parameters);
    let msg = node
        .diffusion
        .inject(MessageKind::new(MessageKind::TASK), req.data.into_bytes(), req.energy, req.ttl_seconds, metadata)
        .await;
    Ok(Json(MessageView::from(&msg)))
}

pub async fn list_results(State(node): State<Arc<Node>>) -> Json<Vec<MessageView>> {
    Json(
        node.diffusion
            .all()
            .iter()
            .filter(|m| m.kind.as_str() == MessageKind::RESULT)
            .map(MessageView::from)
            .collect(),
    )
}

pub async fn get_result(State(node): State<Arc<Node>>, Path(id): Path<String>) -> Result<Json<MessageView>, ApiError> {
    let id = MessageId::from_hex(&id).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let msg = node.diffusion.get(&id).ok_or_else(|| ApiError::NotFound(format!("no result with id {id}")))?;
    if msg.kind.as_str() != MessageKind::RESULT {
        return Err(ApiError::NotFound(format!("no result with id {id}")));
    }
    Ok(Json(MessageView::from(&msg)))
}

pub async fn get_parameters(State(node): State<Arc<Node>>) -> Json<HashMap<String, ParamValue>> {
    Json(node.policy.params().snapshot())
}

pub async fn get_parameter(State(node): State<Arc<Node>>, Path(key): Path<String>) -> Result<Json<ParamValue>, ApiError> {
    node.policy
        .params()
        .get(&key)
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no parameter named {key}")))
}

pub async fn set_parameter(
    State(node): State<Arc<Node>>,
    Path(key): Path<String>,
    Json(value): Json<ParamValue>,
) -> Result<Json<Value>, ApiError> {
    node.policy
        .params()
        .set(&key, value)
        .map(|()| Json(json!({ "ok": true })))
        .map_err(|e| ApiError::BadRequest(e.to_string()))
}

pub async fn set_parameters_batch(
    State(node): State<Arc<Node>>,
    Json(updates): Json<HashMap<String, ParamValue>>,
) -> Json<HashMap<String, Value>> {
    let results = node.policy.params().batch_set(updates);
    Json(
        results
            .into_iter()
            .map(|(k, r)| (k, r.map(|()| json!("ok")).unwrap_or_else(|e| json!({ "error": e.to_string() }))))
            .collect(),
    )
}

pub async fn get_spatial(State(node): State<Arc<Node>>) -> Json<SpatialConfig> {
    Json(node.discovery.self_spatial())
}

pub async fn set_spatial(State(node): State<Arc<Node>>, Json(cfg): Json<SpatialConfig>) -> Result<Json<Value>, ApiError> {
    cfg.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    node.discovery.set_self_spatial(cfg);
    Ok(Json(json!({ "ok": true })))
}

pub async fn get_spatial_neighbors(State(node): State<Arc<Node>>) -> Json<Vec<NeighborView>> {
    Json(node.discovery.neighbors_with_distance().iter().map(NeighborView::from).collect())
}

pub async fn get_spatial_barriers(State(node): State<Arc<Node>>) -> Json<Vec<ryx_spatial::Barrier>> {
    Json(node.barriers.list())
}

pub async fn post_spatial_distance(
    State(node): State<Arc<Node>>,
    Json(req): Json<DistanceRequest>,
) -> Json<DistanceResponse> {
    let self_spatial = node.discovery.self_spatial();
    Json(DistanceResponse {
        distance: distance_between(&self_spatial, &req.config),
    })
}

pub async fn get_topology(State(node): State<Arc<Node>>) -> Json<TopologyView> {
    let barriers = node.barriers.list();
    Json(topology_view(&node.self_id.to_string(), &node.discovery, &barriers))
}
