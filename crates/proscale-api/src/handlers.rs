//! REST API handlers.
//!
//! Each handler reads/writes via `StateStore` and returns JSON responses.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use proscale_core::{ClientError, ConfigData, ConfigStore, ScaleTarget, TargetKind};
use proscale_state::*;
use tracing::info;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

fn internal_error(e: StateError) -> axum::response::Response {
    error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
}

fn client_error(e: ClientError) -> axum::response::Response {
    let status = match e {
        ClientError::NotFound { .. } => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(&e.to_string(), status).into_response()
}

// ── Nodes ──────────────────────────────────────────────────────

/// Node fields accepted by `PUT /api/v1/nodes/{name}`.
#[derive(serde::Deserialize)]
pub struct NodeBody {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    #[serde(default)]
    pub unschedulable: bool,
    #[serde(default = "ready_by_default")]
    pub ready: bool,
    pub allocatable_cores: u64,
}

fn ready_by_default() -> bool {
    true
}

/// GET /api/v1/nodes
pub async fn list_nodes(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_nodes() {
        Ok(nodes) => ApiResponse::ok(nodes).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/v1/nodes/{name}
pub async fn get_node(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.get_node(&name) {
        Ok(Some(node)) => ApiResponse::ok(node).into_response(),
        Ok(None) => error_response("node not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}

/// PUT /api/v1/nodes
pub async fn put_node(
    State(state): State<ApiState>,
    Json(node): Json<NodeInfo>,
) -> impl IntoResponse {
    if node.name.trim().is_empty() {
        return error_response("node name cannot be empty", StatusCode::BAD_REQUEST)
            .into_response();
    }
    match state.store.put_node(&node) {
        Ok(()) => ApiResponse::ok(node).into_response(),
        Err(e) => internal_error(e),
    }
}

/// PUT /api/v1/nodes/{name}
pub async fn put_named_node(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(body): Json<NodeBody>,
) -> impl IntoResponse {
    let node = NodeInfo {
        name,
        labels: body.labels,
        unschedulable: body.unschedulable,
        ready: body.ready,
        allocatable_cores: body.allocatable_cores,
    };
    match state.store.put_node(&node) {
        Ok(()) => ApiResponse::ok(node).into_response(),
        Err(e) => internal_error(e),
    }
}

/// DELETE /api/v1/nodes/{name}
pub async fn delete_node(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_node(&name) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("node not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}

// ── Config maps ────────────────────────────────────────────────

/// GET /api/v1/configmaps
pub async fn list_config_maps(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_config_maps() {
        Ok(configs) => {
            let configs: Vec<_> = configs
                .into_iter()
                .filter(|c| c.namespace == state.namespace)
                .collect();
            ApiResponse::ok(configs).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /api/v1/configmaps/{name}
pub async fn get_config_map(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.get_config_map(&state.namespace, &name) {
        Ok(Some(config)) => ApiResponse::ok(config).into_response(),
        Ok(None) => error_response("configmap not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}

/// PUT /api/v1/configmaps/{name}
///
/// The body is the full key-value data. An existing map is updated in
/// place, an absent one is created; every write yields a new version.
pub async fn put_config_map(
    State(state): State<ApiState>,
    Path(name): Path<String>,
    Json(data): Json<ConfigData>,
) -> impl IntoResponse {
    let store = &state.store;
    let written = match store.fetch(&state.namespace, &name).await {
        Ok(_) => store.update(&state.namespace, &name, data).await,
        Err(ClientError::NotFound { .. }) => {
            match store.create(&state.namespace, &name, data.clone()).await {
                // Lost a race with another writer.
                Err(ClientError::AlreadyExists { .. }) => {
                    store.update(&state.namespace, &name, data).await
                }
                created => created,
            }
        }
        Err(e) => Err(e),
    };
    match written {
        Ok(config) => {
            info!(configmap = %config.table_key(), version = %config.version, "configmap written");
            ApiResponse::ok(config).into_response()
        }
        Err(e) => client_error(e),
    }
}

/// DELETE /api/v1/configmaps/{name}
pub async fn delete_config_map(
    State(state): State<ApiState>,
    Path(name): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_config_map(&state.namespace, &name) {
        Ok(true) => ApiResponse::ok("deleted").into_response(),
        Ok(false) => error_response("configmap not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => internal_error(e),
    }
}

// ── Workloads ──────────────────────────────────────────────────

/// Replica request body.
#[derive(serde::Deserialize)]
pub struct ReplicasRequest {
    pub replicas: u32,
}

/// GET /api/v1/workloads
pub async fn list_workloads(State(state): State<ApiState>) -> impl IntoResponse {
    match state.store.list_workloads() {
        Ok(workloads) => ApiResponse::ok(workloads).into_response(),
        Err(e) => internal_error(e),
    }
}

/// PUT /api/v1/workloads/{kind}/{name}
pub async fn put_workload(
    State(state): State<ApiState>,
    Path((kind, name)): Path<(String, String)>,
    Json(req): Json<ReplicasRequest>,
) -> impl IntoResponse {
    let kind: TargetKind = match kind.parse() {
        Ok(kind) => kind,
        Err(e) => {
            return error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response();
        }
    };
    let target = ScaleTarget {
        kind,
        name,
        namespace: state.namespace.clone(),
    };
    let record = WorkloadRecord::new(&target, req.replicas);
    match state.store.put_workload(&record) {
        Ok(()) => ApiResponse::ok(record).into_response(),
        Err(e) => internal_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> ApiState {
        let store = StateStore::open_in_memory().unwrap();
        ApiState {
            store,
            namespace: "kube-system".to_string(),
        }
    }

    fn node_body(cores: u64) -> NodeBody {
        NodeBody {
            labels: BTreeMap::new(),
            unschedulable: false,
            ready: true,
            allocatable_cores: cores,
        }
    }

    #[tokio::test]
    async fn list_nodes_empty() {
        let state = test_state();
        let resp = list_nodes(State(state)).await;
        let resp = resp.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn put_and_get_named_node() {
        let state = test_state();
        let resp = put_named_node(State(state.clone()), Path("n1".to_string()), Json(node_body(4)))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = get_node(State(state.clone()), Path("n1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.store.get_node("n1").unwrap().unwrap().allocatable_cores, 4);
    }

    #[tokio::test]
    async fn put_node_rejects_empty_name() {
        let state = test_state();
        let resp = put_node(State(state), Json(NodeInfo::new("  ", 4)))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_nonexistent_node() {
        let state = test_state();
        let resp = get_node(State(state), Path("nope".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_node_then_missing() {
        let state = test_state();
        state.store.put_node(&NodeInfo::new("n1", 2)).unwrap();

        let resp = delete_node(State(state.clone()), Path("n1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = delete_node(State(state), Path("n1".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_config_map_uses_router_namespace() {
        let state = test_state();
        let data = ConfigData::from([("linear".to_string(), "{}".to_string())]);
        let resp = put_config_map(State(state.clone()), Path("dns".to_string()), Json(data))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.store.get_config_map("kube-system", "dns").unwrap().is_some());
    }

    #[tokio::test]
    async fn get_nonexistent_config_map() {
        let state = test_state();
        let resp = get_config_map(State(state), Path("dns".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_config_map_updates_existing_map() {
        let state = test_state();
        let first = state
            .store
            .create_config_map("kube-system", "dns", ConfigData::new())
            .unwrap();

        let data = ConfigData::from([("ladder".to_string(), "{}".to_string())]);
        let resp = put_config_map(State(state.clone()), Path("dns".to_string()), Json(data.clone()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let stored = state.store.get_config_map("kube-system", "dns").unwrap().unwrap();
        assert_eq!(stored.data, data);
        assert_ne!(stored.version, first.version);
    }

    #[tokio::test]
    async fn list_config_maps_only_shows_router_namespace() {
        let state = test_state();
        state
            .store
            .create_config_map("kube-system", "dns", ConfigData::new())
            .unwrap();
        state
            .store
            .create_config_map("other", "dns", ConfigData::new())
            .unwrap();

        let resp = list_config_maps(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["data"].as_array().unwrap().len(), 1);
        assert_eq!(json["data"][0]["namespace"], "kube-system");
    }

    #[tokio::test]
    async fn delete_config_map_then_missing() {
        let state = test_state();
        state
            .store
            .create_config_map("kube-system", "dns", ConfigData::new())
            .unwrap();

        let resp = delete_config_map(State(state.clone()), Path("dns".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.store.get_config_map("kube-system", "dns").unwrap().is_none());

        let resp = delete_config_map(State(state), Path("dns".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn put_workload_parses_kind() {
        let state = test_state();
        let resp = put_workload(
            State(state.clone()),
            Path(("Deployments".to_string(), "coredns".to_string())),
            Json(ReplicasRequest { replicas: 2 }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let workloads = state.store.list_workloads().unwrap();
        assert_eq!(workloads.len(), 1);
        assert_eq!(workloads[0].table_key(), "kube-system/deployment/coredns");
    }

    #[tokio::test]
    async fn put_workload_keeps_name_case() {
        let state = test_state();
        let resp = put_workload(
            State(state.clone()),
            Path(("DEPLOYMENT".to_string(), "CoreDNS".to_string())),
            Json(ReplicasRequest { replicas: 2 }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let workloads = state.store.list_workloads().unwrap();
        assert_eq!(workloads[0].table_key(), "kube-system/deployment/CoreDNS");
        assert_eq!(workloads[0].name, "CoreDNS");
    }

    #[tokio::test]
    async fn put_workload_rejects_unknown_kind() {
        let state = test_state();
        let resp = put_workload(
            State(state),
            Path(("daemonset".to_string(), "agent".to_string())),
            Json(ReplicasRequest { replicas: 1 }),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
