//! proscale-api — admin REST API over the standalone store.
//!
//! Lets operators (and tests) shape the local cluster the autoscaler
//! watches: add or cordon nodes, edit the scaling config map, and inspect
//! workload replica counts.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/v1/nodes` | List nodes |
//! | PUT | `/api/v1/nodes` | Create or replace a node |
//! | GET | `/api/v1/nodes/{name}` | Get a node |
//! | PUT | `/api/v1/nodes/{name}` | Create or replace a node by name |
//! | DELETE | `/api/v1/nodes/{name}` | Delete a node |
//! | GET | `/api/v1/configmaps` | List config maps |
//! | GET | `/api/v1/configmaps/{name}` | Get a config map |
//! | PUT | `/api/v1/configmaps/{name}` | Update a config map, creating it if absent |
//! | DELETE | `/api/v1/configmaps/{name}` | Delete a config map |
//! | GET | `/api/v1/workloads` | List workloads |
//! | PUT | `/api/v1/workloads/{kind}/{name}` | Create a workload or set its replicas |
//!
//! Config maps and workloads live in the namespace the router was built for.

pub mod handlers;

use axum::Router;
use axum::routing::{get, put};
use proscale_state::StateStore;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: StateStore,
    pub namespace: String,
}

/// Build the admin router for `namespace`.
pub fn build_router(store: StateStore, namespace: impl Into<String>) -> Router {
    let api_state = ApiState {
        store,
        namespace: namespace.into(),
    };

    let api_routes = Router::new()
        .route("/nodes", get(handlers::list_nodes).put(handlers::put_node))
        .route(
            "/nodes/{name}",
            get(handlers::get_node)
                .put(handlers::put_named_node)
                .delete(handlers::delete_node),
        )
        .route("/configmaps", get(handlers::list_config_maps))
        .route(
            "/configmaps/{name}",
            get(handlers::get_config_map)
                .put(handlers::put_config_map)
                .delete(handlers::delete_config_map),
        )
        .route("/workloads", get(handlers::list_workloads))
        .route(
            "/workloads/{kind}/{name}",
            put(handlers::put_workload),
        )
        .with_state(api_state);

    Router::new().nest("/api/v1", api_routes)
}
