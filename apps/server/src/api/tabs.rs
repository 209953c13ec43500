use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use gemledger_core::{partitions::PartitionTopology, tabs::ResolvedTab};

async fn resolve_tab(
    Path((module_id, tab_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<ResolvedTab>> {
    let tab = state.tab_resolver.resolve(&module_id, &tab_id)?;
    Ok(Json(tab))
}

async fn list_topologies(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PartitionTopology>>> {
    Ok(Json(state.tab_resolver.registry().topologies().to_vec()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/tabs/{module}/{tab}", get(resolve_tab))
        .route("/topologies", get(list_topologies))
}
