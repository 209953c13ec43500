use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use gemledger_core::{
    ledger::LedgerView,
    partitions::{LedgerFamily, PartitionInfo, PartitionKey},
    records::{LedgerRecordUpdate, NewLedgerRecord},
};

fn parse_target(
    family: &str,
    module_id: &str,
    tab_id: &str,
) -> ApiResult<(LedgerFamily, PartitionKey)> {
    let family: LedgerFamily = family.parse()?;
    Ok((family, PartitionKey::new(module_id, tab_id)))
}

async fn open_view(
    Path((family, module_id, tab_id)): Path<(String, String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<LedgerView>> {
    let (family, partition) = parse_target(&family, &module_id, &tab_id)?;
    let view = state.ledger_service.open_view(family, &partition)?;
    Ok(Json(view))
}

async fn create_record(
    Path((family, module_id, tab_id)): Path<(String, String, String)>,
    State(state): State<Arc<AppState>>,
    Json(new_record): Json<NewLedgerRecord>,
) -> ApiResult<Json<LedgerView>> {
    let (family, partition) = parse_target(&family, &module_id, &tab_id)?;
    let view = state
        .ledger_service
        .create_record(family, &partition, new_record)
        .await?;
    Ok(Json(view))
}

async fn update_record(
    Path((family, module_id, tab_id, id)): Path<(String, String, String, String)>,
    State(state): State<Arc<AppState>>,
    Json(mut update): Json<LedgerRecordUpdate>,
) -> ApiResult<Json<LedgerView>> {
    let (family, partition) = parse_target(&family, &module_id, &tab_id)?;
    update.id = id;
    let view = state
        .ledger_service
        .update_record(family, &partition, update)
        .await?;
    Ok(Json(view))
}

async fn delete_record(
    Path((family, module_id, tab_id, id)): Path<(String, String, String, String)>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<LedgerView>> {
    let (family, partition) = parse_target(&family, &module_id, &tab_id)?;
    let view = state
        .ledger_service
        .delete_record(family, &partition, &id)
        .await?;
    Ok(Json(view))
}

async fn list_partitions(
    Path(family): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<PartitionInfo>>> {
    let family: LedgerFamily = family.parse()?;
    let partitions = state.ledger_service.list_partitions(family)?;
    Ok(Json(partitions))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ledger/{family}/partitions", get(list_partitions))
        .route("/ledger/{family}/{module}/{tab}", get(open_view))
        .route("/ledger/{family}/{module}/{tab}/records", post(create_record))
        .route(
            "/ledger/{family}/{module}/{tab}/records/{id}",
            put(update_record).delete(delete_record),
        )
}
