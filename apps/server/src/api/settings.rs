use std::sync::Arc;

use crate::{error::ApiResult, main_lib::AppState};
use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use gemledger_core::settings::{LedgerSettings, LedgerSettingsUpdate};
use rust_decimal::Decimal;
use serde::Deserialize;

async fn get_settings(State(state): State<Arc<AppState>>) -> ApiResult<Json<LedgerSettings>> {
    let settings = state.settings_service.get_settings()?;
    Ok(Json(settings))
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LedgerSettingsUpdate>,
) -> ApiResult<Json<LedgerSettings>> {
    let settings = state.settings_service.update_settings(update).await?;
    Ok(Json(settings))
}

#[derive(Deserialize)]
struct ExchangeRateBody {
    rate: Decimal,
}

async fn set_exchange_rate(
    Path(currency): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExchangeRateBody>,
) -> ApiResult<Json<LedgerSettings>> {
    let settings = state
        .settings_service
        .set_exchange_rate(&currency, body.rate)
        .await?;
    Ok(Json(settings))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(get_settings).put(update_settings))
        .route("/settings/exchange-rates/{currency}", put(set_exchange_rate))
}
