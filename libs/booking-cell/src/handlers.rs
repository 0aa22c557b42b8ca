use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{DayKey, SlotQuery};
use crate::services::slots;

#[axum::debug_handler]
pub async fn compute_available_slots(
    State(state): State<Arc<AppConfig>>,
    Json(query): Json<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    debug!("Computing bookable slots for {}", query.target_date);

    let slots = slots::compute_slots(&query, state.booking_cutoff);
    let total = slots.len();

    Ok(Json(json!({
        "date": query.target_date,
        "slots": slots,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn list_schedule_days(
    State(_state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let days: Vec<Value> = DayKey::ALL
        .iter()
        .map(|day| json!({ "key": day, "label": day.label() }))
        .collect();

    Ok(Json(json!({ "days": days })))
}
