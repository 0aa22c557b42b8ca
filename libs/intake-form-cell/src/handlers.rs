use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_models::error::AppError;

use crate::catalog::EHR_FIELD_CATALOG;
use crate::models::{FormField, MappingKey};
use crate::services::reconciler::FieldMappingReconciler;
use crate::state::IntakeState;

#[derive(Debug, Deserialize)]
pub struct FieldsSnapshot {
    pub fields: Vec<FormField>,
}

#[derive(Debug, Deserialize)]
pub struct SetMappingRequest {
    pub field_id: String,
    pub sub_field: Option<String>,
    pub ehr_field: String,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionActionRequest {
    pub field_id: String,
    pub sub_field: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateFieldsRequest {
    pub description: String,
    #[serde(default)]
    pub existing_fields: Vec<FormField>,
}

fn mapping_view(reconciler: &FieldMappingReconciler) -> Value {
    json!({
        "confirmed": reconciler.confirmed_mappings(),
        "suggestions": reconciler.suggestions(),
        "in_flight": reconciler.in_flight_keys(),
    })
}

/// Settled snapshot of the builder's field list. Runs one reconciliation
/// pass; when new mappable items appear, a single batched suggestion fetch is
/// made before responding. Fetch failures are background noise, never errors.
#[axum::debug_handler]
pub async fn settle_fields(
    State(state): State<Arc<IntakeState>>,
    Path(form_id): Path<String>,
    Json(snapshot): Json<FieldsSnapshot>,
) -> Result<Json<Value>, AppError> {
    debug!(
        "Settlement snapshot for form {}: {} fields",
        form_id,
        snapshot.fields.len()
    );

    let request = {
        let mut sessions = state.sessions.lock().await;
        let reconciler = sessions.entry(form_id.clone()).or_default();
        reconciler.settle(&snapshot.fields)
    };

    if let Some(request) = request {
        match state.ai.suggest_mappings(&request).await {
            Ok(suggestions) => {
                let mut sessions = state.sessions.lock().await;
                if let Some(reconciler) = sessions.get_mut(&form_id) {
                    reconciler.absorb(&request, suggestions);
                }
            }
            Err(e) => {
                warn!("Mapping suggestion fetch failed for form {}: {}", form_id, e);
                let mut sessions = state.sessions.lock().await;
                if let Some(reconciler) = sessions.get_mut(&form_id) {
                    reconciler.abandon(&request);
                }
            }
        }
    }

    let sessions = state.sessions.lock().await;
    let reconciler = sessions
        .get(&form_id)
        .ok_or_else(|| AppError::NotFound("Form session not found".to_string()))?;
    Ok(Json(mapping_view(reconciler)))
}

#[axum::debug_handler]
pub async fn get_mappings(
    State(state): State<Arc<IntakeState>>,
    Path(form_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let sessions = state.sessions.lock().await;
    let reconciler = sessions
        .get(&form_id)
        .ok_or_else(|| AppError::NotFound("Form session not found".to_string()))?;
    Ok(Json(mapping_view(reconciler)))
}

#[axum::debug_handler]
pub async fn set_mapping(
    State(state): State<Arc<IntakeState>>,
    Path(form_id): Path<String>,
    Json(request): Json<SetMappingRequest>,
) -> Result<Json<Value>, AppError> {
    let key = MappingKey {
        field_id: request.field_id,
        sub_field: request.sub_field,
    };

    let mut sessions = state.sessions.lock().await;
    let reconciler = sessions.entry(form_id).or_default();
    reconciler.set_mapping(key, &request.ehr_field);
    Ok(Json(mapping_view(reconciler)))
}

#[axum::debug_handler]
pub async fn accept_suggestion(
    State(state): State<Arc<IntakeState>>,
    Path(form_id): Path<String>,
    Json(request): Json<SuggestionActionRequest>,
) -> Result<Json<Value>, AppError> {
    let key = MappingKey {
        field_id: request.field_id,
        sub_field: request.sub_field,
    };

    let mut sessions = state.sessions.lock().await;
    let reconciler = sessions
        .get_mut(&form_id)
        .ok_or_else(|| AppError::NotFound("Form session not found".to_string()))?;

    if !reconciler.accept_suggestion(&key) {
        return Err(AppError::NotFound(
            "No live suggestion for that mapping key".to_string(),
        ));
    }
    Ok(Json(mapping_view(reconciler)))
}

#[axum::debug_handler]
pub async fn dismiss_suggestion(
    State(state): State<Arc<IntakeState>>,
    Path(form_id): Path<String>,
    Json(request): Json<SuggestionActionRequest>,
) -> Result<Json<Value>, AppError> {
    let key = MappingKey {
        field_id: request.field_id,
        sub_field: request.sub_field,
    };

    let mut sessions = state.sessions.lock().await;
    let reconciler = sessions
        .get_mut(&form_id)
        .ok_or_else(|| AppError::NotFound("Form session not found".to_string()))?;

    reconciler.dismiss_suggestion(&key);
    Ok(Json(mapping_view(reconciler)))
}

/// Interactive AI field generation. Unlike background suggestion fetches,
/// failures here surface to the caller.
#[axum::debug_handler]
pub async fn generate_fields(
    State(state): State<Arc<IntakeState>>,
    Json(request): Json<GenerateFieldsRequest>,
) -> Result<Json<Value>, AppError> {
    if request.description.trim().is_empty() {
        return Err(AppError::BadRequest(
            "A form description is required".to_string(),
        ));
    }

    let fields = state
        .ai
        .generate_fields(&request.description, &request.existing_fields)
        .await
        .map_err(|e| AppError::ExternalService(e.to_string()))?;

    let total = fields.len();
    Ok(Json(json!({
        "fields": fields,
        "total": total
    })))
}

#[axum::debug_handler]
pub async fn list_ehr_fields(
    State(_state): State<Arc<IntakeState>>,
) -> Result<Json<Value>, AppError> {
    Ok(Json(json!({ "fields": EHR_FIELD_CATALOG })))
}
