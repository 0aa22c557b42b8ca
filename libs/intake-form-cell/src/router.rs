use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::IntakeState;

pub fn intake_routes(state: Arc<IntakeState>) -> Router {
    Router::new()
        .route("/forms/{form_id}/fields", post(handlers::settle_fields))
        .route(
            "/forms/{form_id}/mappings",
            get(handlers::get_mappings).post(handlers::set_mapping),
        )
        .route(
            "/forms/{form_id}/suggestions/accept",
            post(handlers::accept_suggestion),
        )
        .route(
            "/forms/{form_id}/suggestions/dismiss",
            post(handlers::dismiss_suggestion),
        )
        .route("/generate", post(handlers::generate_fields))
        .route("/ehr-fields", get(handlers::list_ehr_fields))
        .with_state(state)
}
