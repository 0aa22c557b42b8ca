use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/slots", post(handlers::compute_available_slots))
        .route("/schedule/days", get(handlers::list_schedule_days))
        .with_state(state)
}
