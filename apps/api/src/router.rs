use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::router::booking_routes;
use intake_form_cell::router::intake_routes;
use intake_form_cell::state::IntakeState;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    let intake_state = Arc::new(IntakeState::new(state.clone()));

    Router::new()
        .route("/", get(|| async { "Arbor Practice API is running!" }))
        .nest("/booking", booking_routes(state.clone()))
        .nest("/intake", intake_routes(intake_state))
}
