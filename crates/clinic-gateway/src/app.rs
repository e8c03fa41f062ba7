use std::sync::Arc;

use axum::{routing::get, routing::post, Router};
use clinic_roster::RosterService;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub rosters: RosterService,
}

impl AppState {
    pub fn new(rosters: RosterService) -> Self {
        Self { rosters }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    use crate::http::{health, roster};

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/rosters", post(roster::save_roster))
        .route(
            "/doctors/{doctor_id}/roster",
            get(roster::list_rosters).post(roster::save_rosters),
        )
        .route("/doctors/{doctor_id}/roster/{date}", get(roster::roster_for_date))
        .route("/doctors/{doctor_id}/slots", get(roster::available_slots))
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
