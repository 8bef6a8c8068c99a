use crate::{controllers::play_controller::PlayController, AppState};
use axum::{
    routing::{get, post},
    Router,
};

pub struct PlayRoutes;

impl PlayRoutes {
    pub fn routes() -> Router<AppState> {
        Router::new().route("/stats", get(PlayController::total_stats))
    }

    pub fn protected_routes() -> Router<AppState> {
        Router::new()
            .route("/record", post(PlayController::record))
            .route("/history", post(PlayController::history))
            .route("/report", post(PlayController::report))
            .route("/charts", post(PlayController::charts))
            .route("/trend", post(PlayController::trend))
    }
}
