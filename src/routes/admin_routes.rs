use crate::{controllers::admin_controller::AdminController, AppState};
use axum::{routing::post, Router};

pub struct AdminRoutes;

impl AdminRoutes {
    pub fn routes() -> Router<AppState> {
        Router::new()
            .route("/comments/pending", post(AdminController::pending_comments))
            .route("/comments/audit", post(AdminController::audit_comment))
            .route("/logs", post(AdminController::audit_logs))
            .route("/users/behavior", post(AdminController::behavior_stats))
            .route("/users/stats", post(AdminController::user_stats))
            .route("/dashboard", post(AdminController::dashboard))
    }
}
