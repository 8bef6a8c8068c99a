use crate::{controllers::comment_controller::CommentController, AppState};
use axum::{
    routing::{get, post},
    Router,
};

pub struct CommentRoutes;

impl CommentRoutes {
    /// Reads and anonymous reactions.
    pub fn routes() -> Router<AppState> {
        Router::new()
            .route("/target", get(CommentController::list_by_target))
            .route("/stats", get(CommentController::stats))
            .route("/action", post(CommentController::action))
            .route("/{comment_id}", get(CommentController::detail))
            .route("/{comment_id}/like", post(CommentController::like))
            .route("/{comment_id}/report", post(CommentController::report))
    }

    pub fn protected_routes() -> Router<AppState> {
        Router::new()
            .route("/publish", post(CommentController::publish))
            .route("/delete", post(CommentController::delete))
            .route("/mine", get(CommentController::my_comments))
    }
}
