use crate::{controllers::favorite_controller::FavoriteController, AppState};
use axum::{routing::post, Router};

pub struct FavoriteRoutes;

impl FavoriteRoutes {
    pub fn routes() -> Router<AppState> {
        Router::new().route("/top", post(FavoriteController::top_favorites))
    }
}
