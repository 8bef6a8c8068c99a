use crate::{error::Error, AppState};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{models::analytics::*, services::analytics_service::AnalyticsService};

pub struct FavoriteController;

impl FavoriteController {
    pub async fn top_favorites(
        State(state): State<AppState>,
        payload: Result<Json<TopFavoritesRequest>, JsonRejection>,
    ) -> Result<Json<TopFavorites>, Error> {
        let Json(request) = payload?;
        let top = AnalyticsService::top_favorites(&state.db, &request).await?;

        Ok(Json(top))
    }
}
