use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    Extension, Json,
};

use crate::{
    error::Error, middlewares::mw_auth::Ctx, models::play_history::*,
    services::play_history_service::PlayHistoryService, AppState,
};

pub struct PlayController;

impl PlayController {
    pub async fn record(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        payload: Result<Json<RecordPlayRequest>, JsonRejection>,
    ) -> Result<(StatusCode, Json<RecordPlayResponse>), Error> {
        let Json(request) = payload?;
        let outcome = PlayHistoryService::record_play(
            &state.db,
            &state.play_gate,
            &state.ledger_config,
            &ctx.user_id,
            &request,
        )
        .await?;

        let status_code = match outcome {
            PlayOutcome::Recorded => StatusCode::CREATED,
            PlayOutcome::Suppressed => StatusCode::OK,
        };

        Ok((status_code, Json(outcome.into())))
    }

    pub async fn total_stats(
        State(state): State<AppState>,
        query: Result<Query<PlayStatsQuery>, QueryRejection>,
    ) -> Result<Json<TotalPlayStats>, Error> {
        let Query(query) = query?;
        let stats = PlayHistoryService::total_play_stats(&state.db, &query).await?;

        Ok(Json(stats))
    }

    pub async fn history(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        payload: Result<Json<PlayHistoryRequest>, JsonRejection>,
    ) -> Result<Json<PlayHistoryList>, Error> {
        let Json(request) = payload?;
        let history = PlayHistoryService::my_history(&state.db, &ctx.user_id, &request).await?;

        Ok(Json(history))
    }

    pub async fn report(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        payload: Result<Json<PlayReportRequest>, JsonRejection>,
    ) -> Result<Json<PlayReport>, Error> {
        let Json(request) = payload?;
        let report = PlayHistoryService::play_report(&state.db, &ctx.user_id, &request).await?;

        Ok(Json(report))
    }

    pub async fn charts(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        payload: Result<Json<TopChartsRequest>, JsonRejection>,
    ) -> Result<Json<TopCharts>, Error> {
        let Json(request) = payload?;
        let charts = PlayHistoryService::top_charts(&state.db, &ctx.user_id, &request).await?;

        Ok(Json(charts))
    }

    pub async fn trend(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        payload: Result<Json<ActivityTrendRequest>, JsonRejection>,
    ) -> Result<Json<ActivityTrend>, Error> {
        let Json(request) = payload?;
        let trend = PlayHistoryService::activity_trend(&state.db, &ctx.user_id, &request).await?;

        Ok(Json(trend))
    }
}
