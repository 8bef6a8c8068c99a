use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{
    error::Error,
    models::{
        analytics::*,
        audit_log::{AuditLogQuery, AuditLogView},
        comment::{CommentView, MessageResponse, ModerationOutcome},
        moderation::AuditCommentRequest,
        pagination::{PaginatedResponse, PaginationQuery},
    },
    services::{
        analytics_service::AnalyticsService, audit_service::AuditService,
        moderation_service::ModerationService,
    },
    AppState,
};

pub struct AdminController;

impl AdminController {
    pub async fn pending_comments(
        State(state): State<AppState>,
        payload: Result<Json<PaginationQuery>, JsonRejection>,
    ) -> Result<Json<PaginatedResponse<CommentView>>, Error> {
        let Json(query) = payload?;
        let pending = ModerationService::pending(&state.db, &query).await?;

        Ok(Json(pending))
    }

    pub async fn audit_comment(
        State(state): State<AppState>,
        payload: Result<Json<AuditCommentRequest>, JsonRejection>,
    ) -> Result<Json<MessageResponse>, Error> {
        let Json(request) = payload?;
        let outcome = ModerationService::audit_decision(&state.db, &request).await?;

        let message = match outcome {
            ModerationOutcome::Removed if request.ban_user => "comment removed and author banned",
            ModerationOutcome::Removed => "comment removed",
            ModerationOutcome::Status(_) => "comment approved",
        };
        Ok(Json(MessageResponse::new(message)))
    }

    pub async fn audit_logs(
        State(state): State<AppState>,
        payload: Result<Json<AuditLogQuery>, JsonRejection>,
    ) -> Result<Json<PaginatedResponse<AuditLogView>>, Error> {
        let Json(query) = payload?;
        let logs = AuditService::list(&state.db, &query).await?;

        Ok(Json(logs))
    }

    pub async fn behavior_stats(
        State(state): State<AppState>,
        payload: Result<Json<DateRangeRequest>, JsonRejection>,
    ) -> Result<Json<BehaviorStats>, Error> {
        let Json(request) = payload?;
        let stats = AnalyticsService::behavior_stats(&state.db, &request).await?;

        Ok(Json(stats))
    }

    pub async fn user_stats(
        State(state): State<AppState>,
        payload: Result<Json<UserStatsRequest>, JsonRejection>,
    ) -> Result<Json<UserBehaviorProfile>, Error> {
        let Json(request) = payload?;
        let profile = AnalyticsService::user_profile(&state.db, &request).await?;

        Ok(Json(profile))
    }

    pub async fn dashboard(
        State(state): State<AppState>,
        payload: Result<Json<DateRangeRequest>, JsonRejection>,
    ) -> Result<Json<DashboardSummary>, Error> {
        let Json(request) = payload?;
        let summary = AnalyticsService::dashboard(&state.db, &request).await?;

        Ok(Json(summary))
    }
}
