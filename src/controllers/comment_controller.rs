use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};

use crate::{
    error::Error,
    middlewares::mw_auth::Ctx,
    models::comment::*,
    services::comment_service::CommentService,
    validators::required,
    AppState,
};

pub struct CommentController;

impl CommentController {
    pub async fn list_by_target(
        State(state): State<AppState>,
        query: Result<Query<TargetQuery>, QueryRejection>,
    ) -> Result<Json<CommentList>, Error> {
        let Query(query) = query?;
        let comments = CommentService::list_by_target(&state.db, &query).await?;

        Ok(Json(comments))
    }

    pub async fn stats(
        State(state): State<AppState>,
        query: Result<Query<TargetQuery>, QueryRejection>,
    ) -> Result<Json<CommentStats>, Error> {
        let Query(query) = query?;
        let stats = CommentService::stats(&state.db, &query).await?;

        Ok(Json(stats))
    }

    pub async fn detail(
        State(state): State<AppState>,
        Path(comment_id): Path<String>,
    ) -> Result<Json<CommentDetail>, Error> {
        let detail = CommentService::detail(&state.db, &comment_id).await?;

        Ok(Json(detail))
    }

    pub async fn action(
        State(state): State<AppState>,
        payload: Result<Json<CommentActionRequest>, JsonRejection>,
    ) -> Result<Json<MessageResponse>, Error> {
        let Json(request) = payload?;
        CommentService::apply_action(&state.db, &request).await?;

        Ok(Json(MessageResponse::new("comment action applied")))
    }

    pub async fn like(
        State(state): State<AppState>,
        Path(comment_id): Path<String>,
    ) -> Result<Json<MessageResponse>, Error> {
        CommentService::like(&state.db, &comment_id).await?;

        Ok(Json(MessageResponse::new("comment liked")))
    }

    pub async fn report(
        State(state): State<AppState>,
        Path(comment_id): Path<String>,
    ) -> Result<Json<MessageResponse>, Error> {
        CommentService::report(&state.db, &comment_id).await?;

        Ok(Json(MessageResponse::new("comment reported")))
    }

    pub async fn publish(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        payload: Result<Json<PublishCommentRequest>, JsonRejection>,
    ) -> Result<(StatusCode, Json<PublishedComment>), Error> {
        let Json(request) = payload?;
        let comment_id =
            CommentService::publish(&state.db, &state.ledger_config, &ctx.user_id, &request)
                .await?;

        Ok((
            StatusCode::CREATED,
            Json(PublishedComment {
                message: "comment published".to_string(),
                comment_id,
            }),
        ))
    }

    pub async fn delete(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        payload: Result<Json<CommentIdRequest>, JsonRejection>,
    ) -> Result<Json<MessageResponse>, Error> {
        let Json(request) = payload?;
        let comment_id = required(request.comment_id.as_deref(), "comment_id")?;
        let removed = CommentService::delete(&state.db, &ctx.user_id, &comment_id).await?;

        Ok(Json(MessageResponse::new(format!(
            "comment deleted ({removed} removed)"
        ))))
    }

    pub async fn my_comments(
        State(state): State<AppState>,
        Extension(ctx): Extension<Ctx>,
        query: Result<Query<MyCommentsQuery>, QueryRejection>,
    ) -> Result<Json<MyComments>, Error> {
        let Query(query) = query?;
        let comments = CommentService::list_mine(&state.db, &ctx.user_id, query.grouped).await?;

        Ok(Json(comments))
    }
}
