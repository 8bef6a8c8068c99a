use crate::auth::token_service::{Claims, TokenService};
use crate::error::{Error, Result};
use crate::helpers::thing_helpers::parse_id_part;
use crate::helpers::user_helpers::{get_user, is_admin};
use crate::{models::user::UserRecord, AppState};
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

/// The authenticated caller, attached to every protected request.
#[derive(Debug, Clone)]
pub struct Ctx {
    pub user_id: String,
    pub user: UserRecord,
}

impl Ctx {
    pub fn new(user_id: String, user: UserRecord) -> Self {
        Self { user_id, user }
    }
}

pub async fn mw_auth(
    State(app_state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|str| str.strip_prefix("Bearer "))
        .ok_or(Error::AuthFailNoAuthToken)?;

    let claims: Claims = TokenService::validate_token(token, &app_state.auth_config)?;
    let user_id = parse_id_part(&claims.sub).to_string();

    let user = get_user(&app_state.db, &user_id)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            id: user_id.clone(),
        })?;

    req.extensions_mut().insert(Ctx::new(user_id, user));

    Ok(next.run(req).await)
}

/// Runs after `mw_auth`; lets only the configured administrator through.
pub async fn mw_require_admin(
    State(app_state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response> {
    let ctx = req
        .extensions()
        .get::<Ctx>()
        .ok_or(Error::AuthFailCtxNotInRequestExt)?;

    if !is_admin(&app_state.ledger_config, &ctx.user_id) {
        tracing::warn!(
            user_id = %ctx.user_id,
            username = %ctx.user.username,
            "non-admin request to admin route"
        );
        return Err(Error::AdminRequired);
    }

    Ok(next.run(req).await)
}
