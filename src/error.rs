use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Clone, Debug, Serialize, strum_macros::AsRefStr, thiserror::Error)]
#[serde(tag = "type", content = "data")]
pub enum Error {
    // -- Auth errors.
    #[error("missing bearer token")]
    AuthFailNoAuthToken,
    #[error("invalid or expired session token")]
    AuthFailInvalidToken,
    #[error("request context not found")]
    AuthFailCtxNotInRequestExt,
    #[error("administrator privileges required")]
    AdminRequired,
    #[error("user '{user_id}' is banned")]
    UserBanned { user_id: String },
    #[error("{reason}")]
    PermissionDenied { reason: String },

    // -- Input errors.
    #[error("{reason}")]
    InvalidInput { reason: String },

    // -- Lookup errors.
    #[error("comment '{id}' not found")]
    CommentNotFound { id: String },
    #[error("parent comment '{id}' not found on this target")]
    ParentCommentNotFound { id: String },
    #[error("song '{id}' not found")]
    SongNotFound { id: String },
    #[error("album '{id}' not found")]
    AlbumNotFound { id: String },
    #[error("songlist '{id}' not found")]
    SonglistNotFound { id: String },
    #[error("user '{id}' not found")]
    UserNotFound { id: String },

    // -- Internal errors.
    #[error("database error: {0}")]
    DbError(String),
    #[error("environment error: {0}")]
    EnvVarError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("server error: {0}")]
    ServerError(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status_code, client_error) = self.client_status_and_error();

        let message = if status_code.is_server_error() {
            tracing::error!(error = %self, kind = self.as_ref(), "request failed");
            "internal error, please retry later".to_string()
        } else {
            self.to_string()
        };

        let response_body = serde_json::json!({
            "error": client_error.as_ref(),
            "message": message,
        });

        (status_code, Json(response_body)).into_response()
    }
}

impl Error {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn client_status_and_error(&self) -> (StatusCode, ClientError) {
        match self {
            Self::AuthFailNoAuthToken
            | Self::AuthFailInvalidToken
            | Self::AuthFailCtxNotInRequestExt => (StatusCode::UNAUTHORIZED, ClientError::NO_AUTH),

            Self::AdminRequired | Self::UserBanned { .. } | Self::PermissionDenied { .. } => {
                (StatusCode::FORBIDDEN, ClientError::FORBIDDEN)
            }

            Self::InvalidInput { .. } => (StatusCode::BAD_REQUEST, ClientError::INVALID_PARAMS),

            Self::CommentNotFound { .. }
            | Self::ParentCommentNotFound { .. }
            | Self::SongNotFound { .. }
            | Self::AlbumNotFound { .. }
            | Self::SonglistNotFound { .. }
            | Self::UserNotFound { .. } => {
                (StatusCode::NOT_FOUND, ClientError::RESOURCE_NOT_FOUND)
            }

            Self::DbError(_)
            | Self::EnvVarError(_)
            | Self::TokenError(_)
            | Self::ServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ClientError::SERVICE_ERROR,
            ),
        }
    }
}

#[derive(Debug, strum_macros::AsRefStr)]
#[allow(non_camel_case_types)]
pub enum ClientError {
    NO_AUTH,
    FORBIDDEN,
    INVALID_PARAMS,
    SERVICE_ERROR,
    RESOURCE_NOT_FOUND,
}

impl From<surrealdb::Error> for Error {
    fn from(err: surrealdb::Error) -> Self {
        Error::DbError(err.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::ServerError(err.to_string())
    }
}

impl From<std::env::VarError> for Error {
    fn from(err: std::env::VarError) -> Self {
        Error::EnvVarError(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for Error {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Error::TokenError(err.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::invalid(format!("malformed JSON body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::invalid(format!("malformed query string: {}", rejection.body_text()))
    }
}
