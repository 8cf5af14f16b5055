use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use ballot_core::BallotError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Ballot(#[from] BallotError),

    /// Missing, unknown or expired session token.
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Ballot(err) => match err {
                BallotError::Validation(_) | BallotError::InvalidOption { .. } => {
                    StatusCode::BAD_REQUEST
                }
                BallotError::Authentication => StatusCode::UNAUTHORIZED,
                BallotError::Unauthorized { .. } => StatusCode::FORBIDDEN,
                BallotError::PollNotFound(_) => StatusCode::NOT_FOUND,
                BallotError::DuplicateUser(_) | BallotError::AlreadyVoted { .. } => {
                    StatusCode::CONFLICT
                }
                BallotError::IdGeneration(_)
                | BallotError::PasswordHash(_)
                | BallotError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable tag sent as the `error` field of the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ballot(err) => err.kind(),
            Self::Unauthenticated(_) => "authentication",
            Self::Config(_) => "config",
            Self::Io(_) | Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "request failed");
        }
        let body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
