// region:    --- Imports
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

// endregion: --- Imports

pub type Result<T> = core::result::Result<T, Error>;

// region:    --- Error

/// Crate-wide error taxonomy. Each variant maps to exactly one HTTP status.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or malformed input; the caller must fix the request.
    #[error("{0}")]
    Validation(String),

    /// Unknown entity id.
    #[error("{0}")]
    NotFound(String),

    /// Caller identity could not be established.
    #[error("Authentication required")]
    Unauthenticated,

    /// Caller is authenticated but not allowed to touch this resource.
    #[error("{0}")]
    Forbidden(String),

    /// Wrong lifecycle phase, duplicate bid, already-declared result.
    #[error("{0}")]
    StateConflict(String),

    /// Unexpected persistence failure. Detail stays server-side.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) | Error::StateConflict(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Full detail is logged; the wire only ever carries a short message.
        let message = match &self {
            Error::Database(e) => {
                error!("{:<12} --> database error: {:?}", "Error", e);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}

// endregion: --- Error

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        assert_eq!(
            Error::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::StateConflict("dup".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::NotFound("nope".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(Error::Unauthenticated.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            Error::Forbidden("not yours".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            Error::Database(sqlx::Error::PoolClosed).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

// endregion: --- Tests
