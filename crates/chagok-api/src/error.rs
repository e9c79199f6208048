//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

#[derive(Debug)]
pub enum ApiError {
    Internal(chagok_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    /// Transient downstream failure (AI backend, vector index); the client
    /// may retry.
    Upstream(String),
}

impl From<chagok_core::Error> for ApiError {
    fn from(err: chagok_core::Error) -> Self {
        use chagok_core::Error;
        match &err {
            Error::NotFound(msg) | Error::CaseNotFound(msg) | Error::EvidenceNotFound(msg) => {
                ApiError::NotFound(msg.clone())
            }
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            Error::Conflict(msg) => ApiError::Conflict(msg.clone()),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::InvalidObjectKey(msg) | Error::UnsupportedMediaType(msg) => {
                ApiError::BadRequest(msg.clone())
            }
            _ if err.is_retryable() => ApiError::Upstream(err.to_string()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_core_error_mapping() {
        use chagok_core::Error;

        assert_eq!(
            status_of(Error::CaseNotFound("c1".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::Forbidden("not a member".into()).into()),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(Error::Conflict("case closed".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(Error::InvalidInput("bad filename".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::Unauthorized("no token".into()).into()),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_retryable_errors_map_to_bad_gateway() {
        use chagok_core::Error;
        assert_eq!(
            status_of(Error::Inference("model timeout".into()).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(Error::Index("collection down".into()).into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_everything_else_is_internal() {
        use chagok_core::Error;
        assert_eq!(
            status_of(Error::Internal("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
