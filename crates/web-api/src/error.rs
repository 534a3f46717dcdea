use application::ApplicationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        match error {
            // 取不到的附件一律按不存在处理
            ApplicationError::Validation(_)
            | ApplicationError::NotFound(_)
            | ApplicationError::RemoteUnavailable(_) => ApiError::not_found("Not found"),
            ApplicationError::Repository(err) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                format!("database error: {err}"),
            ),
            ApplicationError::Storage(message) => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                message,
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolvable_attachments_map_to_not_found() {
        for error in [
            ApplicationError::validation("attachment key is empty"),
            ApplicationError::not_found("abc"),
            ApplicationError::RemoteUnavailable("getFile: timeout".to_string()),
        ] {
            let api_error = ApiError::from(error);
            assert_eq!(api_error.status, StatusCode::NOT_FOUND);
            assert_eq!(api_error.body.message, "Not found");
        }
    }

    #[test]
    fn local_cache_failures_are_internal_errors() {
        let api_error = ApiError::from(ApplicationError::storage("corrupt cache entry"));
        assert_eq!(api_error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api_error.body.code, "STORAGE_ERROR");
    }
}
