use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lakegrant_application::ActivationStatus;
use lakegrant_core::AppError;

use crate::dto::ActivationStatusResponse;

/// HTTP API error wrapper around core application errors.
///
/// The body keeps the activation status shape so callers always read
/// `success` and `message`.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::PermissionApplyFailed(_) | AppError::PermissionRemoveFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::RecordScanFailed(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::RecordInsertFailed(_)
            | AppError::RecordUpdateFailed(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let payload = Json(ActivationStatusResponse::from(ActivationStatus::failed(
            self.0.to_string(),
        )));

        (status, payload).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use lakegrant_core::AppError;

    use super::ApiError;

    #[test]
    fn permission_failures_map_to_bad_gateway() {
        let response =
            ApiError(AppError::PermissionApplyFailed("denied".to_owned())).into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn validation_failures_map_to_bad_request() {
        let response = ApiError(AppError::Validation("bad".to_owned())).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn record_insert_failures_map_to_internal_error() {
        let response = ApiError(AppError::RecordInsertFailed("down".to_owned())).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn error_body_is_a_failed_activation_status() {
        let response = ApiError(AppError::RecordScanFailed("down".to_owned())).into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("error body should be readable");
        };
        let body = serde_json::from_slice::<serde_json::Value>(&bytes).unwrap_or_default();
        assert_eq!(
            body,
            serde_json::json!({"success": false, "message": "record scan failed: down"})
        );
    }
}
