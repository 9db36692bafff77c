use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::{AppError, ErrorKind};

pub type ApiResult<T> = Result<Envelope<T>, AppError>;

/// Uniform `{success, data, error}` response wrapper.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> ApiResult<T> {
        Ok(Self {
            success: true,
            data,
            error: None,
            error_kind: None,
            status: StatusCode::OK,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl Envelope<serde_json::Value> {
    pub fn from_error(err: &AppError) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            error: Some(err.message().to_string()),
            error_kind: Some(err.kind()),
            status: status_for(err),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        log_app_error(&self, status);
        Envelope::from_error(&self).into_response()
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

pub fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Conflict(_) => StatusCode::CONFLICT,
        AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub fn log_app_error(err: &AppError, status: StatusCode) {
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), kind = ?err.kind(), error = %err, "request failed");
    } else {
        tracing::debug!(status = status.as_u16(), kind = ?err.kind(), error = %err, "request rejected");
    }
}

#[cfg(test)]
mod tests {
    use axum::{body, http::StatusCode, response::IntoResponse};

    use super::Envelope;
    use crate::error::AppError;

    #[tokio::test]
    async fn errors_render_as_failed_envelope() {
        let response = AppError::forbidden("Admin access required").into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("body should be json");
        assert_eq!(json["success"], false);
        assert_eq!(json["data"], serde_json::Value::Null);
        assert_eq!(json["error"], "Admin access required");
        assert_eq!(json["error_kind"], "forbidden");
    }

    #[test]
    fn success_envelope_has_no_error() {
        let envelope = Envelope::ok(vec![1, 2]).expect("ok envelope");
        assert_eq!(envelope.status(), StatusCode::OK);
        let json = serde_json::to_value(&envelope).expect("envelope should serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json["error"].is_null());
        assert!(json.get("status").is_none());
    }
}
