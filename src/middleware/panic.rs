use std::any::Any;

use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{error::AppError, response::Envelope};

pub fn catch_panic_layer() -> CatchPanicLayer<fn(Box<dyn Any + Send + 'static>) -> Response> {
    CatchPanicLayer::custom(panic_to_envelope)
}

fn panic_to_envelope(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message
    } else {
        "unknown panic"
    };

    let client_message = if cfg!(debug_assertions) {
        format!("internal server error: {details}")
    } else {
        "internal server error".to_string()
    };

    Envelope::from_error(&AppError::internal(client_message)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{body, http::StatusCode};

    use super::panic_to_envelope;

    #[tokio::test]
    async fn panics_become_internal_envelopes() {
        let response = panic_to_envelope(Box::new("ward index out of range"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("body should be json");
        assert_eq!(json["success"], false);
        assert_eq!(json["error_kind"], "internal");
        assert!(
            json["error"]
                .as_str()
                .expect("error message")
                .starts_with("internal server error")
        );
    }
}
