use axum::{
    body::to_bytes,
    extract::Request,
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::{
    error::AppError,
    response::{Envelope, log_app_error, status_for},
};

/// Framework rejection bodies are short plain text; anything longer is cut.
const MAX_REJECTION_BYTES: usize = 16 * 1024;

/// Envelopes errors the handlers did not produce themselves, such as
/// unknown paths or a POST to the GET-only dashboard. Responses that are
/// already JSON pass through.
pub async fn json_error_middleware(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) || is_json(&response) {
        return response;
    }

    let (parts, body) = response.into_parts();
    let detail = to_bytes(body, MAX_REJECTION_BYTES)
        .await
        .map(|bytes| String::from_utf8_lossy(&bytes).trim().to_string())
        .unwrap_or_default();

    let err = rejection_error(status, &path, detail);
    log_app_error(&err, status_for(&err));

    let mut envelope = Envelope::from_error(&err).into_response();
    carry_headers(&parts.headers, envelope.headers_mut());
    envelope
}

/// Copies every header except the body framing ones, keeping repeated
/// values such as `set-cookie` or `allow`.
fn carry_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            to.append(name.clone(), value.clone());
        }
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| {
            let value = value.to_ascii_lowercase();
            value.contains("application/json") || value.contains("+json")
        })
}

fn rejection_error(status: StatusCode, path: &str, detail: String) -> AppError {
    match status {
        StatusCode::NOT_FOUND => AppError::not_found(format!("No route for {path}")),
        StatusCode::METHOD_NOT_ALLOWED => AppError::bad_request("Method not allowed"),
        StatusCode::UNAUTHORIZED => AppError::unauthorized(or_reason(detail, status)),
        StatusCode::FORBIDDEN => AppError::forbidden(or_reason(detail, status)),
        StatusCode::UNPROCESSABLE_ENTITY => AppError::validation(or_reason(detail, status)),
        _ if status.is_client_error() => AppError::bad_request(or_reason(detail, status)),
        _ => AppError::internal(or_reason(detail, status)),
    }
}

fn or_reason(detail: String, status: StatusCode) -> String {
    if detail.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    } else {
        detail
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, StatusCode, header};

    use super::{carry_headers, rejection_error};
    use crate::error::ErrorKind;

    #[test]
    fn unmatched_paths_name_the_path() {
        let err = rejection_error(StatusCode::NOT_FOUND, "/wards", String::new());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.message(), "No route for /wards");
    }

    #[test]
    fn wrong_methods_match_the_dispatcher_message() {
        let err = rejection_error(StatusCode::METHOD_NOT_ALLOWED, "/dashboard", String::new());
        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert_eq!(err.message(), "Method not allowed");
    }

    #[test]
    fn other_rejections_keep_their_detail() {
        let err = rejection_error(
            StatusCode::BAD_REQUEST,
            "/api",
            "Failed to deserialize query string".to_string(),
        );
        assert_eq!(err.message(), "Failed to deserialize query string");

        let err = rejection_error(StatusCode::BAD_GATEWAY, "/api", String::new());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(err.message(), "Bad Gateway");
    }

    #[test]
    fn repeated_headers_survive_the_rewrite() {
        let mut original = HeaderMap::new();
        original.append(header::SET_COOKIE, HeaderValue::from_static("a=1"));
        original.append(header::SET_COOKIE, HeaderValue::from_static("b=2"));
        original.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let mut rewritten = HeaderMap::new();
        rewritten.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        carry_headers(&original, &mut rewritten);

        let cookies: Vec<_> = rewritten.get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
        assert_eq!(rewritten[header::CONTENT_TYPE], "application/json");
    }
}
