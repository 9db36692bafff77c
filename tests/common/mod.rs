#![allow(dead_code)]

use axum::{
    Router,
    body::{self, Body},
    http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt; // for `oneshot`

use hospital_office::{auth::Role, test_helpers};

pub struct Harness {
    pub db: sea_orm::DatabaseConnection,
    pub app: Router,
}

impl Harness {
    pub async fn new() -> Self {
        let db = test_helpers::memory_db().await;
        let app = test_helpers::test_router(&db);
        Self { db, app }
    }

    /// Seeds a user of `role` and returns a live token for it.
    pub async fn token(&self, username: &str, role: Role) -> String {
        let user = test_helpers::seed_user(&self.db, username, "password123", role).await;
        test_helpers::token_for(&self.db, user.id).await
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}
