use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;

use super::{api::ok, requests::parse_date};
use crate::{
    auth::{AccessGuard, AdminOnly},
    error::AppError,
    response::ApiResult,
    services::{
        ServiceContext,
        report_service::{DateRange, ReportKind},
    },
    state::AppState,
};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ReportQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/reports/export", get(export))
        .route("/reports/export.php", get(export))
        .with_state(state)
}

async fn export(
    State(state): State<Arc<AppState>>,
    guard: AccessGuard<AdminOnly>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Value> {
    let kind = match non_empty(query.kind.as_deref()) {
        Some(kind) => {
            ReportKind::try_from(kind).map_err(|_| AppError::bad_request("Invalid report type"))?
        }
        None => ReportKind::default(),
    };
    let start = non_empty(query.start.as_deref())
        .map(|raw| parse_date(raw, "start"))
        .transpose()
        .map_err(as_bad_request)?;
    let end = non_empty(query.end.as_deref())
        .map(|raw| parse_date(raw, "end"))
        .transpose()
        .map_err(as_bad_request)?;
    let range = DateRange::new(start, end)?;

    tracing::debug!(user_id = %guard.identity.id, ?kind, "report export requested");
    ok(ServiceContext::from_state(&state)
        .reports()
        .export(kind, range)
        .await?)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn as_bad_request(err: AppError) -> AppError {
    AppError::bad_request(err.message())
}
