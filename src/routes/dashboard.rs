use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;
use serde_json::Value;

use super::api::ok;
use crate::{
    auth::{AccessGuard, Authenticated},
    error::AppError,
    response::ApiResult,
    services::{ServiceContext, stats_service::DEFAULT_PERIOD_DAYS},
    state::AppState,
};

/// Longest trailing window a chart may ask for.
const MAX_PERIOD_DAYS: u32 = 3650;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct DashboardQuery {
    pub action: Option<String>,
    pub period: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/dashboard.php", get(dashboard))
        .with_state(state)
}

async fn dashboard(
    State(state): State<Arc<AppState>>,
    guard: AccessGuard<Authenticated>,
    Query(query): Query<DashboardQuery>,
) -> ApiResult<Value> {
    let period = parse_period(query.period.as_deref())?;
    let stats = ServiceContext::from_state(&state).stats();
    tracing::debug!(action = ?query.action, period, user_id = %guard.identity.id, "dashboard request");

    match query.action.as_deref().unwrap_or_default() {
        "chart-data" => ok(stats.chart_data(period).await?),
        "room-occupancy" => ok(stats.room_occupancy_chart().await?),
        "patient-severity" => ok(stats.patient_severity_chart(period).await?),
        "admissions-trend" => ok(stats.admissions_trend_chart(period).await?),
        "dashboard-stats" => ok(stats.dashboard(period).await?),
        _ => Err(AppError::bad_request("Invalid action")),
    }
}

fn parse_period(raw: Option<&str>) -> Result<u32, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(DEFAULT_PERIOD_DAYS);
    };
    raw.parse::<u32>()
        .ok()
        .filter(|period| (1..=MAX_PERIOD_DAYS).contains(period))
        .ok_or_else(|| AppError::bad_request("Invalid period"))
}

#[cfg(test)]
mod tests {
    use super::parse_period;

    #[test]
    fn period_defaults_and_bounds() {
        assert_eq!(parse_period(None).expect("default"), 7);
        assert_eq!(parse_period(Some("30")).expect("explicit"), 30);
        assert!(parse_period(Some("0")).is_err());
        assert!(parse_period(Some("-3")).is_err());
        assert!(parse_period(Some("week")).is_err());
    }
}
