use std::collections::BTreeMap;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

use crate::{
    auth::Role,
    db::dao::{AssignmentDao, DaoBase, DaoResult, PatientDao, RoomDao, UserDao},
    error::AppError,
    services::{assignment_service::RoomStatus, patient_service::Severity},
};

pub const DEFAULT_PERIOD_DAYS: u32 = 7;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct RoomGroupCount {
    pub room_type: String,
    pub status: String,
    pub count: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SeverityCount {
    pub severity: String,
    pub count: i64,
}

/// Totals and breakdowns for the `getDashboardStats` action.
#[derive(Debug, Serialize)]
pub struct OverviewStats {
    pub total_rooms: u64,
    pub total_patients: u64,
    pub total_doctors: u64,
    pub total_nurses: u64,
    pub room_occupancy: Vec<RoomGroupCount>,
    pub patient_severity: Vec<SeverityCount>,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_rooms: u64,
    pub total_patients: u64,
    pub new_patients: u64,
    pub total_doctors: u64,
    pub total_nurses: u64,
    pub assigned_patients: u64,
    /// Percentage of rooms whose status is occupied, two decimals.
    pub room_occupancy_rate: f64,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct OccupancyBreakdown {
    pub occupied: u64,
    pub available: u64,
    pub maintenance: u64,
}

#[derive(Debug, Serialize, Default, PartialEq, Eq)]
pub struct SeverityBreakdown {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
    pub critical: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DailyAssignments {
    pub date: String,
    pub assignments: i64,
}

#[derive(Debug, Serialize)]
pub struct ChartBundle {
    pub room_occupancy: OccupancyBreakdown,
    pub patient_severity: SeverityBreakdown,
    pub admissions_trend: Vec<DailyCount>,
    pub room_utilization_trend: Vec<DailyAssignments>,
}

/// Chart-ready series: one label per data point.
#[derive(Debug, Serialize, PartialEq)]
pub struct Chart {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<i64>,
}

/// Read-only rollups, computed fresh per call. Independent queries run
/// concurrently.
#[derive(Clone)]
pub struct StatsService {
    rooms: RoomDao,
    patients: PatientDao,
    users: UserDao,
    assignments: AssignmentDao,
}

impl StatsService {
    pub fn new(
        rooms: RoomDao,
        patients: PatientDao,
        users: UserDao,
        assignments: AssignmentDao,
    ) -> Self {
        Self {
            rooms,
            patients,
            users,
            assignments,
        }
    }

    pub async fn overview(&self) -> Result<OverviewStats, AppError> {
        let (total_rooms, total_patients, total_doctors, total_nurses, rooms, severities) = tokio::try_join!(
            self.rooms.count(|query| query),
            self.patients.count(|query| query),
            self.users.count_by_role(Role::Doctor.as_str()),
            self.users.count_by_role(Role::Nurse.as_str()),
            self.rooms.count_by_type_and_status(),
            self.patients.count_by_severity(None),
        )?;

        Ok(OverviewStats {
            total_rooms,
            total_patients,
            total_doctors,
            total_nurses,
            room_occupancy: rooms
                .into_iter()
                .map(|(room_type, status, count)| RoomGroupCount {
                    room_type,
                    status,
                    count,
                })
                .collect(),
            patient_severity: severities
                .into_iter()
                .map(|(severity, count)| SeverityCount { severity, count })
                .collect(),
        })
    }

    pub async fn dashboard(&self, period: u32) -> Result<DashboardStats, AppError> {
        let since = window_start(period)?;
        let (total_rooms, total_patients, new_patients, total_doctors, total_nurses, assigned, occupied) = tokio::try_join!(
            self.rooms.count(|query| query),
            self.patients.count(|query| query),
            self.patients.count_created_since(since),
            self.users.count_by_role(Role::Doctor.as_str()),
            self.users.count_by_role(Role::Nurse.as_str()),
            self.assignments.count_open(),
            self.rooms.count_by_status(RoomStatus::Occupied.as_str()),
        )?;

        Ok(DashboardStats {
            total_rooms,
            total_patients,
            new_patients,
            total_doctors,
            total_nurses,
            assigned_patients: assigned,
            room_occupancy_rate: occupancy_rate(occupied, total_rooms),
        })
    }

    pub async fn chart_data(&self, period: u32) -> Result<ChartBundle, AppError> {
        let since = window_start(period)?;
        let (room_occupancy, patient_severity, admissions, assignments) = tokio::try_join!(
            self.occupancy(),
            self.severity_since(since),
            self.patients.created_between(since, None),
            self.assignments.opened_between(since, None),
        )?;

        let room_utilization_trend = bucket_by_day(
            assignments
                .iter()
                .map(|(assignment, _)| assignment.assignment_date),
        )
        .into_iter()
        .map(|(date, assignments)| DailyAssignments { date, assignments })
        .collect();

        Ok(ChartBundle {
            room_occupancy,
            patient_severity,
            admissions_trend: daily_counts(admissions),
            room_utilization_trend,
        })
    }

    pub async fn room_occupancy_chart(&self) -> Result<Chart, AppError> {
        let occupancy = self.occupancy().await?;
        Ok(Chart {
            labels: vec![
                "Occupied".to_string(),
                "Available".to_string(),
                "Maintenance".to_string(),
            ],
            datasets: vec![Dataset {
                label: "Rooms by Status".to_string(),
                data: vec![
                    occupancy.occupied as i64,
                    occupancy.available as i64,
                    occupancy.maintenance as i64,
                ],
            }],
            period: None,
        })
    }

    pub async fn patient_severity_chart(&self, period: u32) -> Result<Chart, AppError> {
        let severity = self.severity_since(window_start(period)?).await?;
        Ok(Chart {
            labels: Severity::ALL
                .iter()
                .map(|severity| severity.as_str().to_string())
                .collect(),
            datasets: vec![Dataset {
                label: "Patients by Severity".to_string(),
                data: vec![
                    severity.low,
                    severity.medium,
                    severity.high,
                    severity.critical,
                ],
            }],
            period: Some(period),
        })
    }

    pub async fn admissions_trend_chart(&self, period: u32) -> Result<Chart, AppError> {
        let admissions = self
            .patients
            .created_between(window_start(period)?, None)
            .await?;
        let (labels, data) = daily_counts(admissions)
            .into_iter()
            .map(|day| (day.date, day.count))
            .unzip();
        Ok(Chart {
            labels,
            datasets: vec![Dataset {
                label: "New Patient Admissions".to_string(),
                data,
            }],
            period: Some(period),
        })
    }

    async fn occupancy(&self) -> DaoResult<OccupancyBreakdown> {
        let (occupied, available, maintenance) = tokio::try_join!(
            self.rooms.count_by_status(RoomStatus::Occupied.as_str()),
            self.rooms.count_by_status(RoomStatus::Available.as_str()),
            self.rooms.count_by_status(RoomStatus::Maintenance.as_str()),
        )?;
        Ok(OccupancyBreakdown {
            occupied,
            available,
            maintenance,
        })
    }

    async fn severity_since(
        &self,
        since: DateTime<FixedOffset>,
    ) -> DaoResult<SeverityBreakdown> {
        let counts = self.patients.count_by_severity(Some(since)).await?;
        let mut breakdown = SeverityBreakdown::default();
        for (severity, count) in counts {
            match Severity::try_from(severity.as_str()) {
                Ok(Severity::Low) => breakdown.low += count,
                Ok(Severity::Medium) => breakdown.medium += count,
                Ok(Severity::High) => breakdown.high += count,
                Ok(Severity::Critical) => breakdown.critical += count,
                Err(()) => tracing::warn!(%severity, "ignoring unknown severity"),
            }
        }
        Ok(breakdown)
    }
}

/// Start of the UTC day `period` days ago.
pub fn window_start(period: u32) -> Result<DateTime<FixedOffset>, AppError> {
    let today = Utc::now().date_naive();
    let first_day = today
        .checked_sub_days(Days::new(u64::from(period)))
        .ok_or_else(|| AppError::bad_request("Invalid period"))?;
    Ok(day_start(first_day))
}

pub(crate) fn day_start(day: NaiveDate) -> DateTime<FixedOffset> {
    day.and_time(NaiveTime::MIN).and_utc().fixed_offset()
}

fn occupancy_rate(occupied: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = occupied as f64 * 100.0 / total as f64;
    (rate * 100.0).round() / 100.0
}

/// Counts per UTC calendar day, keyed `YYYY-MM-DD`, ascending.
pub(crate) fn bucket_by_day(
    timestamps: impl IntoIterator<Item = DateTime<FixedOffset>>,
) -> Vec<(String, i64)> {
    let mut buckets: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for ts in timestamps {
        *buckets.entry(ts.with_timezone(&Utc).date_naive()).or_default() += 1;
    }
    buckets
        .into_iter()
        .map(|(day, count)| (day.format("%Y-%m-%d").to_string(), count))
        .collect()
}

pub(crate) fn daily_counts(
    timestamps: impl IntoIterator<Item = DateTime<FixedOffset>>,
) -> Vec<DailyCount> {
    bucket_by_day(timestamps)
        .into_iter()
        .map(|(date, count)| DailyCount { date, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, FixedOffset, TimeZone, Utc};

    use super::{bucket_by_day, occupancy_rate, window_start};
    use crate::auth::Role;
    use crate::test_helpers::{memory_db, seed_patient, seed_room, seed_user, services};

    #[test]
    fn buckets_group_by_utc_day_in_order() {
        let plus_two = FixedOffset::east_opt(2 * 3600).expect("offset");
        let late_local = plus_two
            .with_ymd_and_hms(2026, 3, 2, 1, 30, 0)
            .single()
            .expect("timestamp");
        let utc = FixedOffset::east_opt(0).expect("offset");
        let noon = utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).single().expect("timestamp");
        let next = utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).single().expect("timestamp");

        let buckets = bucket_by_day([next, late_local, noon]);
        assert_eq!(
            buckets,
            vec![("2026-03-01".to_string(), 2), ("2026-03-03".to_string(), 1)]
        );
    }

    #[test]
    fn occupancy_rate_rounds_and_handles_empty() {
        assert_eq!(occupancy_rate(0, 0), 0.0);
        assert_eq!(occupancy_rate(1, 3), 33.33);
        assert_eq!(occupancy_rate(2, 2), 100.0);
    }

    #[test]
    fn window_starts_at_midnight_utc() {
        let start = window_start(7).expect("window should compute");
        let expected_day = Utc::now().date_naive() - Duration::days(7);
        assert_eq!(start.date_naive(), expected_day);
        assert_eq!(start.time(), chrono::NaiveTime::MIN);
    }

    #[tokio::test]
    async fn dashboard_counts_reflect_the_store() {
        let db = memory_db().await;
        let ctx = services(&db);
        seed_user(&db, "dana", "password123", Role::Doctor).await;
        seed_user(&db, "nora", "password123", Role::Nurse).await;
        seed_user(&db, "nick", "password123", Role::Nurse).await;
        let single = seed_room(&db, "100", 1).await;
        seed_room(&db, "101", 2).await;
        let patient = seed_patient(&db, "Jane", "Doe").await;
        seed_patient(&db, "John", "Roe").await;
        ctx.assignments()
            .assign(&db, patient.id, single.id, None)
            .await
            .expect("assignment should succeed");

        let stats = ctx.stats().dashboard(7).await.expect("stats should load");
        assert_eq!(stats.total_rooms, 2);
        assert_eq!(stats.total_patients, 2);
        assert_eq!(stats.new_patients, 2);
        assert_eq!(stats.total_doctors, 1);
        assert_eq!(stats.total_nurses, 2);
        assert_eq!(stats.assigned_patients, 1);
        assert_eq!(stats.room_occupancy_rate, 50.0);

        let overview = ctx.stats().overview().await.expect("overview should load");
        assert_eq!(overview.total_patients, 2);
        assert_eq!(overview.room_occupancy.len(), 2);
        assert_eq!(overview.patient_severity.len(), 1);
        assert_eq!(overview.patient_severity[0].count, 2);

        let charts = ctx.stats().chart_data(7).await.expect("charts should load");
        assert_eq!(charts.room_occupancy.occupied, 1);
        assert_eq!(charts.room_occupancy.available, 1);
        assert_eq!(charts.patient_severity.medium, 2);
        assert_eq!(charts.admissions_trend.len(), 1);
        assert_eq!(charts.admissions_trend[0].count, 2);
        assert_eq!(charts.room_utilization_trend[0].assignments, 1);

        let trend = ctx
            .stats()
            .admissions_trend_chart(7)
            .await
            .expect("trend should load");
        assert_eq!(trend.labels.len(), 1);
        assert_eq!(trend.datasets[0].data, vec![2]);
        assert_eq!(trend.period, Some(7));
    }
}
