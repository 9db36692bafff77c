use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Days, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::{
    db::dao::{AssignmentDao, PatientDao},
    error::AppError,
    services::stats_service::{DailyCount, RoomGroupCount, daily_counts, day_start},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    #[default]
    Occupancy,
    Admissions,
}

impl TryFrom<&str> for ReportKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "occupancy" => Ok(ReportKind::Occupancy),
            "admissions" => Ok(ReportKind::Admissions),
            _ => Err(()),
        }
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, AppError> {
        let today = Utc::now().date_naive();
        let start = match start {
            Some(start) => start,
            None => today
                .with_day(1)
                .ok_or_else(|| AppError::internal("first day of month is always valid"))?,
        };
        let end = end.unwrap_or(today);
        if start > end {
            return Err(AppError::bad_request("Start date must not be after end date"));
        }
        Ok(Self { start, end })
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReportRows {
    Occupancy(Vec<RoomGroupCount>),
    Admissions(Vec<DailyCount>),
}

#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rows: ReportRows,
}

#[derive(Clone)]
pub struct ReportService {
    patients: PatientDao,
    assignments: AssignmentDao,
}

impl ReportService {
    pub fn new(patients: PatientDao, assignments: AssignmentDao) -> Self {
        Self {
            patients,
            assignments,
        }
    }

    pub async fn export(&self, kind: ReportKind, range: DateRange) -> Result<Report, AppError> {
        let rows = match kind {
            ReportKind::Occupancy => ReportRows::Occupancy(self.occupancy(range).await?),
            ReportKind::Admissions => ReportRows::Admissions(self.admissions(range).await?),
        };
        tracing::info!(?kind, start = %range.start, end = %range.end, "report exported");
        Ok(Report {
            kind,
            start: range.start,
            end: range.end,
            rows,
        })
    }

    /// Assignments opened within the range, grouped by the room's type and
    /// current status.
    pub async fn occupancy(&self, range: DateRange) -> Result<Vec<RoomGroupCount>, AppError> {
        let (from, to) = bounds(range)?;
        let rows = self.assignments.opened_between(from, Some(to)).await?;

        let mut groups: BTreeMap<(String, String), i64> = BTreeMap::new();
        for room in rows.into_iter().filter_map(|(_, room)| room) {
            *groups.entry((room.room_type, room.status)).or_default() += 1;
        }
        Ok(groups
            .into_iter()
            .map(|((room_type, status), count)| RoomGroupCount {
                room_type,
                status,
                count,
            })
            .collect())
    }

    pub async fn admissions(&self, range: DateRange) -> Result<Vec<DailyCount>, AppError> {
        let (from, to) = bounds(range)?;
        let created = self.patients.created_between(from, Some(to)).await?;
        Ok(daily_counts(created))
    }
}

/// `[start of first day, start of the day after the last)`.
fn bounds(range: DateRange) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), AppError> {
    let after_end = range
        .end
        .checked_add_days(Days::new(1))
        .ok_or_else(|| AppError::bad_request("Invalid end date"))?;
    Ok((day_start(range.start), day_start(after_end)))
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, NaiveDate, Utc};

    use super::{DateRange, ReportKind, ReportRows};
    use crate::error::ErrorKind;
    use crate::test_helpers::{memory_db, seed_patient, seed_room, services};

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    #[test]
    fn range_defaults_to_month_to_date() {
        let range = DateRange::new(None, None).expect("default range");
        assert_eq!(range.start.day(), 1);
        assert_eq!(range.end, today());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let start = NaiveDate::from_ymd_opt(2026, 5, 2).expect("date");
        let end = NaiveDate::from_ymd_opt(2026, 5, 1).expect("date");
        let err = DateRange::new(Some(start), Some(end)).expect_err("range should fail");
        assert_eq!(err.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn kind_parses_known_values_only() {
        assert_eq!(ReportKind::try_from("admissions"), Ok(ReportKind::Admissions));
        assert_eq!(ReportKind::default(), ReportKind::Occupancy);
        assert!(ReportKind::try_from("billing").is_err());
    }

    #[tokio::test]
    async fn reports_include_today_when_end_is_today() {
        let db = memory_db().await;
        let ctx = services(&db);
        let ward = seed_room(&db, "100", 4).await;
        let jane = seed_patient(&db, "Jane", "Doe").await;
        let john = seed_patient(&db, "John", "Roe").await;
        for patient in [&jane, &john] {
            ctx.assignments()
                .assign(&db, patient.id, ward.id, None)
                .await
                .expect("assignment should succeed");
        }
        let range = DateRange::new(Some(today()), Some(today())).expect("range");

        let occupancy = ctx.reports().occupancy(range).await.expect("occupancy");
        assert_eq!(occupancy.len(), 1);
        assert_eq!(occupancy[0].room_type, "General");
        assert_eq!(occupancy[0].count, 2);

        let report = ctx
            .reports()
            .export(ReportKind::Admissions, range)
            .await
            .expect("admissions");
        match report.rows {
            ReportRows::Admissions(days) => {
                assert_eq!(days.len(), 1);
                assert_eq!(days[0].count, 2);
            }
            other => panic!("unexpected rows: {other:?}"),
        }
    }

    #[tokio::test]
    async fn ranges_in_the_past_are_empty() {
        let db = memory_db().await;
        let ctx = services(&db);
        seed_patient(&db, "Jane", "Doe").await;
        let start = NaiveDate::from_ymd_opt(2001, 1, 1).expect("date");
        let end = NaiveDate::from_ymd_opt(2001, 1, 31).expect("date");
        let range = DateRange::new(Some(start), Some(end)).expect("range");

        assert!(ctx.reports().admissions(range).await.expect("admissions").is_empty());
        assert!(ctx.reports().occupancy(range).await.expect("occupancy").is_empty());
    }
}
