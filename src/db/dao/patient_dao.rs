use chrono::{DateTime, FixedOffset};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::{DaoBase, DaoLayerError, DaoResult, contains_any};
use crate::db::entities::{prelude::Patient, patient};

#[derive(Clone)]
pub struct PatientDao {
    db: DatabaseConnection,
}

impl DaoBase for PatientDao {
    type Entity = Patient;
    const LABEL: &'static str = "Patient";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatientFilter {
    /// Matched against first name, last name and patient code.
    pub search: Option<String>,
    pub severity: Option<String>,
}

impl PatientDao {
    pub async fn list_filtered(&self, filter: &PatientFilter) -> DaoResult<Vec<patient::Model>> {
        let filter = filter.clone();
        self.list(None, move |query| {
            let query = match filter.search {
                Some(search) => query.filter(contains_any(
                    &[
                        patient::Column::FirstName,
                        patient::Column::LastName,
                        patient::Column::PatientId,
                    ],
                    &search,
                )),
                None => query,
            };
            match filter.severity {
                Some(severity) => query.filter(patient::Column::Severity.eq(severity)),
                None => query,
            }
        })
        .await
    }

    pub async fn count_created_since(&self, since: DateTime<FixedOffset>) -> DaoResult<u64> {
        self.count(move |query| query.filter(patient::Column::CreatedAt.gte(since)))
            .await
    }

    /// Admission timestamps in `[from, to)`, oldest first.
    pub async fn created_between(
        &self,
        from: DateTime<FixedOffset>,
        to: Option<DateTime<FixedOffset>>,
    ) -> DaoResult<Vec<DateTime<FixedOffset>>> {
        let mut query = Patient::find()
            .select_only()
            .column(patient::Column::CreatedAt)
            .filter(patient::Column::CreatedAt.gte(from));
        if let Some(to) = to {
            query = query.filter(patient::Column::CreatedAt.lt(to));
        }
        query
            .order_by_asc(patient::Column::CreatedAt)
            .into_tuple::<DateTime<FixedOffset>>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::from)
    }

    /// Patient counts per severity, optionally limited to admissions since
    /// `since`.
    pub async fn count_by_severity(
        &self,
        since: Option<DateTime<FixedOffset>>,
    ) -> DaoResult<Vec<(String, i64)>> {
        let mut query = Patient::find()
            .select_only()
            .column(patient::Column::Severity)
            .column_as(Expr::expr(Func::count(Expr::col(patient::Column::Id))), "count");
        if let Some(since) = since {
            query = query.filter(patient::Column::CreatedAt.gte(since));
        }
        query
            .group_by(patient::Column::Severity)
            .order_by_asc(patient::Column::Severity)
            .into_tuple::<(String, i64)>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::from)
    }
}
