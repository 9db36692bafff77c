use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{
    prelude::{Room, RoomAssignment},
    room, room_assignment,
};

#[derive(Clone)]
pub struct AssignmentDao {
    db: DatabaseConnection,
}

impl DaoBase for AssignmentDao {
    type Entity = RoomAssignment;
    const LABEL: &'static str = "Room assignment";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl AssignmentDao {
    pub async fn open_for_patient_in<C>(
        &self,
        conn: &C,
        patient_id: Uuid,
    ) -> DaoResult<Option<room_assignment::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        RoomAssignment::find()
            .filter(room_assignment::Column::PatientId.eq(patient_id))
            .filter(room_assignment::Column::DischargeDate.is_null())
            .one(conn)
            .await
            .map_err(DaoLayerError::from)
    }

    pub async fn open_in<C>(
        &self,
        conn: &C,
        patient_id: Uuid,
        room_id: Uuid,
        assigned_by: Option<Uuid>,
        at: DateTime<FixedOffset>,
    ) -> DaoResult<room_assignment::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let model = room_assignment::ActiveModel {
            patient_id: Set(Some(patient_id)),
            room_id: Set(Some(room_id)),
            assigned_by: Set(assigned_by),
            assignment_date: Set(at),
            discharge_date: Set(None),
            ..Default::default()
        };
        self.create_in(conn, model).await
    }

    pub async fn close_in<C>(
        &self,
        conn: &C,
        id: Uuid,
        at: DateTime<FixedOffset>,
    ) -> DaoResult<room_assignment::Model>
    where
        C: ConnectionTrait + Sync,
    {
        self.update_in(conn, id, move |active| {
            active.discharge_date = Set(Some(at));
        })
        .await
    }

    pub async fn count_open_for_room_in<C>(&self, conn: &C, room_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        RoomAssignment::find()
            .filter(room_assignment::Column::RoomId.eq(room_id))
            .filter(room_assignment::Column::DischargeDate.is_null())
            .count(conn)
            .await
            .map_err(DaoLayerError::from)
    }

    pub async fn count_open(&self) -> DaoResult<u64> {
        self.count(|query| query.filter(room_assignment::Column::DischargeDate.is_null()))
            .await
    }

    /// Open assignment count per room.
    pub async fn open_counts_by_room(&self) -> DaoResult<HashMap<Uuid, u64>> {
        let rows = RoomAssignment::find()
            .select_only()
            .column(room_assignment::Column::RoomId)
            .column_as(
                Expr::expr(Func::count(Expr::col(room_assignment::Column::Id))),
                "count",
            )
            .filter(room_assignment::Column::DischargeDate.is_null())
            .filter(room_assignment::Column::RoomId.is_not_null())
            .group_by(room_assignment::Column::RoomId)
            .into_tuple::<(Option<Uuid>, i64)>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|(room_id, count)| room_id.map(|id| (id, count.max(0) as u64)))
            .collect())
    }

    /// Every open assignment joined with its room, keyed by patient.
    pub async fn open_rooms_by_patient(&self) -> DaoResult<HashMap<Uuid, room::Model>> {
        let rows = RoomAssignment::find()
            .filter(room_assignment::Column::DischargeDate.is_null())
            .find_also_related(Room)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::from)?;

        Ok(rows
            .into_iter()
            .filter_map(|(assignment, room)| Some((assignment.patient_id?, room?)))
            .collect())
    }

    /// Assignments opened in `[from, to)` together with their room, oldest
    /// first.
    pub async fn opened_between(
        &self,
        from: DateTime<FixedOffset>,
        to: Option<DateTime<FixedOffset>>,
    ) -> DaoResult<Vec<(room_assignment::Model, Option<room::Model>)>> {
        let mut query = RoomAssignment::find()
            .filter(room_assignment::Column::AssignmentDate.gte(from));
        if let Some(to) = to {
            query = query.filter(room_assignment::Column::AssignmentDate.lt(to));
        }
        query
            .order_by_asc(room_assignment::Column::AssignmentDate)
            .find_also_related(Room)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::from)
    }
}
