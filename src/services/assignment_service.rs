//! The per-patient current-room state machine.
//!
//! A patient is either unassigned (no open row) or assigned to exactly one
//! room (one `room_assignments` row with a null `discharge_date`). Rows are
//! only ever closed, never deleted, so the table doubles as occupancy
//! history.
//!
//! Every transition takes the connection to run on; callers pass their open
//! transaction so the assignment writes commit or roll back together with
//! the patient writes around them.

use chrono::Utc;
use sea_orm::ConnectionTrait;
use uuid::Uuid;

use crate::{
    db::{
        dao::{AssignmentDao, DaoBase, DaoLayerError, RoomDao},
        entities::room_assignment,
    },
    error::AppError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Occupied => "occupied",
            RoomStatus::Maintenance => "maintenance",
        }
    }
}

impl TryFrom<&str> for RoomStatus {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "available" => Ok(RoomStatus::Available),
            "occupied" => Ok(RoomStatus::Occupied),
            "maintenance" => Ok(RoomStatus::Maintenance),
            _ => Err(()),
        }
    }
}

/// What `assign` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// The patient already occupied the requested room.
    Unchanged(room_assignment::Model),
    /// A new open row, plus the row it replaced if the patient was moved.
    Opened {
        current: room_assignment::Model,
        closed: Option<room_assignment::Model>,
    },
}

#[derive(Clone)]
pub struct AssignmentService {
    assignments: AssignmentDao,
    rooms: RoomDao,
}

impl AssignmentService {
    pub fn new(assignments: AssignmentDao, rooms: RoomDao) -> Self {
        Self { assignments, rooms }
    }

    pub async fn current<C>(
        &self,
        conn: &C,
        patient_id: Uuid,
    ) -> Result<Option<room_assignment::Model>, AppError>
    where
        C: ConnectionTrait + Sync,
    {
        Ok(self
            .assignments
            .open_for_patient_in(conn, patient_id)
            .await?)
    }

    pub async fn assign<C>(
        &self,
        conn: &C,
        patient_id: Uuid,
        room_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<Assignment, AppError>
    where
        C: ConnectionTrait + Sync,
    {
        self.rooms.find_by_id_in(conn, room_id).await?;

        let open = self.current(conn, patient_id).await?;
        if let Some(same) = open.as_ref().filter(|row| row.room_id == Some(room_id)) {
            return Ok(Assignment::Unchanged(same.clone()));
        }

        let now = Utc::now().fixed_offset();
        let closed = match open {
            Some(open) => {
                let closed = self.assignments.close_in(conn, open.id, now).await?;
                if let Some(previous_room) = closed.room_id {
                    self.reconcile_room_status(conn, previous_room).await?;
                }
                Some(closed)
            }
            None => None,
        };

        let current = self
            .assignments
            .open_in(conn, patient_id, room_id, assigned_by, now)
            .await?;
        self.reconcile_room_status(conn, room_id).await?;

        tracing::info!(
            %patient_id,
            %room_id,
            from_room = ?closed.as_ref().and_then(|row| row.room_id),
            "patient assigned to room"
        );
        Ok(Assignment::Opened { current, closed })
    }

    /// Closes the open assignment, if any. Never inserts rows.
    pub async fn discharge<C>(
        &self,
        conn: &C,
        patient_id: Uuid,
    ) -> Result<Option<room_assignment::Model>, AppError>
    where
        C: ConnectionTrait + Sync,
    {
        let Some(open) = self.current(conn, patient_id).await? else {
            return Ok(None);
        };

        let closed = self
            .assignments
            .close_in(conn, open.id, Utc::now().fixed_offset())
            .await?;
        if let Some(room_id) = closed.room_id {
            self.reconcile_room_status(conn, room_id).await?;
        }

        tracing::info!(%patient_id, room_id = ?closed.room_id, "patient discharged from room");
        Ok(Some(closed))
    }

    /// An explicit "no room" from a patient update. Same transition as
    /// `discharge`.
    pub async fn clear<C>(
        &self,
        conn: &C,
        patient_id: Uuid,
    ) -> Result<Option<room_assignment::Model>, AppError>
    where
        C: ConnectionTrait + Sync,
    {
        self.discharge(conn, patient_id).await
    }

    /// Rooms under maintenance keep their status. Otherwise a room is
    /// occupied once its open assignments reach capacity.
    pub(crate) async fn reconcile_room_status<C>(
        &self,
        conn: &C,
        room_id: Uuid,
    ) -> Result<(), AppError>
    where
        C: ConnectionTrait + Sync,
    {
        let room = match self.rooms.find_by_id_in(conn, room_id).await {
            Ok(room) => room,
            Err(DaoLayerError::NotFound { .. }) => return Ok(()),
            Err(err) => return Err(err.into()),
        };

        if RoomStatus::try_from(room.status.as_str()) == Ok(RoomStatus::Maintenance) {
            return Ok(());
        }

        let open = self.assignments.count_open_for_room_in(conn, room_id).await?;
        let capacity = u64::try_from(room.capacity.max(1)).unwrap_or(1);
        let status = if open >= capacity {
            RoomStatus::Occupied
        } else {
            RoomStatus::Available
        };

        if room.status != status.as_str() {
            self.rooms.set_status_in(conn, room_id, status.as_str()).await?;
            tracing::debug!(%room_id, status = status.as_str(), "room status reconciled");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
    use uuid::Uuid;

    use super::Assignment;
    use crate::db::dao::{DaoBase, DaoContext, DaoLayerError};
    use crate::db::entities::{prelude::RoomAssignment, room, room_assignment};
    use crate::error::ErrorKind;
    use crate::test_helpers::{memory_db, seed_patient, seed_room, services};

    async fn rows_for(db: &DatabaseConnection, patient_id: Uuid) -> Vec<room_assignment::Model> {
        RoomAssignment::find()
            .filter(room_assignment::Column::PatientId.eq(patient_id))
            .all(db)
            .await
            .expect("assignment rows should load")
    }

    async fn room(db: &DatabaseConnection, id: Uuid) -> room::Model {
        DaoContext::new(db)
            .room()
            .find_by_id(id)
            .await
            .expect("room should load")
    }

    #[tokio::test]
    async fn reassignment_closes_the_previous_row() {
        let db = memory_db().await;
        let lifecycle = services(&db).assignments();
        let patient = seed_patient(&db, "Jane", "Doe").await;
        let first = seed_room(&db, "101", 1).await;
        let second = seed_room(&db, "102", 1).await;

        lifecycle
            .assign(&db, patient.id, first.id, None)
            .await
            .expect("first assignment should succeed");
        let moved = lifecycle
            .assign(&db, patient.id, second.id, None)
            .await
            .expect("second assignment should succeed");
        assert!(matches!(moved, Assignment::Opened { closed: Some(_), .. }));

        let rows = rows_for(&db, patient.id).await;
        assert_eq!(rows.len(), 2);
        let open: Vec<_> = rows.iter().filter(|row| row.discharge_date.is_none()).collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].room_id, Some(second.id));
        let closed = rows
            .iter()
            .find(|row| row.room_id == Some(first.id))
            .expect("first row should remain");
        assert!(closed.discharge_date.is_some());

        assert_eq!(room(&db, first.id).await.status, "available");
        assert_eq!(room(&db, second.id).await.status, "occupied");
    }

    #[tokio::test]
    async fn assigning_the_same_room_is_a_no_op() {
        let db = memory_db().await;
        let lifecycle = services(&db).assignments();
        let patient = seed_patient(&db, "Jane", "Doe").await;
        let ward = seed_room(&db, "201", 4).await;

        lifecycle
            .assign(&db, patient.id, ward.id, None)
            .await
            .expect("assignment should succeed");
        let again = lifecycle
            .assign(&db, patient.id, ward.id, None)
            .await
            .expect("repeat assignment should succeed");

        assert!(matches!(again, Assignment::Unchanged(_)));
        assert_eq!(rows_for(&db, patient.id).await.len(), 1);
        assert_eq!(room(&db, ward.id).await.status, "available");
    }

    #[tokio::test]
    async fn discharge_without_open_row_changes_nothing() {
        let db = memory_db().await;
        let lifecycle = services(&db).assignments();
        let patient = seed_patient(&db, "John", "Roe").await;

        let closed = lifecycle
            .discharge(&db, patient.id)
            .await
            .expect("discharge should succeed");
        assert!(closed.is_none());
        assert!(rows_for(&db, patient.id).await.is_empty());
    }

    #[tokio::test]
    async fn clear_closes_the_open_row_and_frees_the_room() {
        let db = memory_db().await;
        let lifecycle = services(&db).assignments();
        let patient = seed_patient(&db, "John", "Roe").await;
        let single = seed_room(&db, "301", 1).await;

        lifecycle
            .assign(&db, patient.id, single.id, None)
            .await
            .expect("assignment should succeed");
        assert_eq!(room(&db, single.id).await.status, "occupied");

        lifecycle
            .clear(&db, patient.id)
            .await
            .expect("clear should succeed")
            .expect("an open row should have been closed");
        assert!(
            lifecycle
                .current(&db, patient.id)
                .await
                .expect("lookup should succeed")
                .is_none()
        );
        assert_eq!(room(&db, single.id).await.status, "available");
    }

    #[tokio::test]
    async fn unknown_room_is_not_found() {
        let db = memory_db().await;
        let lifecycle = services(&db).assignments();
        let patient = seed_patient(&db, "John", "Roe").await;

        let err = lifecycle
            .assign(&db, patient.id, Uuid::new_v4(), None)
            .await
            .expect_err("assignment should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(rows_for(&db, patient.id).await.is_empty());
    }

    #[tokio::test]
    async fn maintenance_rooms_keep_their_status() {
        let db = memory_db().await;
        let daos = DaoContext::new(&db);
        let lifecycle = services(&db).assignments();
        let patient = seed_patient(&db, "Jane", "Doe").await;
        let closed_ward = daos
            .room()
            .create_room("401", "ICU", 1, "maintenance")
            .await
            .expect("room should be created");

        lifecycle
            .assign(&db, patient.id, closed_ward.id, None)
            .await
            .expect("assignment should succeed");
        assert_eq!(room(&db, closed_ward.id).await.status, "maintenance");
    }

    #[tokio::test]
    async fn second_open_row_is_rejected_by_the_store() {
        let db = memory_db().await;
        let daos = DaoContext::new(&db);
        let patient = seed_patient(&db, "Jane", "Doe").await;
        let first = seed_room(&db, "501", 2).await;
        let second = seed_room(&db, "502", 2).await;
        let now = chrono::Utc::now().fixed_offset();

        daos.assignment()
            .open_in(&db, patient.id, first.id, None, now)
            .await
            .expect("first open row should insert");
        let err = daos
            .assignment()
            .open_in(&db, patient.id, second.id, None, now)
            .await
            .expect_err("second open row should violate the index");
        assert!(matches!(err, DaoLayerError::UniqueViolation(_)));

        let open = rows_for(&db, patient.id)
            .await
            .into_iter()
            .filter(|row| row.discharge_date.is_none())
            .count();
        assert_eq!(open, 1);
    }
}
