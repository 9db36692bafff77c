use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{
        dao::{AssignmentDao, DaoBase, RoomDao, RoomFilter},
        entities::room,
    },
    error::AppError,
    services::{
        Created,
        assignment_service::{AssignmentService, RoomStatus},
        begin, finish,
    },
};

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub room_number: String,
    pub room_type: String,
    pub capacity: i32,
    pub status: RoomStatus,
}

#[derive(Debug, Clone, Default)]
pub struct RoomChanges {
    pub room_number: Option<String>,
    pub room_type: Option<String>,
    pub capacity: Option<i32>,
    pub status: Option<RoomStatus>,
}

impl RoomChanges {
    pub fn is_empty(&self) -> bool {
        self.room_number.is_none()
            && self.room_type.is_none()
            && self.capacity.is_none()
            && self.status.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct RoomView {
    #[serde(flatten)]
    pub room: room::Model,
    /// Open assignments for this room.
    pub patient_count: u64,
}

#[derive(Clone)]
pub struct RoomService {
    db: DatabaseConnection,
    rooms: RoomDao,
    assignments: AssignmentDao,
    lifecycle: AssignmentService,
}

impl RoomService {
    pub fn new(
        db: DatabaseConnection,
        rooms: RoomDao,
        assignments: AssignmentDao,
        lifecycle: AssignmentService,
    ) -> Self {
        Self {
            db,
            rooms,
            assignments,
            lifecycle,
        }
    }

    pub async fn list(&self, filter: &RoomFilter) -> Result<Vec<RoomView>, AppError> {
        let (rooms, counts) = tokio::try_join!(
            self.rooms.list_filtered(filter),
            self.assignments.open_counts_by_room()
        )?;

        Ok(rooms
            .into_iter()
            .map(|room| {
                let patient_count = counts.get(&room.id).copied().unwrap_or(0);
                RoomView {
                    room,
                    patient_count,
                }
            })
            .collect())
    }

    pub async fn create(&self, input: NewRoom) -> Result<Created, AppError> {
        let room = self
            .rooms
            .create_room(
                &input.room_number,
                &input.room_type,
                input.capacity,
                input.status.as_str(),
            )
            .await
            .map_err(|err| AppError::from(err).context("add room"))?;
        tracing::info!(room_id = %room.id, room_number = %room.room_number, "room created");
        Ok(Created { id: room.id })
    }

    pub async fn update(&self, id: Uuid, changes: RoomChanges) -> Result<(), AppError> {
        if changes.is_empty() {
            return Err(AppError::bad_request("No fields to update"));
        }

        let txn = begin(&self.db).await?;
        let result = self.update_in(&txn, id, changes).await;
        finish(txn, result)
            .await
            .map_err(|err| err.context("update room"))?;

        tracing::info!(room_id = %id, "room updated");
        Ok(())
    }

    /// A new capacity or a status leaving maintenance can change whether
    /// the room is full, so the status is reconciled after the write.
    async fn update_in<C>(&self, conn: &C, id: Uuid, changes: RoomChanges) -> Result<(), AppError>
    where
        C: ConnectionTrait + Sync,
    {
        self.rooms
            .update_in(conn, id, move |active| {
                if let Some(room_number) = changes.room_number {
                    active.room_number = Set(room_number);
                }
                if let Some(room_type) = changes.room_type {
                    active.room_type = Set(room_type);
                }
                if let Some(capacity) = changes.capacity {
                    active.capacity = Set(capacity);
                }
                if let Some(status) = changes.status {
                    active.status = Set(status.as_str().to_string());
                }
            })
            .await?;
        self.lifecycle.reconcile_room_status(conn, id).await
    }

    /// Refuses while any patient is still assigned to the room.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let txn = begin(&self.db).await?;
        let result = self.delete_unoccupied_in(&txn, id).await;
        finish(txn, result)
            .await
            .map_err(|err| err.context("delete room"))?;

        tracing::info!(room_id = %id, "room deleted");
        Ok(())
    }

    async fn delete_unoccupied_in<C>(&self, conn: &C, id: Uuid) -> Result<(), AppError>
    where
        C: ConnectionTrait + Sync,
    {
        self.rooms.find_by_id_in(conn, id).await?;
        let open = self.assignments.count_open_for_room_in(conn, id).await?;
        if open > 0 {
            return Err(AppError::conflict("Cannot delete room with assigned patients"));
        }
        self.rooms.delete_in(conn, id).await?;
        Ok(())
    }
}
