use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::Room, room};

#[derive(Clone)]
pub struct RoomDao {
    db: DatabaseConnection,
}

impl DaoBase for RoomDao {
    type Entity = Room;
    const LABEL: &'static str = "Room";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone, Default)]
pub struct RoomFilter {
    pub room_type: Option<String>,
    pub status: Option<String>,
}

impl RoomDao {
    pub async fn create_room(
        &self,
        room_number: &str,
        room_type: &str,
        capacity: i32,
        status: &str,
    ) -> DaoResult<room::Model> {
        let model = room::ActiveModel {
            room_number: Set(room_number.to_string()),
            room_type: Set(room_type.to_string()),
            capacity: Set(capacity),
            status: Set(status.to_string()),
            ..Default::default()
        };
        self.create(model).await
    }

    pub async fn list_filtered(&self, filter: &RoomFilter) -> DaoResult<Vec<room::Model>> {
        let filter = filter.clone();
        self.list(Some((room::Column::RoomNumber, sea_orm::Order::Asc)), move |query| {
            let query = match filter.room_type {
                Some(room_type) => query.filter(room::Column::RoomType.eq(room_type)),
                None => query,
            };
            match filter.status {
                Some(status) => query.filter(room::Column::Status.eq(status)),
                None => query,
            }
        })
        .await
    }

    pub async fn set_status_in<C>(&self, conn: &C, id: Uuid, status: &str) -> DaoResult<room::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let status = status.to_string();
        self.update_in(conn, id, move |active| {
            active.status = Set(status);
        })
        .await
    }

    pub async fn count_by_status(&self, status: &str) -> DaoResult<u64> {
        let status = status.to_string();
        self.count(move |query| query.filter(room::Column::Status.eq(status)))
            .await
    }

    /// Room counts grouped by `(room_type, status)`.
    pub async fn count_by_type_and_status(&self) -> DaoResult<Vec<(String, String, i64)>> {
        Room::find()
            .select_only()
            .column(room::Column::RoomType)
            .column(room::Column::Status)
            .column_as(Expr::expr(Func::count(Expr::col(room::Column::Id))), "count")
            .group_by(room::Column::RoomType)
            .group_by(room::Column::Status)
            .order_by_asc(room::Column::RoomType)
            .order_by_asc(room::Column::Status)
            .into_tuple::<(String, String, i64)>()
            .all(&self.db)
            .await
            .map_err(DaoLayerError::from)
    }
}
