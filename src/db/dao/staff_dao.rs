use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult};
use crate::db::entities::{prelude::Staff, staff};

#[derive(Clone)]
pub struct StaffDao {
    db: DatabaseConnection,
}

impl DaoBase for StaffDao {
    type Entity = Staff;
    const LABEL: &'static str = "Staff detail";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl StaffDao {
    pub async fn find_by_user_in<C>(&self, conn: &C, user_id: Uuid) -> DaoResult<Option<staff::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        Staff::find()
            .filter(staff::Column::UserId.eq(user_id))
            .one(conn)
            .await
            .map_err(DaoLayerError::from)
    }

    /// Inserts the detail row, or overwrites only the fields given when it
    /// already exists.
    pub async fn upsert_in<C>(
        &self,
        conn: &C,
        user_id: Uuid,
        specialization: Option<String>,
        shift: Option<String>,
    ) -> DaoResult<staff::Model>
    where
        C: ConnectionTrait + Sync,
    {
        match self.find_by_user_in(conn, user_id).await? {
            Some(existing) => {
                self.update_in(conn, existing.id, move |active| {
                    if let Some(specialization) = specialization {
                        active.specialization = Set(Some(specialization));
                    }
                    if let Some(shift) = shift {
                        active.shift = Set(Some(shift));
                    }
                })
                .await
            }
            None => {
                let model = staff::ActiveModel {
                    user_id: Set(user_id),
                    specialization: Set(specialization),
                    shift: Set(shift),
                    ..Default::default()
                };
                self.create_in(conn, model).await
            }
        }
    }

    pub async fn delete_by_user_in<C>(&self, conn: &C, user_id: Uuid) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        let result = Staff::delete_many()
            .filter(staff::Column::UserId.eq(user_id))
            .exec(conn)
            .await
            .map_err(DaoLayerError::from)?;
        Ok(result.rows_affected)
    }
}
