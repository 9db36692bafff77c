use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use super::{DaoBase, DaoLayerError, DaoResult, contains_any};
use crate::db::entities::{
    prelude::{Staff, User},
    staff, user,
};

#[derive(Clone)]
pub struct UserDao {
    db: DatabaseConnection,
}

impl DaoBase for UserDao {
    type Entity = User;
    const LABEL: &'static str = "Staff member";

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<String>,
    pub search: Option<String>,
}

impl UserDao {
    pub async fn find_by_username_in<C>(
        &self,
        conn: &C,
        username: &str,
    ) -> DaoResult<Option<user::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(conn)
            .await
            .map_err(DaoLayerError::from)
    }

    pub async fn find_by_username(&self, username: &str) -> DaoResult<Option<user::Model>> {
        self.find_by_username_in(&self.db, username).await
    }

    /// True when another user already owns `username`.
    pub async fn username_taken_in<C>(
        &self,
        conn: &C,
        username: &str,
        except: Option<Uuid>,
    ) -> DaoResult<bool>
    where
        C: ConnectionTrait + Sync,
    {
        let mut query = User::find().filter(user::Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(user::Column::Id.ne(id));
        }
        let taken = query.count(conn).await.map_err(DaoLayerError::from)?;
        Ok(taken > 0)
    }

    pub async fn create_user_in<C>(
        &self,
        conn: &C,
        username: &str,
        password_hash: &str,
        role: &str,
        full_name: &str,
        email: &str,
    ) -> DaoResult<user::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let model = user::ActiveModel {
            username: Set(username.to_string()),
            password_hash: Set(password_hash.to_string()),
            role: Set(role.to_string()),
            full_name: Set(full_name.to_string()),
            email: Set(email.to_string()),
            ..Default::default()
        };
        self.create_in(conn, model).await
    }

    /// Users joined with their staff detail row, ordered by full name.
    pub async fn list_with_detail(
        &self,
        filter: &UserFilter,
    ) -> DaoResult<Vec<(user::Model, Option<staff::Model>)>> {
        let mut query = User::find().find_also_related(Staff);
        if let Some(role) = filter.role.as_deref() {
            query = query.filter(user::Column::Role.eq(role));
        }
        if let Some(search) = filter.search.as_deref() {
            query = query.filter(contains_any(
                &[user::Column::FullName, user::Column::Email],
                search,
            ));
        }
        query
            .order_by_asc(user::Column::FullName)
            .all(&self.db)
            .await
            .map_err(DaoLayerError::from)
    }

    pub async fn count_by_role(&self, role: &str) -> DaoResult<u64> {
        let role = role.to_string();
        self.count(move |query| query.filter(user::Column::Role.eq(role)))
            .await
    }
}
