use sea_orm::{ConnectionTrait, DatabaseConnection, Set};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    auth::{Role, password::hash_password},
    db::{
        dao::{DaoBase, StaffDao, UserDao, UserFilter},
        entities::user,
    },
    error::AppError,
    services::{Created, begin, finish},
};

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
    pub specialization: Option<String>,
    pub shift: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StaffChanges {
    pub username: Option<String>,
    /// Re-hashed before storage.
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub specialization: Option<String>,
    pub shift: Option<String>,
}

impl StaffChanges {
    fn touches_user_row(&self) -> bool {
        self.username.is_some()
            || self.password.is_some()
            || self.full_name.is_some()
            || self.email.is_some()
            || self.role.is_some()
    }

    pub fn is_empty(&self) -> bool {
        !self.touches_user_row() && self.specialization.is_none() && self.shift.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct StaffView {
    #[serde(flatten)]
    pub user: user::Model,
    pub specialization: Option<String>,
    pub shift: Option<String>,
}

#[derive(Clone)]
pub struct StaffService {
    db: DatabaseConnection,
    users: UserDao,
    details: StaffDao,
}

impl StaffService {
    pub fn new(db: DatabaseConnection, users: UserDao, details: StaffDao) -> Self {
        Self { db, users, details }
    }

    pub async fn list(&self, filter: &UserFilter) -> Result<Vec<StaffView>, AppError> {
        let rows = self.users.list_with_detail(filter).await?;
        Ok(rows
            .into_iter()
            .map(|(user, detail)| {
                let (specialization, shift) = detail
                    .map(|detail| (detail.specialization, detail.shift))
                    .unwrap_or_default();
                StaffView {
                    user,
                    specialization,
                    shift,
                }
            })
            .collect())
    }

    pub async fn create(&self, input: NewStaff) -> Result<Created, AppError> {
        let password_hash = hash_password(&input.password)?;

        let txn = begin(&self.db).await?;
        let result = self.create_in(&txn, &input, &password_hash).await;
        let created = finish(txn, result)
            .await
            .map_err(|err| err.context("add staff"))?;

        tracing::info!(user_id = %created.id, role = input.role.as_str(), "staff member created");
        Ok(created)
    }

    async fn create_in<C>(
        &self,
        conn: &C,
        input: &NewStaff,
        password_hash: &str,
    ) -> Result<Created, AppError>
    where
        C: ConnectionTrait + Sync,
    {
        if self.users.username_taken_in(conn, &input.username, None).await? {
            return Err(AppError::conflict("Username already exists"));
        }

        let user = self
            .users
            .create_user_in(
                conn,
                &input.username,
                password_hash,
                input.role.as_str(),
                &input.full_name,
                &input.email,
            )
            .await?;

        if input.role.has_staff_detail() {
            self.details
                .upsert_in(
                    conn,
                    user.id,
                    input.specialization.clone(),
                    input.shift.clone(),
                )
                .await?;
        }

        Ok(Created { id: user.id })
    }

    /// Sparse update. The staff detail row follows the effective role: it
    /// is created or updated for doctors and nurses, removed for admins.
    pub async fn update(&self, id: Uuid, changes: StaffChanges) -> Result<(), AppError> {
        if changes.is_empty() {
            return Err(AppError::bad_request("No fields to update"));
        }

        let password_hash = match changes.password.as_deref() {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let txn = begin(&self.db).await?;
        let result = self.update_in(&txn, id, changes, password_hash).await;
        finish(txn, result)
            .await
            .map_err(|err| err.context("update staff"))?;

        tracing::info!(user_id = %id, "staff member updated");
        Ok(())
    }

    async fn update_in<C>(
        &self,
        conn: &C,
        id: Uuid,
        changes: StaffChanges,
        password_hash: Option<String>,
    ) -> Result<(), AppError>
    where
        C: ConnectionTrait + Sync,
    {
        if let Some(username) = changes.username.as_deref() {
            if self.users.username_taken_in(conn, username, Some(id)).await? {
                return Err(AppError::conflict("Username already exists"));
            }
        }

        let user = if changes.touches_user_row() {
            let StaffChanges {
                username,
                full_name,
                email,
                role,
                ..
            } = changes.clone();
            self.users
                .update_in(conn, id, move |active| {
                    if let Some(username) = username {
                        active.username = Set(username);
                    }
                    if let Some(password_hash) = password_hash {
                        active.password_hash = Set(password_hash);
                    }
                    if let Some(full_name) = full_name {
                        active.full_name = Set(full_name);
                    }
                    if let Some(email) = email {
                        active.email = Set(email);
                    }
                    if let Some(role) = role {
                        active.role = Set(role.as_str().to_string());
                    }
                })
                .await?
        } else {
            self.users.find_by_id_in(conn, id).await?
        };

        let effective_role = Role::try_from(user.role.as_str())
            .map_err(|_| AppError::internal(format!("User {id} has unknown role {}", user.role)))?;

        if effective_role.has_staff_detail() {
            self.details
                .upsert_in(conn, id, changes.specialization, changes.shift)
                .await?;
        } else {
            self.details.delete_by_user_in(conn, id).await?;
        }
        Ok(())
    }

    /// Removes the staff detail row, then the user.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let txn = begin(&self.db).await?;
        let result = self.delete_in(&txn, id).await;
        finish(txn, result)
            .await
            .map_err(|err| err.context("delete staff"))?;

        tracing::info!(user_id = %id, "staff member deleted");
        Ok(())
    }

    async fn delete_in<C>(&self, conn: &C, id: Uuid) -> Result<(), AppError>
    where
        C: ConnectionTrait + Sync,
    {
        self.users.find_by_id_in(conn, id).await?;
        self.details.delete_by_user_in(conn, id).await?;
        self.users.delete_in(conn, id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{EntityTrait, PaginatorTrait};
    use uuid::Uuid;

    use super::{NewStaff, StaffChanges};
    use crate::auth::Role;
    use crate::db::dao::{DaoBase, DaoContext, UserFilter};
    use crate::db::entities::prelude::Staff;
    use crate::error::ErrorKind;
    use crate::test_helpers::{memory_db, services};

    fn doctor(username: &str) -> NewStaff {
        NewStaff {
            username: username.to_string(),
            password: "password123".to_string(),
            full_name: "Dana Doctor".to_string(),
            email: format!("{username}@hospital.local"),
            role: Role::Doctor,
            specialization: Some("Cardiology".to_string()),
            shift: Some("night".to_string()),
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_adds_detail() {
        let db = memory_db().await;
        let staff = services(&db).staff();

        let created = staff.create(doctor("dana")).await.expect("create should succeed");

        let user = DaoContext::new(&db)
            .user()
            .find_by_id(created.id)
            .await
            .expect("user should exist");
        assert_ne!(user.password_hash, "password123");

        let listed = staff.list(&UserFilter::default()).await.expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].specialization.as_deref(), Some("Cardiology"));
        let json = serde_json::to_value(&listed[0]).expect("view should serialize");
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "dana");
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict() {
        let db = memory_db().await;
        let staff = services(&db).staff();
        staff.create(doctor("dana")).await.expect("create should succeed");

        let err = staff
            .create(doctor("dana"))
            .await
            .expect_err("duplicate should fail");
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn promoting_to_admin_removes_the_detail_row() {
        let db = memory_db().await;
        let staff = services(&db).staff();
        let created = staff.create(doctor("dana")).await.expect("create should succeed");

        staff
            .update(
                created.id,
                StaffChanges {
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .expect("update should succeed");
        assert_eq!(Staff::find().count(&db).await.expect("count"), 0);

        staff
            .update(
                created.id,
                StaffChanges {
                    role: Some(Role::Nurse),
                    shift: Some("day".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update should succeed");
        let listed = staff.list(&UserFilter::default()).await.expect("list");
        assert_eq!(listed[0].user.role, "nurse");
        assert_eq!(listed[0].shift.as_deref(), Some("day"));
    }

    #[tokio::test]
    async fn search_and_role_filters() {
        let db = memory_db().await;
        let staff = services(&db).staff();
        staff.create(doctor("dana")).await.expect("create should succeed");
        staff
            .create(NewStaff {
                username: "nora".to_string(),
                full_name: "Nora Nurse".to_string(),
                email: "nora@ward.example".to_string(),
                role: Role::Nurse,
                ..doctor("nora")
            })
            .await
            .expect("create should succeed");

        let nurses = staff
            .list(&UserFilter {
                role: Some("nurse".to_string()),
                search: None,
            })
            .await
            .expect("list");
        assert_eq!(nurses.len(), 1);

        let by_email = staff
            .list(&UserFilter {
                role: None,
                search: Some("WARD.EXAMPLE".to_string()),
            })
            .await
            .expect("list");
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].user.username, "nora");
    }

    #[tokio::test]
    async fn delete_removes_user_and_detail() {
        let db = memory_db().await;
        let staff = services(&db).staff();
        let created = staff.create(doctor("dana")).await.expect("create should succeed");

        staff.delete(created.id).await.expect("delete should succeed");
        assert_eq!(Staff::find().count(&db).await.expect("count"), 0);

        let err = staff
            .delete(Uuid::new_v4())
            .await
            .expect_err("unknown id should fail");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
