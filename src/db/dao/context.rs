use sea_orm::DatabaseConnection;

use super::{AssignmentDao, DaoBase, PatientDao, RoomDao, StaffDao, TokenDao, UserDao};

#[derive(Clone)]
pub struct DaoContext {
    db: DatabaseConnection,
}

impl DaoContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    pub fn user(&self) -> UserDao {
        DaoBase::new(&self.db)
    }

    pub fn staff(&self) -> StaffDao {
        DaoBase::new(&self.db)
    }

    pub fn token(&self) -> TokenDao {
        DaoBase::new(&self.db)
    }

    pub fn room(&self) -> RoomDao {
        DaoBase::new(&self.db)
    }

    pub fn patient(&self) -> PatientDao {
        DaoBase::new(&self.db)
    }

    pub fn assignment(&self) -> AssignmentDao {
        DaoBase::new(&self.db)
    }
}
