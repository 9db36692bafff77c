use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::entities::user;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Nurse,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Nurse => "nurse",
        }
    }

    /// Doctors and nurses carry a staff detail row.
    pub fn has_staff_detail(&self) -> bool {
        matches!(self, Role::Doctor | Role::Nurse)
    }
}

impl TryFrom<&str> for Role {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "nurse" => Ok(Role::Nurse),
            _ => Err(()),
        }
    }
}

/// The user a session token resolved to.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
    pub full_name: String,
    pub email: String,
}

impl TryFrom<user::Model> for Identity {
    type Error = ();

    fn try_from(user: user::Model) -> Result<Self, Self::Error> {
        let role = Role::try_from(user.role.as_str())?;
        Ok(Self {
            id: user.id,
            username: user.username,
            role,
            full_name: user.full_name,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_string_roundtrip() {
        for role in [Role::Admin, Role::Doctor, Role::Nurse] {
            assert_eq!(Role::try_from(role.as_str()), Ok(role));
        }
        assert!(Role::try_from("janitor").is_err());
        assert!(Role::try_from("Admin").is_err());
    }

    #[test]
    fn only_clinical_roles_have_staff_detail() {
        assert!(Role::Doctor.has_staff_detail());
        assert!(Role::Nurse.has_staff_detail());
        assert!(!Role::Admin.has_staff_detail());
    }
}
