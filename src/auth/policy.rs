use super::{Identity, Role};
use crate::error::AppError;

/// Capability levels gating operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Authenticated,
    MedicalStaff,
    Admin,
}

pub fn authorize(identity: &Identity, access: Access) -> Result<(), AppError> {
    match access {
        Access::Authenticated => Ok(()),
        Access::MedicalStaff
            if matches!(identity.role, Role::Admin | Role::Doctor | Role::Nurse) =>
        {
            Ok(())
        }
        Access::MedicalStaff => Err(AppError::forbidden("Medical staff access required")),
        Access::Admin if identity.role == Role::Admin => Ok(()),
        Access::Admin => Err(AppError::forbidden("Admin access required")),
    }
}

pub trait RequiredAccess {
    fn required() -> Access;
}

pub struct Authenticated;

impl RequiredAccess for Authenticated {
    fn required() -> Access {
        Access::Authenticated
    }
}

pub struct MedicalStaff;

impl RequiredAccess for MedicalStaff {
    fn required() -> Access {
        Access::MedicalStaff
    }
}

pub struct AdminOnly;

impl RequiredAccess for AdminOnly {
    fn required() -> Access {
        Access::Admin
    }
}
