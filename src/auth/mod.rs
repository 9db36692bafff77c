pub mod bootstrap;
pub mod extract;
pub mod password;
pub mod policy;
mod types;

pub use extract::{AccessGuard, Session};
pub use policy::{Access, AdminOnly, Authenticated, MedicalStaff, RequiredAccess, authorize};
pub use types::{Identity, Role};
