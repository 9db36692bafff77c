#[allow(unused_imports)]
pub mod prelude {
    pub use super::patient::Entity as Patient;
    pub use super::room::Entity as Room;
    pub use super::room_assignment::Entity as RoomAssignment;
    pub use super::staff::Entity as Staff;
    pub use super::user::Entity as User;
    pub use super::user_token::Entity as UserToken;
}

pub mod patient;
pub mod room;
pub mod room_assignment;
pub mod staff;
pub mod user;
pub mod user_token;
