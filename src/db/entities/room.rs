use sea_orm::entity::prelude::*;

use crate::impl_base_entity;

/// `status` is stored, but reconciled against open assignments whenever a
/// patient is assigned to or discharged from the room.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "rooms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    pub room_number: String,
    pub room_type: String,
    pub capacity: i32,
    pub status: String,
    #[sea_orm(has_many)]
    pub assignments: HasMany<super::room_assignment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl_base_entity!();
