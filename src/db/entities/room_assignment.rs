use sea_orm::entity::prelude::*;

use crate::impl_base_entity;

/// Occupancy ledger. Rows are closed by setting `discharge_date`, never
/// deleted; foreign keys fall back to NULL so history outlives the patient
/// and the room.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "room_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(indexed)]
    pub patient_id: Option<Uuid>,
    #[sea_orm(indexed)]
    pub room_id: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assignment_date: DateTimeWithTimeZone,
    pub discharge_date: Option<DateTimeWithTimeZone>,
    #[sea_orm(belongs_to, from = "patient_id", to = "id", on_delete = "SetNull")]
    pub patient: HasOne<super::patient::Entity>,
    #[sea_orm(belongs_to, from = "room_id", to = "id", on_delete = "SetNull")]
    pub room: HasOne<super::room::Entity>,
    #[sea_orm(belongs_to, from = "assigned_by", to = "id", on_delete = "SetNull")]
    pub assigner: HasOne<super::user::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl_base_entity!();
