use sea_orm::entity::prelude::*;

use crate::impl_base_entity;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "patients")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    /// Display code, `P-` followed by six uppercase alphanumerics.
    #[sea_orm(unique)]
    pub patient_id: String,
    pub first_name: String,
    pub last_name: String,
    pub dob: Date,
    pub gender: String,
    pub blood_type: String,
    pub severity: String,
    #[sea_orm(default_value = false)]
    pub is_isolated: bool,
    #[sea_orm(default_value = false)]
    pub is_contagious: bool,
    pub notes: Option<String>,
    #[sea_orm(indexed)]
    pub created_by: Option<Uuid>,
    #[sea_orm(belongs_to, from = "created_by", to = "id", on_delete = "SetNull")]
    pub creator: HasOne<super::user::Entity>,
    #[sea_orm(has_many)]
    pub assignments: HasMany<super::room_assignment::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl_base_entity!();
