use sea_orm::entity::prelude::*;

use crate::impl_base_entity;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub created_at: DateTimeWithTimeZone,
    #[sea_orm(default_expr = "Expr::current_timestamp()")]
    pub updated_at: DateTimeWithTimeZone,
    #[sea_orm(unique)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub full_name: String,
    pub email: String,
    #[sea_orm(has_one)]
    pub staff_detail: HasOne<super::staff::Entity>,
    #[sea_orm(has_many)]
    pub tokens: HasMany<super::user_token::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}

impl_base_entity!();
