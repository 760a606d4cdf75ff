//! User entity - 用户表
//!
//! 表名: grp_user

use sea_orm::entity::prelude::*;

use crate::model::User;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "grp_user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// 用户名 (唯一)
    #[sea_orm(column_type = "String(Some(64))", unique)]
    pub username: String,

    /// 全名
    #[sea_orm(column_type = "String(Some(128))")]
    pub full_name: String,

    /// 密码 (bcrypt 哈希)
    #[sea_orm(column_type = "String(Some(128))")]
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for User {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            full_name: model.full_name,
            password_hash: model.password,
        }
    }
}
