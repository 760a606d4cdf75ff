//! GroupMember entity - 群组成员表
//!
//! 表名: grp_group_member, (group_id, user_id) 唯一

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "grp_group_member")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 群组ID
    pub group_id: String,

    /// 用户ID
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
