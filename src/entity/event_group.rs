//! EventGroup entity - 活动所属群组 (groups 反向引用集合)
//!
//! 表名: grp_event_group, (event_id, group_id) 唯一

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "grp_event_group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 活动ID
    pub event_id: String,

    /// 群组ID
    pub group_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
