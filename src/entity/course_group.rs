//! CourseGroup entity - 课程所属群组 (groups 反向引用集合)
//!
//! 表名: grp_course_group, (course_id, group_id) 唯一

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "grp_course_group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 课程ID
    pub course_id: String,

    /// 群组ID
    pub group_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
