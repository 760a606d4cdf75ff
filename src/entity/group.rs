//! Group entity - 群组表
//!
//! 表名: grp_group

use sea_orm::entity::prelude::*;

use crate::model::Group;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "grp_group")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// 显示名称 (最大200字符)
    #[sea_orm(column_type = "String(Some(200))", nullable)]
    pub name: Option<String>,

    /// 简称 (最大50字符)
    #[sea_orm(column_type = "String(Some(50))", nullable)]
    pub short_name: Option<String>,

    /// 标语 (最大1000字符)
    #[sea_orm(column_type = "String(Some(1000))", nullable)]
    pub claim: Option<String>,

    /// 描述 (已清洗的 HTML)
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,

    /// 创建者用户ID
    #[sea_orm(nullable)]
    pub created_by: Option<String>,

    pub time_created: DateTimeUtc,

    pub time_last_edited: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// 成员关系通过 grp_group_member 表手动查询

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Attach the member set loaded from grp_group_member
    pub fn into_group(self, members: Vec<String>) -> Group {
        Group {
            id: self.id,
            name: self.name,
            short_name: self.short_name,
            claim: self.claim,
            description: self.description,
            created_by: self.created_by,
            time_created: self.time_created,
            time_last_edited: self.time_last_edited,
            members,
        }
    }
}
