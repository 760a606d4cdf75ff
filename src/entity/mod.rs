//! Entity module - SeaORM 实体定义
//!
//! 包含所有数据库表对应的实体模型

pub mod course;
pub mod course_group;
pub mod event;
pub mod event_group;
pub mod group;
pub mod group_member;
pub mod user;
