//! Storage seam
//!
//! The group library only talks to these traits. `memory` keeps everything in
//! process; `postgres` persists through sea-orm.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::model::{Group, GroupFields, ListingKind, SetOp, User};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Selector for group queries. Unset criteria match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupQuery {
    pub id: Option<String>,
    pub member: Option<String>,
    pub limit: Option<u64>,
}

impl GroupQuery {
    pub fn matches(&self, group: &Group) -> bool {
        self.id.as_deref().map_or(true, |id| group.id == id)
            && self.member.as_deref().map_or(true, |m| group.has_member(m))
    }
}

/// Targets one group, but only while `required_member` belongs to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemberSelector {
    pub group_id: String,
    pub required_member: String,
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Insert a new group record, returns its id
    async fn insert_group(&self, group: Group) -> AppResult<String>;

    async fn get_group(&self, id: &str) -> AppResult<Option<Group>>;

    /// Groups matching the query, oldest first
    async fn find_groups(&self, query: &GroupQuery) -> AppResult<Vec<Group>>;

    async fn count_groups(&self, query: &GroupQuery) -> AppResult<u64>;

    /// Partial field update; returns the number of matched groups
    async fn update_fields(&self, id: &str, fields: &GroupFields) -> AppResult<u64>;

    /// Add to or pull from the member set of the selected group.
    ///
    /// Returns the number of matched groups (0 or 1). Matching and mutating
    /// happen atomically.
    async fn update_members(
        &self,
        selector: &MemberSelector,
        op: SetOp,
        user_id: &str,
    ) -> AppResult<u64>;
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;
}

/// Course and event collections, reduced to their `groups` back-reference set
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Add or pull `group_id` on the thing's `groups` set.
    ///
    /// Returns how many documents of `kind` matched `thing_id`.
    async fn update_listing(
        &self,
        kind: ListingKind,
        thing_id: &str,
        op: SetOp,
        group_id: &str,
    ) -> AppResult<u64>;
}
