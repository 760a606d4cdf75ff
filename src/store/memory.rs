//! In-process store backed by `DashMap`.
//!
//! Each document sits behind its own shard lock, so a single update is
//! atomic. Suitable for development, tests and single-node setups.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use super::{GroupQuery, GroupStore, ListingStore, MemberSelector, UserDirectory};
use crate::error::AppResult;
use crate::model::{Group, GroupFields, ListingKind, SetOp, User};

#[derive(Default)]
pub struct MemoryStore {
    /// group id -> (insertion sequence, record)
    groups: DashMap<String, (u64, Group)>,
    seq: AtomicU64,
    users: DashMap<String, User>,
    /// course id -> `groups` set
    courses: DashMap<String, Vec<String>>,
    /// event id -> `groups` set
    events: DashMap<String, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn insert_course(&self, id: impl Into<String>) {
        self.courses.insert(id.into(), Vec::new());
    }

    pub fn insert_event(&self, id: impl Into<String>) {
        self.events.insert(id.into(), Vec::new());
    }

    /// Current `groups` set of a course or event
    pub fn listing_groups(&self, kind: ListingKind, id: &str) -> Option<Vec<String>> {
        self.collection(kind).get(id).map(|g| g.clone())
    }

    fn collection(&self, kind: ListingKind) -> &DashMap<String, Vec<String>> {
        match kind {
            ListingKind::Course => &self.courses,
            ListingKind::Event => &self.events,
        }
    }

    fn matching(&self, query: &GroupQuery) -> Vec<(u64, Group)> {
        // Id lookups go straight to the owning shard
        if let Some(id) = &query.id {
            return self
                .groups
                .get(id)
                .filter(|entry| query.matches(&entry.value().1))
                .map(|entry| vec![entry.value().clone()])
                .unwrap_or_default();
        }

        let mut found: Vec<(u64, Group)> = self
            .groups
            .iter()
            .filter(|entry| query.matches(&entry.value().1))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by_key(|(seq, _)| *seq);
        found
    }
}

#[async_trait]
impl GroupStore for MemoryStore {
    async fn insert_group(&self, group: Group) -> AppResult<String> {
        let id = group.id.clone();
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.groups.insert(id.clone(), (seq, group));
        Ok(id)
    }

    async fn get_group(&self, id: &str) -> AppResult<Option<Group>> {
        Ok(self.groups.get(id).map(|entry| entry.1.clone()))
    }

    async fn find_groups(&self, query: &GroupQuery) -> AppResult<Vec<Group>> {
        let limit = query.limit.map_or(usize::MAX, |l| l as usize);
        Ok(self
            .matching(query)
            .into_iter()
            .take(limit)
            .map(|(_, g)| g)
            .collect())
    }

    async fn count_groups(&self, query: &GroupQuery) -> AppResult<u64> {
        let count = self.matching(query).len() as u64;
        Ok(query.limit.map_or(count, |l| count.min(l)))
    }

    async fn update_fields(&self, id: &str, fields: &GroupFields) -> AppResult<u64> {
        match self.groups.get_mut(id) {
            Some(mut entry) => {
                fields.apply_to(&mut entry.1);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn update_members(
        &self,
        selector: &MemberSelector,
        op: SetOp,
        user_id: &str,
    ) -> AppResult<u64> {
        let Some(mut entry) = self.groups.get_mut(&selector.group_id) else {
            return Ok(0);
        };
        let group = &mut entry.1;
        if !group.has_member(&selector.required_member) {
            return Ok(0);
        }
        op.apply(&mut group.members, user_id);
        Ok(1)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.value().clone()))
    }
}

#[async_trait]
impl ListingStore for MemoryStore {
    async fn update_listing(
        &self,
        kind: ListingKind,
        thing_id: &str,
        op: SetOp,
        group_id: &str,
    ) -> AppResult<u64> {
        match self.collection(kind).get_mut(thing_id) {
            Some(mut groups) => {
                op.apply(&mut groups, group_id);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}
