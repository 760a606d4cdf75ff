//! Read-only group helpers: filtered listing and membership checks

use std::sync::Arc;

use crate::error::AppResult;
use crate::model::Group;
use crate::store::{GroupQuery, GroupStore};

/// Filter options understood by [`GroupLib::find`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupFilter {
    /// Only groups the caller belongs to
    pub own: bool,
    /// Only groups the given user belongs to. `Some(None)` or `Some(Some(""))`
    /// means the key was given without a usable value.
    pub user: Option<Option<String>>,
}

/// A query that has not touched the store yet
pub struct GroupCursor {
    store: Option<Arc<dyn GroupStore>>,
    query: GroupQuery,
}

impl GroupCursor {
    /// Cursor that yields nothing
    pub fn empty() -> Self {
        Self {
            store: None,
            query: GroupQuery::default(),
        }
    }

    pub async fn fetch(&self) -> AppResult<Vec<Group>> {
        match &self.store {
            Some(store) => store.find_groups(&self.query).await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn count(&self) -> AppResult<u64> {
        match &self.store {
            Some(store) => store.count_groups(&self.query).await,
            None => Ok(0),
        }
    }
}

#[derive(Clone)]
pub struct GroupLib {
    store: Arc<dyn GroupStore>,
}

impl GroupLib {
    pub fn new(store: Arc<dyn GroupStore>) -> Self {
        Self { store }
    }

    /// Build a cursor over the groups matching `filter`.
    ///
    /// A logged-out caller asking for its own groups gets an empty cursor, and
    /// so does a `user` filter without a value. When both options are given
    /// the `user` filter wins.
    pub fn find(&self, caller: Option<&str>, filter: &GroupFilter, limit: Option<u64>) -> GroupCursor {
        let mut query = GroupQuery {
            limit,
            ..Default::default()
        };

        if filter.own {
            let Some(me) = caller else {
                return GroupCursor::empty();
            };
            query.member = Some(me.to_string());
        }

        if let Some(user) = &filter.user {
            match user.as_deref() {
                Some(u) if !u.is_empty() => query.member = Some(u.to_string()),
                _ => return GroupCursor::empty(),
            }
        }

        GroupCursor {
            store: Some(self.store.clone()),
            query,
        }
    }

    /// True iff the group exists and lists `user_id` as a member
    pub async fn is_member(&self, user_id: &str, group_id: &str) -> AppResult<bool> {
        let query = GroupQuery {
            id: Some(group_id.to_string()),
            member: Some(user_id.to_string()),
            limit: None,
        };
        Ok(self.store.count_groups(&query).await? > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    async fn seeded() -> GroupLib {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();
        for (id, members) in [("g1", vec!["alice"]), ("g2", vec!["alice", "bob"]), ("g3", vec!["carol"])] {
            store
                .insert_group(Group {
                    id: id.to_string(),
                    name: Some(id.to_uppercase()),
                    short_name: None,
                    claim: None,
                    description: None,
                    created_by: Some(members[0].to_string()),
                    time_created: now,
                    time_last_edited: now,
                    members: members.into_iter().map(String::from).collect(),
                })
                .await
                .unwrap();
        }
        GroupLib::new(store)
    }

    fn ids(groups: Vec<Group>) -> Vec<String> {
        groups.into_iter().map(|g| g.id).collect()
    }

    #[tokio::test]
    async fn test_own_without_caller_is_empty() {
        let lib = seeded().await;
        let filter = GroupFilter {
            own: true,
            ..Default::default()
        };
        let cursor = lib.find(None, &filter, None);
        assert!(cursor.fetch().await.unwrap().is_empty());
        assert_eq!(cursor.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_own_with_caller() {
        let lib = seeded().await;
        let filter = GroupFilter {
            own: true,
            ..Default::default()
        };
        let found = lib.find(Some("alice"), &filter, None).fetch().await.unwrap();
        assert_eq!(ids(found), vec!["g1", "g2"]);
    }

    #[tokio::test]
    async fn test_falsy_user_is_empty() {
        let lib = seeded().await;
        for user in [None, Some(String::new())] {
            let filter = GroupFilter {
                own: false,
                user: Some(user),
            };
            let cursor = lib.find(Some("alice"), &filter, None);
            assert!(cursor.fetch().await.unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn test_user_filter_wins_over_own() {
        let lib = seeded().await;
        let filter = GroupFilter {
            own: true,
            user: Some(Some("carol".to_string())),
        };
        let found = lib.find(Some("alice"), &filter, None).fetch().await.unwrap();
        assert_eq!(ids(found), vec!["g3"]);
    }

    #[tokio::test]
    async fn test_no_filter_lists_all_with_limit() {
        let lib = seeded().await;
        let cursor = lib.find(None, &GroupFilter::default(), Some(2));
        assert_eq!(ids(cursor.fetch().await.unwrap()), vec!["g1", "g2"]);
    }

    #[tokio::test]
    async fn test_is_member() {
        let lib = seeded().await;
        assert!(lib.is_member("bob", "g2").await.unwrap());
        assert!(!lib.is_member("bob", "g1").await.unwrap());
        assert!(!lib.is_member("bob", "missing").await.unwrap());
    }
}
