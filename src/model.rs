//! Domain model - 群组、用户及列表引用
//!
//! Records handed between the store backends, the group library and the handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type GroupId = String;
pub type UserId = String;

/// Group id value that asks `save_group` to create a new group.
pub const CREATE_GROUP_ID: &str = "create";

/// Generate a fresh document id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: GroupId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<UserId>,
    pub time_created: DateTime<Utc>,
    pub time_last_edited: DateTime<Utc>,
    /// Member set, kept in insertion order without duplicates
    pub members: Vec<UserId>,
}

impl Group {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }
}

/// Partial update supplied by a caller of `save_group`
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GroupChanges {
    pub short_name: Option<String>,
    pub name: Option<String>,
    pub claim: Option<String>,
    pub description: Option<String>,
}

/// Field set written by the store; `None` leaves a column untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupFields {
    pub short_name: Option<String>,
    pub name: Option<String>,
    pub claim: Option<String>,
    pub description: Option<String>,
    pub time_last_edited: Option<DateTime<Utc>>,
}

impl GroupFields {
    /// Apply the set fields onto a group record
    pub fn apply_to(&self, group: &mut Group) {
        if let Some(v) = &self.short_name {
            group.short_name = Some(v.clone());
        }
        if let Some(v) = &self.name {
            group.name = Some(v.clone());
        }
        if let Some(v) = &self.claim {
            group.claim = Some(v.clone());
        }
        if let Some(v) = &self.description {
            group.description = Some(v.clone());
        }
        if let Some(t) = self.time_last_edited {
            group.time_last_edited = t;
        }
    }
}

/// User record owned by the account collaborator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// Collaborator collection holding a listable thing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Course,
    Event,
}

impl ListingKind {
    pub const ALL: [ListingKind; 2] = [ListingKind::Course, ListingKind::Event];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Course => "course",
            ListingKind::Event => "event",
        }
    }
}

/// Set-field operation: add-to-set or pull
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetOp {
    Add,
    Remove,
}

impl SetOp {
    pub fn from_join(join: bool) -> Self {
        if join {
            SetOp::Add
        } else {
            SetOp::Remove
        }
    }

    /// Apply to an in-memory set, keeping it free of duplicates
    pub fn apply(&self, set: &mut Vec<String>, value: &str) {
        match self {
            SetOp::Add => {
                if !set.iter().any(|v| v == value) {
                    set.push(value.to_string());
                }
            }
            SetOp::Remove => set.retain(|v| v != value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_op_add_is_idempotent() {
        let mut set = vec!["a".to_string()];
        SetOp::Add.apply(&mut set, "b");
        SetOp::Add.apply(&mut set, "b");
        assert_eq!(set, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_set_op_remove() {
        let mut set = vec!["a".to_string(), "b".to_string()];
        SetOp::Remove.apply(&mut set, "a");
        SetOp::Remove.apply(&mut set, "missing");
        assert_eq!(set, vec!["b".to_string()]);
    }

    #[test]
    fn test_changes_reject_unknown_fields() {
        let ok: GroupChanges = serde_json::from_str(r#"{"shortName":"x","name":"N"}"#).unwrap();
        assert_eq!(ok.short_name.as_deref(), Some("x"));
        assert!(serde_json::from_str::<GroupChanges>(r#"{"members":["u"]}"#).is_err());
    }

    #[test]
    fn test_new_id_is_simple_uuid() {
        let id = new_id();
        assert_eq!(id.len(), 32);
        assert!(!id.contains('-'));
    }
}
