//! Group mutations callable by remote clients
//!
//! Every operation takes the caller's identity explicitly. Mutations on
//! membership and listings are silent no-ops for anonymous callers; known
//! callers without membership get an error.

use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use super::query::GroupLib;
use crate::error::{AppError, AppResult, OptionExt};
use crate::model::{new_id, Group, GroupChanges, ListingKind, SetOp, CREATE_GROUP_ID};
use crate::sanitize::clean_changes;
use crate::store::{GroupStore, ListingStore, MemberSelector, UserDirectory};

/// Result of `save_group`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum SaveOutcome {
    Created { id: String },
    Updated { affected: u64 },
}

/// Where a listing toggle landed after trying every collaborator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListingOutcome {
    /// No collaborator holds the thing
    NotFound,
    /// More than one document matched; carries the total
    Ambiguous(u64),
    Updated(ListingKind),
}

impl ListingOutcome {
    pub fn from_counts(counts: &[(ListingKind, u64)]) -> Self {
        let total: u64 = counts.iter().map(|(_, n)| n).sum();
        match total {
            0 => ListingOutcome::NotFound,
            1 => counts
                .iter()
                .find(|(_, n)| *n == 1)
                .map(|(kind, _)| ListingOutcome::Updated(*kind))
                .unwrap_or(ListingOutcome::Ambiguous(total)),
            n => ListingOutcome::Ambiguous(n),
        }
    }

    pub fn affected(&self) -> u64 {
        match self {
            ListingOutcome::NotFound => 0,
            ListingOutcome::Ambiguous(n) => *n,
            ListingOutcome::Updated(_) => 1,
        }
    }

    pub fn into_result(self) -> AppResult<ListingKind> {
        match self {
            ListingOutcome::Updated(kind) => Ok(kind),
            other => Err(AppError::AffectedCount {
                expected: 1,
                actual: other.affected(),
            }),
        }
    }
}

/// Fail unless exactly one document was touched
fn check_update_one(affected: u64) -> AppResult<()> {
    if affected == 1 {
        Ok(())
    } else {
        Err(AppError::AffectedCount {
            expected: 1,
            actual: affected,
        })
    }
}

#[derive(Clone)]
pub struct GroupService {
    groups: Arc<dyn GroupStore>,
    users: Arc<dyn UserDirectory>,
    listings: Arc<dyn ListingStore>,
    lib: GroupLib,
}

impl GroupService {
    pub fn new(
        groups: Arc<dyn GroupStore>,
        users: Arc<dyn UserDirectory>,
        listings: Arc<dyn ListingStore>,
    ) -> Self {
        let lib = GroupLib::new(groups.clone());
        Self {
            groups,
            users,
            listings,
            lib,
        }
    }

    pub fn lib(&self) -> &GroupLib {
        &self.lib
    }

    pub async fn get_group(&self, group_id: &str) -> AppResult<Group> {
        self.groups.get_group(group_id).await?.ok_or_not_found("Group")
    }

    /// Create (`group_id == "create"`) or edit a group.
    ///
    /// The creator becomes the only member. Editing requires membership.
    pub async fn save_group(
        &self,
        caller: Option<&str>,
        group_id: &str,
        changes: &GroupChanges,
    ) -> AppResult<SaveOutcome> {
        let mut fields = clean_changes(changes);
        let now = Utc::now();

        if group_id == CREATE_GROUP_ID {
            let creator = caller.ok_or(AppError::Unauthenticated)?;
            let mut group = Group {
                id: new_id(),
                name: None,
                short_name: None,
                claim: None,
                description: None,
                created_by: Some(creator.to_string()),
                time_created: now,
                time_last_edited: now,
                members: vec![creator.to_string()],
            };
            fields.apply_to(&mut group);

            let id = self.groups.insert_group(group).await?;
            tracing::info!(group_id = %id, creator, "group created");
            return Ok(SaveOutcome::Created { id });
        }

        let group = self.get_group(group_id).await?;

        let allowed = match caller {
            Some(me) => self.lib.is_member(me, &group.id).await?,
            None => false,
        };
        if !allowed {
            tracing::warn!(group_id, caller = ?caller, "group edit denied");
            return Err(AppError::Unauthorized);
        }

        fields.time_last_edited = Some(now);
        let affected = self.groups.update_fields(&group.id, &fields).await?;
        tracing::info!(group_id, affected, "group updated");
        Ok(SaveOutcome::Updated { affected })
    }

    /// Add `user_id` to (`join`) or remove it from the group's members.
    ///
    /// Only current members may draft others in or expel them; a caller who
    /// is not a member matches no document and gets an affected-count error.
    pub async fn update_group_membership(
        &self,
        caller: Option<&str>,
        user_id: &str,
        group_id: &str,
        join: bool,
    ) -> AppResult<()> {
        let Some(sender) = caller else {
            tracing::debug!(group_id, "anonymous membership update ignored");
            return Ok(());
        };

        let user = self.users.get_user(user_id).await?.ok_or_not_found("User")?;

        let selector = MemberSelector {
            group_id: group_id.to_string(),
            required_member: sender.to_string(),
        };
        let affected = self
            .groups
            .update_members(&selector, SetOp::from_join(join), &user.id)
            .await?;
        check_update_one(affected)?;

        tracing::info!(group_id, sender, user_id = %user.id, join, "group membership updated");
        Ok(())
    }

    /// List (`join`) or unlist a course or event under a group.
    ///
    /// The thing id may belong to either collaborator, so both are tried; the
    /// combined match count must be exactly one.
    pub async fn update_group_listing(
        &self,
        caller: Option<&str>,
        thing_id: &str,
        group_id: &str,
        join: bool,
    ) -> AppResult<()> {
        let Some(sender) = caller else {
            tracing::debug!(group_id, "anonymous listing update ignored");
            return Ok(());
        };

        if !self.lib.is_member(sender, group_id).await? {
            tracing::warn!(group_id, sender, "group listing denied");
            return Err(AppError::Unauthorized);
        }

        let op = SetOp::from_join(join);
        let mut counts = Vec::with_capacity(ListingKind::ALL.len());
        for kind in ListingKind::ALL {
            let n = self.listings.update_listing(kind, thing_id, op, group_id).await?;
            counts.push((kind, n));
        }

        let kind = ListingOutcome::from_counts(&counts).into_result()?;
        tracing::info!(group_id, thing_id, kind = kind.as_str(), join, "group listing updated");
        Ok(())
    }
}
