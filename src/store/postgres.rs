//! PostgreSQL store on sea-orm
//!
//! Set fields live in join tables. Each set mutation locks the owning row
//! (`SELECT ... FOR UPDATE`) inside a transaction, which gives the same
//! match-then-mutate atomicity a document store offers for one document.

use async_trait::async_trait;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use std::collections::HashMap;

use super::{GroupQuery, GroupStore, ListingStore, MemberSelector, UserDirectory};
use crate::config::DatabaseConfig;
use crate::db;
use crate::entity::{course, course_group, event, event_group, group, group_member, user};
use crate::error::AppResult;
use crate::model::{Group, GroupFields, ListingKind, SetOp, User};

#[derive(Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Connect, migrate and wrap the connection
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        Ok(Self::new(db::init_database(config).await?))
    }

    fn select_groups(query: &GroupQuery) -> Select<group::Entity> {
        let mut select = group::Entity::find();
        if let Some(id) = &query.id {
            select = select.filter(group::Column::Id.eq(id.as_str()));
        }
        if let Some(member) = &query.member {
            select = select.filter(
                group::Column::Id.in_subquery(
                    Query::select()
                        .column(group_member::Column::GroupId)
                        .from(group_member::Entity)
                        .and_where(group_member::Column::UserId.eq(member.as_str()))
                        .to_owned(),
                ),
            );
        }
        select
    }

    /// Member sets for the given groups, in join order
    async fn members_of(&self, ids: Vec<String>) -> AppResult<HashMap<String, Vec<String>>> {
        let mut members: HashMap<String, Vec<String>> = HashMap::new();
        if ids.is_empty() {
            return Ok(members);
        }
        let rows = group_member::Entity::find()
            .filter(group_member::Column::GroupId.is_in(ids))
            .order_by_asc(group_member::Column::Id)
            .all(&self.db)
            .await?;
        for row in rows {
            members.entry(row.group_id).or_default().push(row.user_id);
        }
        Ok(members)
    }

    async fn toggle_course(
        txn: &DatabaseTransaction,
        thing_id: &str,
        op: SetOp,
        group_id: &str,
    ) -> AppResult<()> {
        match op {
            SetOp::Add => {
                let existing = course_group::Entity::find()
                    .filter(course_group::Column::CourseId.eq(thing_id))
                    .filter(course_group::Column::GroupId.eq(group_id))
                    .one(txn)
                    .await?;
                if existing.is_none() {
                    course_group::ActiveModel {
                        course_id: Set(thing_id.to_string()),
                        group_id: Set(group_id.to_string()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }
            }
            SetOp::Remove => {
                course_group::Entity::delete_many()
                    .filter(course_group::Column::CourseId.eq(thing_id))
                    .filter(course_group::Column::GroupId.eq(group_id))
                    .exec(txn)
                    .await?;
            }
        }
        Ok(())
    }

    async fn toggle_event(
        txn: &DatabaseTransaction,
        thing_id: &str,
        op: SetOp,
        group_id: &str,
    ) -> AppResult<()> {
        match op {
            SetOp::Add => {
                let existing = event_group::Entity::find()
                    .filter(event_group::Column::EventId.eq(thing_id))
                    .filter(event_group::Column::GroupId.eq(group_id))
                    .one(txn)
                    .await?;
                if existing.is_none() {
                    event_group::ActiveModel {
                        event_id: Set(thing_id.to_string()),
                        group_id: Set(group_id.to_string()),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;
                }
            }
            SetOp::Remove => {
                event_group::Entity::delete_many()
                    .filter(event_group::Column::EventId.eq(thing_id))
                    .filter(event_group::Column::GroupId.eq(group_id))
                    .exec(txn)
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GroupStore for PgStore {
    async fn insert_group(&self, g: Group) -> AppResult<String> {
        let txn = self.db.begin().await?;

        let model = group::ActiveModel {
            id: Set(g.id.clone()),
            name: Set(g.name),
            short_name: Set(g.short_name),
            claim: Set(g.claim),
            description: Set(g.description),
            created_by: Set(g.created_by),
            time_created: Set(g.time_created),
            time_last_edited: Set(g.time_last_edited),
        };
        model.insert(&txn).await?;

        for user_id in g.members {
            group_member::ActiveModel {
                group_id: Set(g.id.clone()),
                user_id: Set(user_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(g.id)
    }

    async fn get_group(&self, id: &str) -> AppResult<Option<Group>> {
        let Some(model) = group::Entity::find_by_id(id.to_string()).one(&self.db).await? else {
            return Ok(None);
        };
        let mut members = self.members_of(vec![model.id.clone()]).await?;
        let set = members.remove(&model.id).unwrap_or_default();
        Ok(Some(model.into_group(set)))
    }

    async fn find_groups(&self, query: &GroupQuery) -> AppResult<Vec<Group>> {
        let mut select = Self::select_groups(query)
            .order_by_asc(group::Column::TimeCreated)
            .order_by_asc(group::Column::Id);
        if let Some(limit) = query.limit {
            select = select.limit(limit);
        }
        let models = select.all(&self.db).await?;

        let ids = models.iter().map(|m| m.id.clone()).collect();
        let mut members = self.members_of(ids).await?;
        Ok(models
            .into_iter()
            .map(|m| {
                let set = members.remove(&m.id).unwrap_or_default();
                m.into_group(set)
            })
            .collect())
    }

    async fn count_groups(&self, query: &GroupQuery) -> AppResult<u64> {
        let count = Self::select_groups(query).count(&self.db).await?;
        Ok(query.limit.map_or(count, |l| count.min(l)))
    }

    async fn update_fields(&self, id: &str, fields: &GroupFields) -> AppResult<u64> {
        let mut model = group::ActiveModel {
            ..Default::default()
        };
        if let Some(v) = &fields.short_name {
            model.short_name = Set(Some(v.clone()));
        }
        if let Some(v) = &fields.name {
            model.name = Set(Some(v.clone()));
        }
        if let Some(v) = &fields.claim {
            model.claim = Set(Some(v.clone()));
        }
        if let Some(v) = &fields.description {
            model.description = Set(Some(v.clone()));
        }
        if let Some(t) = fields.time_last_edited {
            model.time_last_edited = Set(t);
        }

        // Nothing to write still reports whether the group matched
        if !model.is_changed() {
            return self.count_groups(&GroupQuery {
                id: Some(id.to_string()),
                ..Default::default()
            })
            .await;
        }

        let result = group::Entity::update_many()
            .set(model)
            .filter(group::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn update_members(
        &self,
        selector: &MemberSelector,
        op: SetOp,
        user_id: &str,
    ) -> AppResult<u64> {
        let txn = self.db.begin().await?;

        let locked = group::Entity::find_by_id(selector.group_id.clone())
            .lock_exclusive()
            .one(&txn)
            .await?;
        if locked.is_none() {
            return Ok(0);
        }

        let required = group_member::Entity::find()
            .filter(group_member::Column::GroupId.eq(selector.group_id.as_str()))
            .filter(group_member::Column::UserId.eq(selector.required_member.as_str()))
            .one(&txn)
            .await?;
        if required.is_none() {
            return Ok(0);
        }

        match op {
            SetOp::Add => {
                let existing = group_member::Entity::find()
                    .filter(group_member::Column::GroupId.eq(selector.group_id.as_str()))
                    .filter(group_member::Column::UserId.eq(user_id))
                    .one(&txn)
                    .await?;
                if existing.is_none() {
                    group_member::ActiveModel {
                        group_id: Set(selector.group_id.clone()),
                        user_id: Set(user_id.to_string()),
                        ..Default::default()
                    }
                    .insert(&txn)
                    .await?;
                }
            }
            SetOp::Remove => {
                group_member::Entity::delete_many()
                    .filter(group_member::Column::GroupId.eq(selector.group_id.as_str()))
                    .filter(group_member::Column::UserId.eq(user_id))
                    .exec(&txn)
                    .await?;
            }
        }

        txn.commit().await?;
        Ok(1)
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let found = user::Entity::find_by_id(id.to_string()).one(&self.db).await?;
        Ok(found.map(User::from))
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let found = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        Ok(found.map(User::from))
    }
}

#[async_trait]
impl ListingStore for PgStore {
    async fn update_listing(
        &self,
        kind: ListingKind,
        thing_id: &str,
        op: SetOp,
        group_id: &str,
    ) -> AppResult<u64> {
        let txn = self.db.begin().await?;

        let matched = match kind {
            ListingKind::Course => course::Entity::find_by_id(thing_id.to_string())
                .lock_exclusive()
                .one(&txn)
                .await?
                .is_some(),
            ListingKind::Event => event::Entity::find_by_id(thing_id.to_string())
                .lock_exclusive()
                .one(&txn)
                .await?
                .is_some(),
        };
        if !matched {
            return Ok(0);
        }

        match kind {
            ListingKind::Course => Self::toggle_course(&txn, thing_id, op, group_id).await?,
            ListingKind::Event => Self::toggle_event(&txn, thing_id, op, group_id).await?,
        }

        txn.commit().await?;
        Ok(1)
    }
}
