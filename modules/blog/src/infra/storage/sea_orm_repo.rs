//! SeaORM-backed implementation of the persistence ports.
//!
//! `SeaOrmStore` is generic over `C: ConnectionTrait`, so the same queries run
//! on a `DatabaseConnection` (autocommit) and on an `ImmediateTransaction`
//! (unit of work). Soft-deleted posts and comments are filtered out of every
//! read; aggregate counts are computed at read time.

use std::collections::{BTreeSet, HashMap};

use anyhow::{bail, Context};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Set,
};
use uuid::Uuid;

use crate::contract::model::{Comment, PageRequest, Post, Profile, Project, User, UserAccount};
use crate::domain::repo::{BlogRepository, BlogStore, BlogUnitOfWork, PostScope};
use crate::infra::storage::entity::{comment, member, post, profile, project, user};
use crate::infra::storage::mapper;
use crate::infra::storage::txn::ImmediateTransaction;

/// Repository over the shared connection pool.
pub type SeaOrmBlogRepository = SeaOrmStore<DatabaseConnection>;

/// Holds a connection object; its lifetime/ownership is up to the caller.
pub struct SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }

    async fn members_by_project(
        &self,
        project_ids: &[Uuid],
    ) -> anyhow::Result<HashMap<Uuid, BTreeSet<String>>> {
        let rows = member::Entity::find()
            .filter(member::Column::ProjectId.is_in(project_ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("members_by_project failed")?;
        let mut out: HashMap<Uuid, BTreeSet<String>> = HashMap::new();
        for row in rows {
            out.entry(row.project_id).or_default().insert(row.user_id);
        }
        Ok(out)
    }

    async fn live_post_counts(&self, project_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, u64>> {
        let rows: Vec<(Uuid, i64)> = post::Entity::find()
            .select_only()
            .column(post::Column::ProjectId)
            .column_as(Expr::col(post::Column::Id).count(), "n")
            .filter(post::Column::ProjectId.is_in(project_ids.iter().copied()))
            .filter(post::Column::IsDeleted.eq(false))
            .group_by(post::Column::ProjectId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("live_post_counts failed")?;
        Ok(rows
            .into_iter()
            .map(|(id, n)| (id, u64::try_from(n).unwrap_or_default()))
            .collect())
    }

    async fn live_comment_counts(&self, post_ids: &[Uuid]) -> anyhow::Result<HashMap<Uuid, u64>> {
        let rows: Vec<(Uuid, i64)> = comment::Entity::find()
            .select_only()
            .column(comment::Column::PostId)
            .column_as(Expr::col(comment::Column::Id).count(), "n")
            .filter(comment::Column::PostId.is_in(post_ids.iter().copied()))
            .filter(comment::Column::IsDeleted.eq(false))
            .group_by(comment::Column::PostId)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("live_comment_counts failed")?;
        Ok(rows
            .into_iter()
            .map(|(id, n)| (id, u64::try_from(n).unwrap_or_default()))
            .collect())
    }

    async fn hydrate_projects(&self, rows: Vec<project::Model>) -> anyhow::Result<Vec<Project>> {
        let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
        let mut members = self.members_by_project(&ids).await?;
        let counts = self.live_post_counts(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                mapper::project_to_contract(
                    row,
                    members.remove(&id).unwrap_or_default(),
                    counts.get(&id).copied().unwrap_or(0),
                )
            })
            .collect())
    }

    async fn hydrate_posts(&self, rows: Vec<post::Model>) -> anyhow::Result<Vec<Post>> {
        let ids: Vec<Uuid> = rows.iter().map(|p| p.id).collect();
        let counts = self.live_comment_counts(&ids).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let n = counts.get(&row.id).copied().unwrap_or(0);
                mapper::post_to_contract(row, n)
            })
            .collect())
    }

    async fn hydrate_users(&self, accounts: Vec<user::Model>) -> anyhow::Result<Vec<User>> {
        let ids: Vec<String> = accounts.iter().map(|a| a.id.clone()).collect();
        let mut profiles: HashMap<String, profile::Model> = profile::Entity::find()
            .filter(profile::Column::Id.is_in(ids.iter().cloned()))
            .all(&self.conn)
            .await
            .context("hydrate_users profiles failed")?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let mut projects: HashMap<String, Vec<Uuid>> = HashMap::new();
        for row in member::Entity::find()
            .filter(member::Column::UserId.is_in(ids.iter().cloned()))
            .order_by_asc(member::Column::ProjectId)
            .all(&self.conn)
            .await
            .context("hydrate_users memberships failed")?
        {
            projects.entry(row.user_id).or_default().push(row.project_id);
        }
        Ok(accounts
            .into_iter()
            .map(|account| {
                let profile = profiles.remove(&account.id);
                let project_ids = projects.remove(&account.id).unwrap_or_default();
                mapper::user_view(account, profile, project_ids)
            })
            .collect())
    }
}

fn live_posts() -> sea_orm::Select<post::Entity> {
    post::Entity::find().filter(post::Column::IsDeleted.eq(false))
}

fn live_comments() -> sea_orm::Select<comment::Entity> {
    comment::Entity::find().filter(comment::Column::IsDeleted.eq(false))
}

#[async_trait::async_trait]
impl<C> BlogStore for SeaOrmStore<C>
where
    C: ConnectionTrait + Send + Sync + 'static,
{
    async fn find_account(&self, id: &str) -> anyhow::Result<Option<UserAccount>> {
        let found = user::Entity::find_by_id(id.to_owned())
            .one(&self.conn)
            .await
            .context("find_account failed")?;
        Ok(found.map(mapper::account_to_contract))
    }

    async fn upsert_account(&self, account: UserAccount) -> anyhow::Result<()> {
        let m = user::ActiveModel {
            id: Set(account.id),
            name: Set(account.name),
            auth: Set(account.auth),
        };
        user::Entity::insert(m)
            .on_conflict(
                OnConflict::column(user::Column::Id)
                    .update_columns([user::Column::Name, user::Column::Auth])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("upsert_account failed")?;
        Ok(())
    }

    async fn find_user(&self, id: &str) -> anyhow::Result<Option<User>> {
        let Some(account) = user::Entity::find_by_id(id.to_owned())
            .one(&self.conn)
            .await
            .context("find_user failed")?
        else {
            return Ok(None);
        };
        Ok(self.hydrate_users(vec![account]).await?.pop())
    }

    async fn list_users_by_auth(&self, auth: &str) -> anyhow::Result<Vec<User>> {
        let accounts = user::Entity::find()
            .filter(user::Column::Auth.eq(auth))
            .order_by_desc(user::Column::Id)
            .all(&self.conn)
            .await
            .context("list_users_by_auth failed")?;
        self.hydrate_users(accounts).await
    }

    async fn find_profile(&self, id: &str) -> anyhow::Result<Option<Profile>> {
        let found = profile::Entity::find_by_id(id.to_owned())
            .one(&self.conn)
            .await
            .context("find_profile failed")?;
        Ok(found.map(mapper::profile_to_contract))
    }

    async fn ensure_profile(&self, id: &str) -> anyhow::Result<bool> {
        let m = profile::ActiveModel {
            id: Set(id.to_owned()),
            description: Set(None),
            twitter_id: Set(None),
            github_id: Set(None),
            icon_src: Set(None),
        };
        let inserted = profile::Entity::insert(m)
            .on_conflict(OnConflict::column(profile::Column::Id).do_nothing().to_owned())
            .exec_without_returning(&self.conn)
            .await
            .context("ensure_profile failed")?;
        Ok(inserted > 0)
    }

    async fn save_profile(&self, p: Profile) -> anyhow::Result<()> {
        profile::Entity::insert(mapper::profile_to_active(p))
            .on_conflict(
                OnConflict::column(profile::Column::Id)
                    .update_columns([
                        profile::Column::Description,
                        profile::Column::TwitterId,
                        profile::Column::GithubId,
                        profile::Column::IconSrc,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("save_profile failed")?;
        Ok(())
    }

    async fn find_project(&self, id: Uuid) -> anyhow::Result<Option<Project>> {
        let Some(row) = project::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("find_project failed")?
        else {
            return Ok(None);
        };
        Ok(self.hydrate_projects(vec![row]).await?.pop())
    }

    async fn find_project_by_name(&self, name: &str) -> anyhow::Result<Option<Project>> {
        let Some(row) = project::Entity::find()
            .filter(project::Column::Name.eq(name))
            .one(&self.conn)
            .await
            .context("find_project_by_name failed")?
        else {
            return Ok(None);
        };
        Ok(self.hydrate_projects(vec![row]).await?.pop())
    }

    async fn list_projects(&self) -> anyhow::Result<Vec<Project>> {
        let rows = project::Entity::find()
            .order_by_asc(project::Column::Name)
            .all(&self.conn)
            .await
            .context("list_projects failed")?;
        self.hydrate_projects(rows).await
    }

    async fn insert_project(&self, p: Project) -> anyhow::Result<()> {
        let _ = mapper::project_to_active(p)
            .insert(&self.conn)
            .await
            .context("insert_project failed")?;
        Ok(())
    }

    async fn update_project(&self, p: Project) -> anyhow::Result<()> {
        let _ = mapper::project_to_active(p)
            .update(&self.conn)
            .await
            .context("update_project failed")?;
        Ok(())
    }

    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = project::Entity::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("delete_project failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn list_members(&self, project_id: Uuid) -> anyhow::Result<BTreeSet<String>> {
        let rows = member::Entity::find()
            .filter(member::Column::ProjectId.eq(project_id))
            .all(&self.conn)
            .await
            .context("list_members failed")?;
        Ok(rows.into_iter().map(|m| m.user_id).collect())
    }

    async fn add_member(&self, project_id: Uuid, user_id: &str) -> anyhow::Result<()> {
        let m = member::ActiveModel {
            user_id: Set(user_id.to_owned()),
            project_id: Set(project_id),
        };
        member::Entity::insert(m)
            .on_conflict(
                OnConflict::columns([member::Column::UserId, member::Column::ProjectId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("add_member failed")?;
        Ok(())
    }

    async fn remove_member(&self, project_id: Uuid, user_id: &str) -> anyhow::Result<bool> {
        let res = member::Entity::delete_many()
            .filter(member::Column::ProjectId.eq(project_id))
            .filter(member::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("remove_member failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn remove_all_members(&self, project_id: Uuid) -> anyhow::Result<u64> {
        let res = member::Entity::delete_many()
            .filter(member::Column::ProjectId.eq(project_id))
            .exec(&self.conn)
            .await
            .context("remove_all_members failed")?;
        Ok(res.rows_affected)
    }

    async fn find_post(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let Some(row) = live_posts()
            .filter(post::Column::Id.eq(id))
            .one(&self.conn)
            .await
            .context("find_post failed")?
        else {
            return Ok(None);
        };
        Ok(self.hydrate_posts(vec![row]).await?.pop())
    }

    async fn find_post_by_number(
        &self,
        project_id: Uuid,
        number: i64,
    ) -> anyhow::Result<Option<Post>> {
        let Some(row) = live_posts()
            .filter(post::Column::ProjectId.eq(project_id))
            .filter(post::Column::Number.eq(number))
            .one(&self.conn)
            .await
            .context("find_post_by_number failed")?
        else {
            return Ok(None);
        };
        Ok(self.hydrate_posts(vec![row]).await?.pop())
    }

    async fn list_posts(&self, scope: PostScope, page: PageRequest) -> anyhow::Result<Vec<Post>> {
        let query = match scope {
            PostScope::All => live_posts(),
            PostScope::Project(project_id) => {
                live_posts().filter(post::Column::ProjectId.eq(project_id))
            }
            PostScope::Author(author_id) => {
                live_posts().filter(post::Column::AuthorId.eq(author_id))
            }
        };
        let rows = query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.conn)
            .await
            .context("list_posts failed")?;
        self.hydrate_posts(rows).await
    }

    async fn insert_post(&self, p: Post) -> anyhow::Result<()> {
        let m = post::ActiveModel {
            id: Set(p.id),
            title: Set(p.title),
            content: Set(p.content),
            thumb_src: Set(p.thumb_src),
            author_id: Set(p.author_id),
            project_id: Set(p.project_id),
            number: Set(p.number),
            created_at: Set(p.created_at),
            updated_at: Set(p.updated_at),
            views: Set(p.views),
            is_deleted: Set(false),
        };
        let _ = m.insert(&self.conn).await.context("insert_post failed")?;
        Ok(())
    }

    async fn update_post(&self, p: Post) -> anyhow::Result<()> {
        let m = post::ActiveModel {
            id: Set(p.id),
            title: Set(p.title),
            content: Set(p.content),
            thumb_src: Set(p.thumb_src),
            updated_at: Set(p.updated_at),
            ..Default::default()
        };
        let _ = m.update(&self.conn).await.context("update_post failed")?;
        Ok(())
    }

    async fn soft_delete_post(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = post::Entity::update_many()
            .col_expr(post::Column::IsDeleted, Expr::value(true))
            .filter(post::Column::Id.eq(id))
            .filter(post::Column::IsDeleted.eq(false))
            .exec(&self.conn)
            .await
            .context("soft_delete_post failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn soft_delete_project_posts(&self, project_id: Uuid) -> anyhow::Result<u64> {
        let res = post::Entity::update_many()
            .col_expr(post::Column::IsDeleted, Expr::value(true))
            .filter(post::Column::ProjectId.eq(project_id))
            .filter(post::Column::IsDeleted.eq(false))
            .exec(&self.conn)
            .await
            .context("soft_delete_project_posts failed")?;
        Ok(res.rows_affected)
    }

    async fn count_all_project_posts(&self, project_id: Uuid) -> anyhow::Result<u64> {
        post::Entity::find()
            .filter(post::Column::ProjectId.eq(project_id))
            .count(&self.conn)
            .await
            .context("count_all_project_posts failed")
    }

    async fn count_live_project_posts(&self, project_id: Uuid) -> anyhow::Result<u64> {
        live_posts()
            .filter(post::Column::ProjectId.eq(project_id))
            .count(&self.conn)
            .await
            .context("count_live_project_posts failed")
    }

    async fn find_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let found = live_comments()
            .filter(comment::Column::Id.eq(id))
            .one(&self.conn)
            .await
            .context("find_comment failed")?;
        Ok(found.map(mapper::comment_to_contract))
    }

    async fn list_post_comments(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<Vec<Comment>> {
        let rows = live_comments()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .limit(page.limit)
            .offset(page.offset)
            .all(&self.conn)
            .await
            .context("list_post_comments failed")?;
        Ok(rows.into_iter().map(mapper::comment_to_contract).collect())
    }

    async fn insert_comment(&self, c: Comment) -> anyhow::Result<()> {
        let m = comment::ActiveModel {
            id: Set(c.id),
            content: Set(c.content),
            author_id: Set(c.author_id),
            post_id: Set(c.post_id),
            created_at: Set(c.created_at),
            is_deleted: Set(false),
        };
        let _ = m.insert(&self.conn).await.context("insert_comment failed")?;
        Ok(())
    }

    async fn soft_delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = comment::Entity::update_many()
            .col_expr(comment::Column::IsDeleted, Expr::value(true))
            .filter(comment::Column::Id.eq(id))
            .filter(comment::Column::IsDeleted.eq(false))
            .exec(&self.conn)
            .await
            .context("soft_delete_comment failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn soft_delete_post_comments(&self, post_id: Uuid) -> anyhow::Result<u64> {
        let res = comment::Entity::update_many()
            .col_expr(comment::Column::IsDeleted, Expr::value(true))
            .filter(comment::Column::PostId.eq(post_id))
            .filter(comment::Column::IsDeleted.eq(false))
            .exec(&self.conn)
            .await
            .context("soft_delete_post_comments failed")?;
        Ok(res.rows_affected)
    }

    async fn soft_delete_project_comments(&self, project_id: Uuid) -> anyhow::Result<u64> {
        let project_posts = post::Entity::find()
            .select_only()
            .column(post::Column::Id)
            .filter(post::Column::ProjectId.eq(project_id))
            .into_query();
        let res = comment::Entity::update_many()
            .col_expr(comment::Column::IsDeleted, Expr::value(true))
            .filter(comment::Column::PostId.in_subquery(project_posts))
            .filter(comment::Column::IsDeleted.eq(false))
            .exec(&self.conn)
            .await
            .context("soft_delete_project_comments failed")?;
        Ok(res.rows_affected)
    }

    async fn count_live_post_comments(&self, post_id: Uuid) -> anyhow::Result<u64> {
        live_comments()
            .filter(comment::Column::PostId.eq(post_id))
            .count(&self.conn)
            .await
            .context("count_live_post_comments failed")
    }
}

#[async_trait::async_trait]
impl BlogRepository for SeaOrmStore<DatabaseConnection> {
    async fn begin(&self) -> anyhow::Result<Box<dyn BlogUnitOfWork>> {
        let DatabaseConnection::SqlxSqlitePoolConnection(_) = &self.conn else {
            bail!("unit of work requires a SQLite connection");
        };
        let pool = self.conn.get_sqlite_connection_pool();
        let txn = ImmediateTransaction::begin(pool)
            .await
            .context("begin failed")?;
        Ok(Box::new(SeaOrmStore::new(txn)))
    }
}

#[async_trait::async_trait]
impl BlogUnitOfWork for SeaOrmStore<ImmediateTransaction> {
    async fn commit(self: Box<Self>) -> anyhow::Result<()> {
        let store = *self;
        store.conn.commit().await.context("commit failed")
    }

    async fn rollback(self: Box<Self>) -> anyhow::Result<()> {
        let store = *self;
        store.conn.rollback().await.context("rollback failed")
    }
}
