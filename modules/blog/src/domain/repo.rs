use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::model::{
    Comment, PageRequest, Post, Profile, Project, User, UserAccount,
};

/// Which posts a listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostScope {
    All,
    Project(Uuid),
    Author(String),
}

/// Persistence operations the domain needs.
///
/// Reads never return soft-deleted posts or comments. Models returned here
/// carry their live aggregates (`members`, `post_count`, `comment_count`);
/// writes ignore those derived fields.
#[async_trait]
pub trait BlogStore: Send + Sync {
    // --- accounts & profiles ---

    async fn find_account(&self, id: &str) -> anyhow::Result<Option<UserAccount>>;
    /// Register or refresh an identity record (owned by the identity system).
    async fn upsert_account(&self, account: UserAccount) -> anyhow::Result<()>;
    /// Account + profile + memberships, any class.
    async fn find_user(&self, id: &str) -> anyhow::Result<Option<User>>;
    /// All users of the given class tag, id descending.
    async fn list_users_by_auth(&self, auth: &str) -> anyhow::Result<Vec<User>>;
    async fn find_profile(&self, id: &str) -> anyhow::Result<Option<Profile>>;
    /// Insert an empty profile unless one exists. Returns true if inserted.
    async fn ensure_profile(&self, id: &str) -> anyhow::Result<bool>;
    /// Insert or overwrite the full profile row.
    async fn save_profile(&self, profile: Profile) -> anyhow::Result<()>;

    // --- projects ---

    async fn find_project(&self, id: Uuid) -> anyhow::Result<Option<Project>>;
    async fn find_project_by_name(&self, name: &str) -> anyhow::Result<Option<Project>>;
    async fn list_projects(&self) -> anyhow::Result<Vec<Project>>;
    /// Insert the project row only; members are added separately.
    async fn insert_project(&self, project: Project) -> anyhow::Result<()>;
    /// Overwrite name, display name, owner and description.
    async fn update_project(&self, project: Project) -> anyhow::Result<()>;
    /// Hard delete of the project row. Returns true if a row was deleted.
    async fn delete_project(&self, id: Uuid) -> anyhow::Result<bool>;

    // --- membership ---

    async fn list_members(&self, project_id: Uuid) -> anyhow::Result<BTreeSet<String>>;
    /// Idempotent: adding an existing member is a no-op.
    async fn add_member(&self, project_id: Uuid, user_id: &str) -> anyhow::Result<()>;
    async fn remove_member(&self, project_id: Uuid, user_id: &str) -> anyhow::Result<bool>;
    async fn remove_all_members(&self, project_id: Uuid) -> anyhow::Result<u64>;

    // --- posts ---

    async fn find_post(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn find_post_by_number(
        &self,
        project_id: Uuid,
        number: i64,
    ) -> anyhow::Result<Option<Post>>;
    /// Newest first.
    async fn list_posts(&self, scope: PostScope, page: PageRequest) -> anyhow::Result<Vec<Post>>;
    async fn insert_post(&self, post: Post) -> anyhow::Result<()>;
    /// Overwrite title, content, thumbnail and `updated_at`.
    async fn update_post(&self, post: Post) -> anyhow::Result<()>;
    async fn soft_delete_post(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn soft_delete_project_posts(&self, project_id: Uuid) -> anyhow::Result<u64>;
    /// Every post ever created in the project, soft-deleted ones included.
    async fn count_all_project_posts(&self, project_id: Uuid) -> anyhow::Result<u64>;
    async fn count_live_project_posts(&self, project_id: Uuid) -> anyhow::Result<u64>;

    // --- comments ---

    async fn find_comment(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    /// Newest first.
    async fn list_post_comments(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> anyhow::Result<Vec<Comment>>;
    async fn insert_comment(&self, comment: Comment) -> anyhow::Result<()>;
    async fn soft_delete_comment(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn soft_delete_post_comments(&self, post_id: Uuid) -> anyhow::Result<u64>;
    /// Comments under any post of the project.
    async fn soft_delete_project_comments(&self, project_id: Uuid) -> anyhow::Result<u64>;
    async fn count_live_post_comments(&self, post_id: Uuid) -> anyhow::Result<u64>;
}

/// Entry point to storage: autocommit operations plus transactions.
#[async_trait]
pub trait BlogRepository: BlogStore {
    /// Start a unit of work. Dropping it without `commit` rolls it back.
    async fn begin(&self) -> anyhow::Result<Box<dyn BlogUnitOfWork>>;
}

/// All-or-nothing batch of store operations.
#[async_trait]
pub trait BlogUnitOfWork: BlogStore {
    async fn commit(self: Box<Self>) -> anyhow::Result<()>;
    async fn rollback(self: Box<Self>) -> anyhow::Result<()>;
}
