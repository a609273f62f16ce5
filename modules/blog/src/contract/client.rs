use async_trait::async_trait;
use uuid::Uuid;

use crate::contract::{
    error::BlogError,
    model::{
        Comment, NewComment, NewPost, NewProject, PageRequest, Post, PostPatch, ProfilePatch,
        Project, ProjectPatch, User,
    },
};

/// Public API of the blog core.
///
/// `actor` is the caller identity exactly as the transport received it; the
/// core resolves it against the account store on every write.
#[async_trait]
pub trait BlogApi: Send + Sync {
    // --- users ---

    async fn get_user(&self, id: &str) -> Result<User, BlogError>;

    async fn list_users(&self) -> Result<Vec<User>, BlogError>;

    async fn update_profile(&self, actor: &str, patch: ProfilePatch) -> Result<User, BlogError>;

    // --- projects ---

    async fn get_project(&self, id: Uuid) -> Result<Project, BlogError>;

    async fn get_project_by_name(&self, name: &str) -> Result<Project, BlogError>;

    async fn list_projects(&self) -> Result<Vec<Project>, BlogError>;

    async fn create_project(&self, actor: &str, new: NewProject) -> Result<Project, BlogError>;

    async fn update_project(
        &self,
        actor: &str,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Project, BlogError>;

    async fn delete_project(&self, actor: &str, id: Uuid) -> Result<(), BlogError>;

    // --- posts ---

    async fn get_post(&self, id: Uuid) -> Result<Post, BlogError>;

    async fn get_project_post(&self, project_id: Uuid, number: i64) -> Result<Post, BlogError>;

    async fn list_posts(&self, page: PageRequest) -> Result<Vec<Post>, BlogError>;

    async fn list_project_posts(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Post>, BlogError>;

    async fn list_user_posts(&self, user_id: &str, page: PageRequest)
        -> Result<Vec<Post>, BlogError>;

    async fn create_post(
        &self,
        actor: &str,
        project_id: Uuid,
        new: NewPost,
    ) -> Result<Post, BlogError>;

    async fn update_post(&self, actor: &str, id: Uuid, patch: PostPatch)
        -> Result<Post, BlogError>;

    async fn delete_post(&self, actor: &str, id: Uuid) -> Result<(), BlogError>;

    // --- comments ---

    async fn get_comment(&self, id: Uuid) -> Result<Comment, BlogError>;

    async fn list_post_comments(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Comment>, BlogError>;

    async fn create_comment(
        &self,
        actor: &str,
        post_id: Uuid,
        new: NewComment,
    ) -> Result<Comment, BlogError>;

    async fn delete_comment(&self, actor: &str, id: Uuid) -> Result<(), BlogError>;
}
