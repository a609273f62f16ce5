use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::contract::{
    client::BlogApi,
    error::BlogError,
    model::{
        Comment, NewComment, NewPost, NewProject, PageRequest, Post, PostPatch, ProfilePatch,
        Project, ProjectPatch, User,
    },
};
use crate::domain::service::Service;

/// Local implementation of the BlogApi trait that delegates to the domain service
pub struct BlogLocalClient {
    service: Arc<Service>,
}

impl BlogLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl BlogApi for BlogLocalClient {
    async fn get_user(&self, id: &str) -> Result<User, BlogError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<User>, BlogError> {
        self.service.list_users().await.map_err(Into::into)
    }

    async fn update_profile(&self, actor: &str, patch: ProfilePatch) -> Result<User, BlogError> {
        self.service
            .update_profile(actor, patch)
            .await
            .map_err(Into::into)
    }

    async fn get_project(&self, id: Uuid) -> Result<Project, BlogError> {
        self.service.get_project(id).await.map_err(Into::into)
    }

    async fn get_project_by_name(&self, name: &str) -> Result<Project, BlogError> {
        self.service
            .get_project_by_name(name)
            .await
            .map_err(Into::into)
    }

    async fn list_projects(&self) -> Result<Vec<Project>, BlogError> {
        self.service.list_projects().await.map_err(Into::into)
    }

    async fn create_project(&self, actor: &str, new: NewProject) -> Result<Project, BlogError> {
        self.service
            .create_project(actor, new)
            .await
            .map_err(Into::into)
    }

    async fn update_project(
        &self,
        actor: &str,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Project, BlogError> {
        self.service
            .update_project(actor, id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_project(&self, actor: &str, id: Uuid) -> Result<(), BlogError> {
        self.service
            .delete_project(actor, id)
            .await
            .map_err(Into::into)
    }

    async fn get_post(&self, id: Uuid) -> Result<Post, BlogError> {
        self.service.get_post(id).await.map_err(Into::into)
    }

    async fn get_project_post(&self, project_id: Uuid, number: i64) -> Result<Post, BlogError> {
        self.service
            .get_project_post(project_id, number)
            .await
            .map_err(Into::into)
    }

    async fn list_posts(&self, page: PageRequest) -> Result<Vec<Post>, BlogError> {
        self.service.list_posts(page).await.map_err(Into::into)
    }

    async fn list_project_posts(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Post>, BlogError> {
        self.service
            .list_project_posts(project_id, page)
            .await
            .map_err(Into::into)
    }

    async fn list_user_posts(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<Vec<Post>, BlogError> {
        self.service
            .list_user_posts(user_id, page)
            .await
            .map_err(Into::into)
    }

    async fn create_post(
        &self,
        actor: &str,
        project_id: Uuid,
        new: NewPost,
    ) -> Result<Post, BlogError> {
        self.service
            .create_post(actor, project_id, new)
            .await
            .map_err(Into::into)
    }

    async fn update_post(
        &self,
        actor: &str,
        id: Uuid,
        patch: PostPatch,
    ) -> Result<Post, BlogError> {
        self.service
            .update_post(actor, id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_post(&self, actor: &str, id: Uuid) -> Result<(), BlogError> {
        self.service.delete_post(actor, id).await.map_err(Into::into)
    }

    async fn get_comment(&self, id: Uuid) -> Result<Comment, BlogError> {
        self.service.get_comment(id).await.map_err(Into::into)
    }

    async fn list_post_comments(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Comment>, BlogError> {
        self.service
            .list_post_comments(post_id, page)
            .await
            .map_err(Into::into)
    }

    async fn create_comment(
        &self,
        actor: &str,
        post_id: Uuid,
        new: NewComment,
    ) -> Result<Comment, BlogError> {
        self.service
            .create_comment(actor, post_id, new)
            .await
            .map_err(Into::into)
    }

    async fn delete_comment(&self, actor: &str, id: Uuid) -> Result<(), BlogError> {
        self.service
            .delete_comment(actor, id)
            .await
            .map_err(Into::into)
    }
}
