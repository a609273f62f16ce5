use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::contract::model::{
    non_empty, Comment, NewComment, NewPost, NewProject, PageRequest, Post, PostPatch,
    ProfilePatch, Project, ProjectPatch, User, UserClass,
};
use crate::domain::error::DomainError;
use crate::domain::membership::compute_membership_diff;
use crate::domain::policy::{
    can_manage_comment, can_manage_post, can_manage_project, Policy, PostAction,
};
use crate::domain::repo::{BlogRepository, BlogUnitOfWork, PostScope};

static PROJECT_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("static project name pattern"));

/// Domain service with the blog's business rules.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn BlogRepository>,
    policy: Policy,
    numbering: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
    config: ServiceConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub max_page_size: u64,
    pub provision_profiles: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_page_size: 100,
            provision_profiles: true,
        }
    }
}

fn storage(e: anyhow::Error) -> DomainError {
    DomainError::database(format!("{e:#}"))
}

pub fn validate_project_name(name: &str) -> Result<(), DomainError> {
    if PROJECT_NAME.is_match(name) {
        Ok(())
    } else {
        Err(DomainError::invalid_project_name(name))
    }
}

fn require_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Commit on success, roll back on failure. A failed rollback is only logged
/// and the operation's own error is returned.
async fn finish<T>(
    uow: Box<dyn BlogUnitOfWork>,
    outcome: Result<T, DomainError>,
) -> Result<T, DomainError> {
    match outcome {
        Ok(value) => {
            uow.commit().await.map_err(storage)?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rb) = uow.rollback().await {
                debug!("Rollback failed: {rb:#}");
            }
            Err(e)
        }
    }
}

impl Service {
    pub fn new(repo: Arc<dyn BlogRepository>, config: ServiceConfig) -> Self {
        let policy = Policy::new(Arc::clone(&repo), config.provision_profiles);
        Self {
            repo,
            policy,
            numbering: Arc::new(DashMap::new()),
            config,
        }
    }

    fn clamp(&self, page: PageRequest) -> PageRequest {
        PageRequest::new(page.limit.min(self.config.max_page_size), page.offset)
    }

    async fn begin(&self) -> Result<Box<dyn BlogUnitOfWork>, DomainError> {
        self.repo.begin().await.map_err(storage)
    }

    // --- users ---

    #[instrument(name = "blog.service.get_user", skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: &str) -> Result<User, DomainError> {
        debug!("Getting user");
        self.repo
            .find_user(id)
            .await
            .map_err(storage)?
            .filter(|u| u.class.is_standard())
            .ok_or_else(|| DomainError::user_not_found(id))
    }

    #[instrument(name = "blog.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let users = self
            .repo
            .list_users_by_auth(UserClass::STANDARD_TAG)
            .await
            .map_err(storage)?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(name = "blog.service.update_profile", skip(self, patch), fields(actor = %actor))]
    pub async fn update_profile(&self, actor: &str, patch: ProfilePatch) -> Result<User, DomainError> {
        info!("Updating profile");
        if !self.policy.can_create_post(actor).await.map_err(storage)? {
            return Err(DomainError::forbidden(actor, "update a profile"));
        }

        let mut profile = self
            .repo
            .find_profile(actor)
            .await
            .map_err(storage)?
            .unwrap_or_default();
        profile.id = actor.to_string();
        if let Some(v) = non_empty(&patch.description) {
            profile.description = v.to_string();
        }
        if let Some(v) = non_empty(&patch.icon_src) {
            profile.icon_src = v.to_string();
        }
        if let Some(v) = non_empty(&patch.twitter_id) {
            profile.twitter_id = v.to_string();
        }
        if let Some(v) = non_empty(&patch.github_id) {
            profile.github_id = v.to_string();
        }
        self.repo.save_profile(profile).await.map_err(storage)?;

        info!("Successfully updated profile");
        self.get_user(actor).await
    }

    // --- projects ---

    #[instrument(name = "blog.service.get_project", skip(self), fields(project_id = %id))]
    pub async fn get_project(&self, id: Uuid) -> Result<Project, DomainError> {
        debug!("Getting project");
        self.repo
            .find_project(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::project_not_found(id))
    }

    #[instrument(name = "blog.service.get_project_by_name", skip(self), fields(name = %name))]
    pub async fn get_project_by_name(&self, name: &str) -> Result<Project, DomainError> {
        debug!("Getting project by name");
        self.repo
            .find_project_by_name(name)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::project_not_found(name))
    }

    #[instrument(name = "blog.service.list_projects", skip(self))]
    pub async fn list_projects(&self) -> Result<Vec<Project>, DomainError> {
        let projects = self.repo.list_projects().await.map_err(storage)?;
        debug!("Listed {} projects", projects.len());
        Ok(projects)
    }

    #[instrument(
        name = "blog.service.create_project",
        skip(self, new),
        fields(actor = %actor, name = %new.name)
    )]
    pub async fn create_project(&self, actor: &str, new: NewProject) -> Result<Project, DomainError> {
        info!("Creating project");
        if !self.policy.can_create_project(actor).await.map_err(storage)? {
            return Err(DomainError::forbidden(actor, "create a project"));
        }
        validate_project_name(&new.name)?;

        let project = Project {
            id: Uuid::now_v7(),
            name: new.name,
            display_name: new.display_name,
            owner_id: actor.to_string(),
            members: BTreeSet::from([actor.to_string()]),
            description: new.description,
            post_count: 0,
        };

        let uow = self.begin().await?;
        let outcome = Self::insert_project_tx(uow.as_ref(), &project).await;
        finish(uow, outcome).await?;

        info!("Successfully created project with id={}", project.id);
        Ok(project)
    }

    async fn insert_project_tx(
        uow: &dyn BlogUnitOfWork,
        project: &Project,
    ) -> Result<(), DomainError> {
        if uow
            .find_project_by_name(&project.name)
            .await
            .map_err(storage)?
            .is_some()
        {
            return Err(DomainError::project_name_taken(&project.name));
        }
        uow.insert_project(project.clone()).await.map_err(storage)?;
        uow.add_member(project.id, &project.owner_id)
            .await
            .map_err(storage)?;
        Ok(())
    }

    #[instrument(
        name = "blog.service.update_project",
        skip(self, patch),
        fields(actor = %actor, project_id = %id)
    )]
    pub async fn update_project(
        &self,
        actor: &str,
        id: Uuid,
        patch: ProjectPatch,
    ) -> Result<Project, DomainError> {
        info!("Updating project");
        let uow = self.begin().await?;
        let outcome = Self::update_project_tx(uow.as_ref(), actor, id, &patch).await;
        finish(uow, outcome).await?;

        let project = self.get_project(id).await?;
        info!(
            "Successfully updated project; owner={}, members={}",
            project.owner_id,
            project.members.len()
        );
        Ok(project)
    }

    async fn update_project_tx(
        uow: &dyn BlogUnitOfWork,
        actor: &str,
        id: Uuid,
        patch: &ProjectPatch,
    ) -> Result<(), DomainError> {
        let mut project = uow
            .find_project(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::project_not_found(id))?;
        if !can_manage_project(actor, &project) {
            return Err(DomainError::forbidden(actor, "manage this project"));
        }
        if let Some(name) = non_empty(&patch.name) {
            validate_project_name(name)?;
        }

        let new_owner = non_empty(&patch.new_owner);
        let diff =
            compute_membership_diff(&project.members, &project.owner_id, &patch.invites, new_owner)?;

        for invitee in &diff.to_invite {
            let standard = uow
                .find_account(invitee)
                .await
                .map_err(storage)?
                .is_some_and(|a| a.class().is_standard());
            if !standard {
                return Err(DomainError::unknown_invitee(invitee));
            }
        }

        if let Some(name) = non_empty(&patch.name) {
            if name != project.name {
                let taken = uow
                    .find_project_by_name(name)
                    .await
                    .map_err(storage)?
                    .is_some_and(|other| other.id != id);
                if taken {
                    return Err(DomainError::project_name_taken(name));
                }
                project.name = name.to_string();
            }
        }
        if let Some(display_name) = non_empty(&patch.display_name) {
            project.display_name = display_name.to_string();
        }
        if let Some(description) = non_empty(&patch.description) {
            project.description = description.to_string();
        }
        if let Some(owner) = new_owner {
            project.owner_id = owner.to_string();
        }

        uow.update_project(project).await.map_err(storage)?;
        for user_id in &diff.to_invite {
            uow.add_member(id, user_id).await.map_err(storage)?;
        }
        for user_id in &diff.to_remove {
            uow.remove_member(id, user_id).await.map_err(storage)?;
        }
        debug!(
            "Applied membership diff: invited={:?}, removed={:?}",
            diff.to_invite, diff.to_remove
        );
        Ok(())
    }

    #[instrument(
        name = "blog.service.delete_project",
        skip(self),
        fields(actor = %actor, project_id = %id)
    )]
    pub async fn delete_project(&self, actor: &str, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting project");
        let uow = self.begin().await?;
        let outcome = Self::delete_project_tx(uow.as_ref(), actor, id).await;
        finish(uow, outcome).await?;

        self.numbering.remove(&id);
        info!("Successfully deleted project");
        Ok(())
    }

    async fn delete_project_tx(
        uow: &dyn BlogUnitOfWork,
        actor: &str,
        id: Uuid,
    ) -> Result<(), DomainError> {
        let project = uow
            .find_project(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::project_not_found(id))?;
        if !can_manage_project(actor, &project) {
            return Err(DomainError::forbidden(actor, "delete this project"));
        }

        let comments = uow.soft_delete_project_comments(id).await.map_err(storage)?;
        let posts = uow.soft_delete_project_posts(id).await.map_err(storage)?;
        let members = uow.remove_all_members(id).await.map_err(storage)?;
        uow.delete_project(id).await.map_err(storage)?;
        debug!("Cascade: posts={posts}, comments={comments}, members={members}");
        Ok(())
    }

    // --- posts ---

    #[instrument(name = "blog.service.get_post", skip(self), fields(post_id = %id))]
    pub async fn get_post(&self, id: Uuid) -> Result<Post, DomainError> {
        debug!("Getting post");
        self.repo
            .find_post(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::post_not_found(id))
    }

    #[instrument(
        name = "blog.service.get_project_post",
        skip(self),
        fields(project_id = %project_id, number = number)
    )]
    pub async fn get_project_post(&self, project_id: Uuid, number: i64) -> Result<Post, DomainError> {
        debug!("Getting post by number");
        self.repo
            .find_post_by_number(project_id, number)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::post_not_found(format!("{project_id}#{number}")))
    }

    #[instrument(name = "blog.service.list_posts", skip(self))]
    pub async fn list_posts(&self, page: PageRequest) -> Result<Vec<Post>, DomainError> {
        let posts = self
            .repo
            .list_posts(PostScope::All, self.clamp(page))
            .await
            .map_err(storage)?;
        debug!("Listed {} posts", posts.len());
        Ok(posts)
    }

    #[instrument(name = "blog.service.list_project_posts", skip(self), fields(project_id = %project_id))]
    pub async fn list_project_posts(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Post>, DomainError> {
        self.get_project(project_id).await?;
        let posts = self
            .repo
            .list_posts(PostScope::Project(project_id), self.clamp(page))
            .await
            .map_err(storage)?;
        debug!("Listed {} posts", posts.len());
        Ok(posts)
    }

    #[instrument(name = "blog.service.list_user_posts", skip(self), fields(user_id = %user_id))]
    pub async fn list_user_posts(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<Vec<Post>, DomainError> {
        let posts = self
            .repo
            .list_posts(PostScope::Author(user_id.to_string()), self.clamp(page))
            .await
            .map_err(storage)?;
        debug!("Listed {} posts", posts.len());
        Ok(posts)
    }

    #[instrument(
        name = "blog.service.create_post",
        skip(self, new),
        fields(actor = %actor, project_id = %project_id)
    )]
    pub async fn create_post(
        &self,
        actor: &str,
        project_id: Uuid,
        new: NewPost,
    ) -> Result<Post, DomainError> {
        info!("Creating post");
        require_text("title", &new.title)?;
        require_text("content", &new.content)?;
        if !self.policy.can_create_post(actor).await.map_err(storage)? {
            return Err(DomainError::forbidden(actor, "create a post"));
        }

        // Count-then-insert must not interleave within one project.
        let lock = self
            .numbering
            .entry(project_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        let uow = self.begin().await?;
        let outcome = Self::insert_post_tx(uow.as_ref(), actor, project_id, new).await;
        let post = finish(uow, outcome).await?;

        info!(
            "Successfully created post with id={}, number={}",
            post.id, post.number
        );
        Ok(post)
    }

    async fn insert_post_tx(
        uow: &dyn BlogUnitOfWork,
        actor: &str,
        project_id: Uuid,
        new: NewPost,
    ) -> Result<Post, DomainError> {
        let project = uow
            .find_project(project_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::project_not_found(project_id))?;
        if !project.members.contains(actor) {
            return Err(DomainError::forbidden(actor, "post in this project"));
        }

        let number = uow
            .count_all_project_posts(project_id)
            .await
            .map_err(storage)?;
        let now = Utc::now();
        let post = Post {
            id: Uuid::now_v7(),
            title: new.title,
            content: new.content,
            thumb_src: new.thumb_src.filter(|s| !s.is_empty()),
            author_id: actor.to_string(),
            project_id,
            number: i64::try_from(number)
                .map_err(|_| DomainError::database("post count out of range"))?,
            created_at: now,
            updated_at: now,
            views: 0,
            comment_count: 0,
        };
        uow.insert_post(post.clone()).await.map_err(storage)?;
        Ok(post)
    }

    #[instrument(
        name = "blog.service.update_post",
        skip(self, patch),
        fields(actor = %actor, post_id = %id)
    )]
    pub async fn update_post(
        &self,
        actor: &str,
        id: Uuid,
        patch: PostPatch,
    ) -> Result<Post, DomainError> {
        info!("Updating post");
        let uow = self.begin().await?;
        let outcome = Self::update_post_tx(uow.as_ref(), actor, id, &patch).await;
        let post = finish(uow, outcome).await?;
        info!("Successfully updated post");
        Ok(post)
    }

    async fn update_post_tx(
        uow: &dyn BlogUnitOfWork,
        actor: &str,
        id: Uuid,
        patch: &PostPatch,
    ) -> Result<Post, DomainError> {
        let mut post = uow
            .find_post(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::post_not_found(id))?;
        if !can_manage_post(actor, &post, None, PostAction::Update) {
            return Err(DomainError::forbidden(actor, "edit this post"));
        }

        if let Some(title) = non_empty(&patch.title) {
            post.title = title.to_string();
        }
        if let Some(content) = non_empty(&patch.content) {
            post.content = content.to_string();
        }
        if let Some(thumb) = non_empty(&patch.thumb_src) {
            post.thumb_src = Some(thumb.to_string());
        }
        post.updated_at = Utc::now();

        uow.update_post(post.clone()).await.map_err(storage)?;
        Ok(post)
    }

    #[instrument(
        name = "blog.service.delete_post",
        skip(self),
        fields(actor = %actor, post_id = %id)
    )]
    pub async fn delete_post(&self, actor: &str, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting post");
        let uow = self.begin().await?;
        let outcome = Self::delete_post_tx(uow.as_ref(), actor, id).await;
        finish(uow, outcome).await?;
        info!("Successfully deleted post");
        Ok(())
    }

    async fn delete_post_tx(
        uow: &dyn BlogUnitOfWork,
        actor: &str,
        id: Uuid,
    ) -> Result<(), DomainError> {
        let post = uow
            .find_post(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::post_not_found(id))?;
        let project = uow.find_project(post.project_id).await.map_err(storage)?;
        if !can_manage_post(actor, &post, project.as_ref(), PostAction::Delete) {
            return Err(DomainError::forbidden(actor, "delete this post"));
        }

        let comments = uow.soft_delete_post_comments(id).await.map_err(storage)?;
        uow.soft_delete_post(id).await.map_err(storage)?;
        debug!("Cascade: comments={comments}");
        Ok(())
    }

    // --- comments ---

    #[instrument(name = "blog.service.get_comment", skip(self), fields(comment_id = %id))]
    pub async fn get_comment(&self, id: Uuid) -> Result<Comment, DomainError> {
        debug!("Getting comment");
        self.repo
            .find_comment(id)
            .await
            .map_err(storage)?
            .ok_or_else(|| DomainError::comment_not_found(id))
    }

    #[instrument(name = "blog.service.list_post_comments", skip(self), fields(post_id = %post_id))]
    pub async fn list_post_comments(
        &self,
        post_id: Uuid,
        page: PageRequest,
    ) -> Result<Vec<Comment>, DomainError> {
        self.get_post(post_id).await?;
        let comments = self
            .repo
            .list_post_comments(post_id, self.clamp(page))
            .await
            .map_err(storage)?;
        debug!("Listed {} comments", comments.len());
        Ok(comments)
    }

    #[instrument(
        name = "blog.service.create_comment",
        skip(self, new),
        fields(actor = %actor, post_id = %post_id)
    )]
    pub async fn create_comment(
        &self,
        actor: &str,
        post_id: Uuid,
        new: NewComment,
    ) -> Result<Comment, DomainError> {
        info!("Creating comment");
        require_text("content", &new.content)?;
        if !self.policy.can_create_comment(actor).await.map_err(storage)? {
            return Err(DomainError::forbidden(actor, "comment"));
        }
        self.get_post(post_id).await?;

        let comment = Comment {
            id: Uuid::now_v7(),
            content: new.content,
            author_id: actor.to_string(),
            post_id,
            created_at: Utc::now(),
        };
        self.repo
            .insert_comment(comment.clone())
            .await
            .map_err(storage)?;
        info!("Successfully created comment with id={}", comment.id);
        Ok(comment)
    }

    #[instrument(
        name = "blog.service.delete_comment",
        skip(self),
        fields(actor = %actor, comment_id = %id)
    )]
    pub async fn delete_comment(&self, actor: &str, id: Uuid) -> Result<(), DomainError> {
        info!("Deleting comment");
        let comment = self.get_comment(id).await?;
        if !can_manage_comment(actor, &comment) {
            return Err(DomainError::forbidden(actor, "delete this comment"));
        }
        self.repo.soft_delete_comment(id).await.map_err(storage)?;
        info!("Successfully deleted comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_name_pattern() {
        assert!(validate_project_name("valid-name_1").is_ok());
        assert!(validate_project_name("ABC").is_ok());
        for bad in ["bad name!", "", "a/b", "名前", "x.y"] {
            assert!(
                matches!(
                    validate_project_name(bad),
                    Err(DomainError::InvalidProjectName { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn blank_text_is_rejected() {
        assert!(require_text("title", "hello").is_ok());
        assert!(matches!(
            require_text("title", "   "),
            Err(DomainError::Validation { .. })
        ));
    }
}
