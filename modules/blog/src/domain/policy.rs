use std::sync::Arc;

use tracing::{debug, Instrument};

use crate::contract::model::{Comment, Post, Project, UserClass};
use crate::domain::repo::BlogRepository;

/// What is being done to an existing post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAction {
    Update,
    Delete,
}

/// Authorization rules for blog writes.
///
/// Creation checks resolve the actor against the account store; management
/// checks are pure comparisons against already-loaded resources.
#[derive(Clone)]
pub struct Policy {
    repo: Arc<dyn BlogRepository>,
    provision_profiles: bool,
}

impl Policy {
    pub fn new(repo: Arc<dyn BlogRepository>, provision_profiles: bool) -> Self {
        Self {
            repo,
            provision_profiles,
        }
    }

    /// Posts and projects require a `Standard` account.
    ///
    /// On success an empty profile is provisioned in the background; that
    /// task never blocks or fails the caller.
    pub async fn can_create_post(&self, actor: &str) -> anyhow::Result<bool> {
        if actor.is_empty() {
            return Ok(false);
        }
        let allowed = self
            .repo
            .find_account(actor)
            .await?
            .is_some_and(|account| account.class() == UserClass::Standard);
        if allowed && self.provision_profiles {
            self.spawn_profile_provisioning(actor);
        }
        Ok(allowed)
    }

    /// Same rule as posts.
    pub async fn can_create_project(&self, actor: &str) -> anyhow::Result<bool> {
        self.can_create_post(actor).await
    }

    /// Comments only need the actor to exist, whatever its class.
    pub async fn can_create_comment(&self, actor: &str) -> anyhow::Result<bool> {
        if actor.is_empty() {
            return Ok(false);
        }
        Ok(self.repo.find_account(actor).await?.is_some())
    }

    fn spawn_profile_provisioning(&self, actor: &str) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime; skipping profile provisioning");
            return;
        };
        let repo = Arc::clone(&self.repo);
        let user_id = actor.to_string();
        let span = tracing::debug_span!("blog.policy.provision_profile", user_id = %user_id);
        handle.spawn(
            async move {
                match repo.ensure_profile(&user_id).await {
                    Ok(true) => debug!("Provisioned empty profile"),
                    Ok(false) => {}
                    Err(e) => debug!("Profile provisioning failed (ignored): {e:#}"),
                }
            }
            .instrument(span),
        );
    }
}

/// Only the owner may update or delete a project.
pub fn can_manage_project(actor: &str, project: &Project) -> bool {
    !actor.is_empty() && actor == project.owner_id
}

/// Authors may update and delete their posts; the project owner may delete
/// any post of the project but not edit it.
pub fn can_manage_post(
    actor: &str,
    post: &Post,
    project: Option<&Project>,
    action: PostAction,
) -> bool {
    if actor.is_empty() {
        return false;
    }
    if actor == post.author_id {
        return true;
    }
    match action {
        PostAction::Update => false,
        PostAction::Delete => project.is_some_and(|p| p.id == post.project_id && actor == p.owner_id),
    }
}

/// Only the author may delete a comment.
pub fn can_manage_comment(actor: &str, comment: &Comment) -> bool {
    !actor.is_empty() && actor == comment.author_id
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn project(owner: &str) -> Project {
        Project {
            id: Uuid::now_v7(),
            name: "p".into(),
            display_name: String::new(),
            owner_id: owner.into(),
            members: BTreeSet::from([owner.to_string()]),
            description: String::new(),
            post_count: 0,
        }
    }

    fn post(author: &str, project_id: Uuid) -> Post {
        Post {
            id: Uuid::now_v7(),
            title: "t".into(),
            content: "c".into(),
            thumb_src: None,
            author_id: author.into(),
            project_id,
            number: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            views: 0,
            comment_count: 0,
        }
    }

    #[test]
    fn project_management_is_owner_only() {
        let p = project("alice");
        assert!(can_manage_project("alice", &p));
        assert!(!can_manage_project("bob", &p));
        assert!(!can_manage_project("", &p));
    }

    #[test]
    fn post_delete_has_dual_authority() {
        let p = project("owner");
        let post = post("author", p.id);
        assert!(can_manage_post("author", &post, Some(&p), PostAction::Delete));
        assert!(can_manage_post("owner", &post, Some(&p), PostAction::Delete));
        assert!(!can_manage_post("stranger", &post, Some(&p), PostAction::Delete));
    }

    #[test]
    fn post_update_is_author_only() {
        let p = project("owner");
        let post = post("author", p.id);
        assert!(can_manage_post("author", &post, Some(&p), PostAction::Update));
        assert!(!can_manage_post("owner", &post, Some(&p), PostAction::Update));
    }

    #[test]
    fn author_succeeds_without_project() {
        let post = post("author", Uuid::now_v7());
        assert!(can_manage_post("author", &post, None, PostAction::Delete));
        assert!(!can_manage_post("owner", &post, None, PostAction::Delete));
    }

    #[test]
    fn owner_of_another_project_has_no_authority() {
        let other = project("owner");
        let post = post("author", Uuid::now_v7());
        assert!(!can_manage_post("owner", &post, Some(&other), PostAction::Delete));
    }

    #[test]
    fn comment_management_is_author_only() {
        let comment = Comment {
            id: Uuid::now_v7(),
            content: "hi".into(),
            author_id: "carol".into(),
            post_id: Uuid::now_v7(),
            created_at: Utc::now(),
        };
        assert!(can_manage_comment("carol", &comment));
        assert!(!can_manage_comment("dave", &comment));
        assert!(!can_manage_comment(&comment.id.to_string(), &comment));
    }
}
