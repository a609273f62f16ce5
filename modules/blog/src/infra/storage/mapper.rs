use std::collections::BTreeSet;

use uuid::Uuid;

use crate::contract::model::{Comment, Post, Profile, Project, User, UserAccount};
use crate::infra::storage::entity::{comment, post, profile, project, user};

pub fn account_to_contract(entity: user::Model) -> UserAccount {
    UserAccount {
        id: entity.id,
        name: entity.name,
        auth: entity.auth,
    }
}

/// Null columns read back as empty strings.
pub fn profile_to_contract(entity: profile::Model) -> Profile {
    Profile {
        id: entity.id,
        description: entity.description.unwrap_or_default(),
        icon_src: entity.icon_src.unwrap_or_default(),
        twitter_id: entity.twitter_id.unwrap_or_default(),
        github_id: entity.github_id.unwrap_or_default(),
    }
}

pub fn profile_to_active(p: Profile) -> profile::ActiveModel {
    use sea_orm::Set;
    profile::ActiveModel {
        id: Set(p.id),
        description: Set(Some(p.description)),
        twitter_id: Set(Some(p.twitter_id)),
        github_id: Set(Some(p.github_id)),
        icon_src: Set(Some(p.icon_src)),
    }
}

/// Join of account, optional profile and memberships.
pub fn user_view(
    account: user::Model,
    profile: Option<profile::Model>,
    project_ids: Vec<Uuid>,
) -> User {
    let account = account_to_contract(account);
    let profile = profile.map(profile_to_contract).unwrap_or_default();
    User {
        class: account.class(),
        id: account.id,
        name: account.name,
        description: profile.description,
        icon_src: profile.icon_src,
        twitter_id: profile.twitter_id,
        github_id: profile.github_id,
        project_ids,
    }
}

pub fn project_to_contract(
    entity: project::Model,
    members: BTreeSet<String>,
    post_count: u64,
) -> Project {
    Project {
        id: entity.id,
        name: entity.name,
        display_name: entity.display_name,
        owner_id: entity.owner_id,
        members,
        description: entity.description.unwrap_or_default(),
        post_count,
    }
}

pub fn project_to_active(p: Project) -> project::ActiveModel {
    use sea_orm::Set;
    project::ActiveModel {
        id: Set(p.id),
        name: Set(p.name),
        display_name: Set(p.display_name),
        owner_id: Set(p.owner_id),
        description: Set(Some(p.description)),
    }
}

pub fn post_to_contract(entity: post::Model, comment_count: u64) -> Post {
    Post {
        id: entity.id,
        title: entity.title,
        content: entity.content,
        thumb_src: entity.thumb_src,
        author_id: entity.author_id,
        project_id: entity.project_id,
        number: entity.number,
        created_at: entity.created_at,
        updated_at: entity.updated_at,
        views: entity.views,
        comment_count,
    }
}

pub fn comment_to_contract(entity: comment::Model) -> Comment {
    Comment {
        id: entity.id,
        content: entity.content,
        author_id: entity.author_id,
        post_id: entity.post_id,
        created_at: entity.created_at,
    }
}
