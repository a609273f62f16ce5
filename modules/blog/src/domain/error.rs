use thiserror::Error;
use uuid::Uuid;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Post not found: {id}")]
    PostNotFound { id: String },

    #[error("Comment not found: {id}")]
    CommentNotFound { id: Uuid },

    #[error("Actor '{actor}' may not {action}")]
    Forbidden { actor: String, action: &'static str },

    #[error("Invalid project name '{name}': must match ^[A-Za-z0-9_-]+$")]
    InvalidProjectName { name: String },

    #[error("Project name '{name}' is already taken")]
    ProjectNameTaken { name: String },

    #[error("New owner '{user_id}' is not a member of the project")]
    OwnerNotMember { user_id: String },

    #[error("Invited user '{user_id}' is not a blog user")]
    UnknownInvitee { user_id: String },

    #[error("Validation failed: {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Database error: {message}")]
    Database { message: String },
}

impl DomainError {
    pub fn user_not_found(id: impl Into<String>) -> Self {
        Self::UserNotFound { id: id.into() }
    }

    pub fn project_not_found(id: impl ToString) -> Self {
        Self::ProjectNotFound { id: id.to_string() }
    }

    pub fn post_not_found(id: impl ToString) -> Self {
        Self::PostNotFound { id: id.to_string() }
    }

    pub fn comment_not_found(id: Uuid) -> Self {
        Self::CommentNotFound { id }
    }

    pub fn forbidden(actor: impl Into<String>, action: &'static str) -> Self {
        Self::Forbidden {
            actor: actor.into(),
            action,
        }
    }

    pub fn invalid_project_name(name: impl Into<String>) -> Self {
        Self::InvalidProjectName { name: name.into() }
    }

    pub fn project_name_taken(name: impl Into<String>) -> Self {
        Self::ProjectNameTaken { name: name.into() }
    }

    pub fn owner_not_member(user_id: impl Into<String>) -> Self {
        Self::OwnerNotMember {
            user_id: user_id.into(),
        }
    }

    pub fn unknown_invitee(user_id: impl Into<String>) -> Self {
        Self::UnknownInvitee {
            user_id: user_id.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }
}
