use thiserror::Error;

/// Errors that are safe to expose to callers of the blog core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlogError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage error")]
    Storage,
}

impl BlogError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn storage() -> Self {
        Self::Storage
    }
}

impl From<crate::domain::error::DomainError> for BlogError {
    fn from(domain_error: crate::domain::error::DomainError) -> Self {
        use crate::domain::error::DomainError::*;
        match domain_error {
            UserNotFound { id } => Self::not_found("user", id),
            ProjectNotFound { id } => Self::not_found("project", id),
            PostNotFound { id } => Self::not_found("post", id),
            CommentNotFound { id } => Self::not_found("comment", id.to_string()),
            e @ Forbidden { .. } => Self::forbidden(e.to_string()),
            e @ (InvalidProjectName { .. }
            | ProjectNameTaken { .. }
            | OwnerNotMember { .. }
            | UnknownInvitee { .. }
            | Validation { .. }) => Self::validation(e.to_string()),
            Database { .. } => Self::storage(),
        }
    }
}

impl From<crate::contract::model::PageParamError> for BlogError {
    fn from(e: crate::contract::model::PageParamError) -> Self {
        Self::validation(e.to_string())
    }
}
