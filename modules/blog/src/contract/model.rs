use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Account class as issued by the external identity system.
///
/// Only `Standard` accounts are blog users: they can own projects, write
/// posts and have a public profile. Any other class may still comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserClass {
    Standard,
    Other,
}

impl UserClass {
    /// Wire tag the identity system uses for standard accounts.
    pub const STANDARD_TAG: &'static str = "default";

    pub fn from_tag(tag: &str) -> Self {
        if tag == Self::STANDARD_TAG {
            Self::Standard
        } else {
            Self::Other
        }
    }

    pub fn is_standard(self) -> bool {
        self == Self::Standard
    }
}

/// Identity record owned by the external identity system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub id: String,
    pub name: String,
    /// Raw class tag, kept verbatim so non-standard tags survive a round trip.
    pub auth: String,
}

impl UserAccount {
    pub fn class(&self) -> UserClass {
        UserClass::from_tag(&self.auth)
    }
}

/// Profile fields a user maintains about themselves.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Profile {
    pub id: String,
    pub description: String,
    pub icon_src: String,
    pub twitter_id: String,
    pub github_id: String,
}

/// Public user view: account, profile and the projects the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub class: UserClass,
    pub description: String,
    pub icon_src: String,
    pub twitter_id: String,
    pub github_id: String,
    pub project_ids: Vec<Uuid>,
}

/// Profile update. `None` and `Some("")` both leave the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProfilePatch {
    pub description: Option<String>,
    pub icon_src: Option<String>,
    pub twitter_id: Option<String>,
    pub github_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub owner_id: String,
    /// Always contains `owner_id`.
    pub members: BTreeSet<String>,
    pub description: String,
    /// Live (non-deleted) posts.
    pub post_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewProject {
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// Project update. Empty strings leave fields unchanged.
///
/// `invites` doubles as the removal list: ids that are not members yet are
/// invited, ids that already are members are removed unless they are the
/// current or the requested owner.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub new_owner: Option<String>,
    pub invites: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub thumb_src: Option<String>,
    pub author_id: String,
    pub project_id: Uuid,
    /// Zero-based position within the project, unique per project.
    pub number: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub views: i64,
    /// Live (non-deleted) comments.
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub thumb_src: Option<String>,
}

/// Post update. `None` and `Some("")` both leave the field unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub thumb_src: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub content: String,
    pub author_id: String,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewComment {
    pub content: String,
}

/// Offset pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Parse raw query-string values. Absent values take the defaults;
    /// anything that is not a non-negative integer is rejected.
    pub fn parse(
        limit: Option<&str>,
        offset: Option<&str>,
        default_limit: u64,
    ) -> Result<Self, PageParamError> {
        let limit = match limit {
            Some(raw) => parse_non_negative("limit", raw)?,
            None => default_limit,
        };
        let offset = match offset {
            Some(raw) => parse_non_negative("offset", raw)?,
            None => 0,
        };
        Ok(Self { limit, offset })
    }
}

/// Rejected pagination parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{param} must be a non-negative integer, got '{value}'")]
pub struct PageParamError {
    pub param: &'static str,
    pub value: String,
}

fn parse_non_negative(param: &'static str, raw: &str) -> Result<u64, PageParamError> {
    raw.trim().parse::<u64>().map_err(|_| PageParamError {
        param,
        value: raw.to_string(),
    })
}

/// Treats `None` and empty strings alike: both mean "no change".
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
