//! Table definitions. Each submodule is one SeaORM entity.

pub mod comment;
pub mod member;
pub mod post;
pub mod profile;
pub mod project;
pub mod user;
