pub mod entity;
pub mod mapper;
pub mod migrations;
pub mod sea_orm_repo;
pub mod txn;

pub use sea_orm_repo::{SeaOrmBlogRepository, SeaOrmStore};
