pub mod error;
pub mod membership;
pub mod policy;
pub mod repo;
pub mod service;
