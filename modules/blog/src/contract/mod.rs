pub mod client;
pub mod error;
pub mod model;

pub use client::BlogApi;
pub use error::BlogError;
pub use model::*;
