pub mod api;
pub mod cli;
pub mod config;

pub use api::{ApiError, ApiResult, VtigerClient};
pub use config::ClientOptions;
