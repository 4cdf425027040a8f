pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod observability;
pub mod price_infra;
pub mod scheduler;
pub mod types;
pub mod utils;
