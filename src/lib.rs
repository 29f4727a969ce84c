pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod security;
pub mod services;
pub mod store;

pub use error::Error;
pub use services::GameService;
