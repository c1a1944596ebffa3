mod config;
pub use config::AppConfig;
pub mod error;
pub use error::RelayError;
pub mod gate;
pub mod models;
