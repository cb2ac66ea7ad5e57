pub mod manager;
pub mod models;
pub mod source;

pub use manager::ConfigManager;
pub use models::RelayConfig;
pub use source::{LayeredSource, ValueSource};
