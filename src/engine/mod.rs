pub mod executor;
pub mod generator;
pub mod loader;
