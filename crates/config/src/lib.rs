// Configuration loading

pub mod error;
pub mod run;

pub use error::ConfigError;
pub use run::{default_database_path, RunConfig};
