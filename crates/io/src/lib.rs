// File and database I/O for idealfit runs

pub mod chart;
pub mod connector;
pub mod csv;
pub mod error;
pub mod store;

pub use connector::{Connector, SqliteConnector};
pub use error::IoError;
pub use store::{Dataset, SqliteStore};
