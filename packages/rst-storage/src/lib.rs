pub mod db;
pub mod models;
pub mod schema;
pub mod sync;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;
