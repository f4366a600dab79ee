//! MySQL-specific database implementations
//!
//! [`MySqlStorage`] implements the engine's storage contract; each unit of
//! work owns one pooled connection with an open transaction.

mod error;
mod rows;
pub mod storage;
pub mod unit_of_work;

pub use error::map_sqlx_error;
pub use storage::MySqlStorage;
pub use unit_of_work::MySqlUnitOfWork;
