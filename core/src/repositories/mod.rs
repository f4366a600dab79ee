pub mod session;
pub mod signing_key;
pub mod storage;

pub use session::{SessionRepository, SessionTransaction};
pub use signing_key::SigningKeyTransaction;
pub use storage::{MemoryStorage, MemoryUnitOfWork, Storage, UnitOfWork};
