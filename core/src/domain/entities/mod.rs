//! Domain entities representing persisted rows and token payloads.

pub mod payload;
pub mod session;
pub mod signing_key;
pub mod token;


pub use payload::Payload;
pub use session::{SessionDataRecord, SessionRecord};
pub use signing_key::{SigningKey, SigningKeyKind};
pub use token::{AccessTokenPayload, RefreshTokenPayload, TokenInfo};
