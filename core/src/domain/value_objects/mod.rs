//! Value objects returned by the session engine.

pub mod session_outcome;

pub use session_outcome::{NewSession, RefreshOutcome, SessionInfo, VerifiedSession};
