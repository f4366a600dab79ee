//! Opaque caller-supplied JSON payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::TokenError;

/// Caller data the engine stores and embeds without inspecting it
///
/// Used for both the per-session data blob and the payload copied into every
/// access token. Typed access goes through [`Payload::from_serializable`] and
/// [`Payload::decode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Value);

impl Payload {
    /// An empty JSON object
    pub fn empty() -> Self {
        Payload(Value::Object(serde_json::Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Payload(value)
    }

    /// Serialize a caller type into a payload
    pub fn from_serializable<T: Serialize>(value: &T) -> Result<Self, TokenError> {
        serde_json::to_value(value)
            .map(Payload)
            .map_err(|e| TokenError::EncodingFailed {
                message: e.to_string(),
            })
    }

    /// Deserialize the payload into a caller type
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, TokenError> {
        serde_json::from_value(self.0.clone()).map_err(|e| TokenError::InvalidPayload {
            message: e.to_string(),
        })
    }

    /// Parse a stored JSON text column
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw).map(Payload)
    }

    /// Render for a JSON text column
    pub fn to_json_string(&self) -> String {
        self.0.to_string()
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        Payload(value)
    }
}
