//! Codec module - the message type-system boundary.
//!
//! The protocol engine never interprets payloads itself; it delegates to a
//! [`MessageCodec`]: resolve a type name, encode a typed value to bytes,
//! decode bytes back to a typed value. [`TypedMessage`] is the currency
//! type on both sides of that boundary: a full type name plus a generic
//! string-keyed body, convertible to and from a plain map for callers who
//! do not want to construct values by hand.
//!
//! [`JsonCodec`] is the default implementation, backed by `serde_json`.
//!
//! # Example
//!
//! ```
//! use dfhack_client::codec::TypedMessage;
//! use serde_json::json;
//!
//! let msg = TypedMessage::new("dfproto.StringMessage", json!({"value": "1.0.0"}));
//! assert_eq!(msg.type_name(), "dfproto.StringMessage");
//! assert_eq!(msg.get("value").unwrap(), "1.0.0");
//! ```

mod json;

pub use json::JsonCodec;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DfhackError, Result};

/// Resolved handle for a message type known to a codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    full_name: String,
}

impl TypeDescriptor {
    /// Create a descriptor for a resolved type name.
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
        }
    }

    /// The full type name, e.g. `dfproto.StringMessage`.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }
}

/// A typed value: a full type name plus a string-keyed body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedMessage {
    type_name: String,
    body: Value,
}

impl TypedMessage {
    /// Create a message from a type name and body value.
    pub fn new(type_name: impl Into<String>, body: Value) -> Self {
        Self {
            type_name: type_name.into(),
            body,
        }
    }

    /// Create a message with an empty body, e.g. `dfproto.EmptyMessage`.
    pub fn empty(type_name: impl Into<String>) -> Self {
        Self::new(type_name, Value::Object(Map::new()))
    }

    /// Create a message from a plain string-keyed map.
    pub fn from_map(type_name: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self::new(type_name, Value::Object(fields))
    }

    /// The declared full type name of this value.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The body value.
    pub fn body(&self) -> &Value {
        &self.body
    }

    /// Consume the message, returning the body.
    pub fn into_body(self) -> Value {
        self.body
    }

    /// Get a top-level field by name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.body.as_object().and_then(|m| m.get(field))
    }

    /// Convert the body to a plain string-keyed map.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if the body is not an object.
    pub fn to_map(&self) -> Result<Map<String, Value>> {
        self.body
            .as_object()
            .cloned()
            .ok_or_else(|| {
                DfhackError::Protocol(format!(
                    "{} body is not a string-keyed mapping",
                    self.type_name
                ))
            })
    }
}

/// Contract between the protocol engine and the external type system.
pub trait MessageCodec {
    /// Resolve a full type name, failing with `UnknownType` if the codec
    /// does not know it.
    fn resolve(&self, full_name: &str) -> Result<TypeDescriptor>;

    /// Encode a typed value to payload bytes.
    fn encode(&self, message: &TypedMessage) -> Result<Vec<u8>>;

    /// Decode payload bytes as the given type.
    fn decode(&self, type_name: &str, payload: &[u8]) -> Result<TypedMessage>;
}
