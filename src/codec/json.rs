//! JSON codec backed by `serde_json`.
//!
//! Message bodies travel as their JSON encoding; the set of resolvable type
//! names is registered up front, normally from the same [`MethodTable`]
//! that seeds the registry. A real deployment against a protobuf server
//! would swap in a schema-aware [`MessageCodec`]; the engine only sees the
//! trait.
//!
//! [`MethodTable`]: crate::methods::MethodTable

use std::collections::HashSet;

use serde_json::{Map, Value};

use super::{MessageCodec, TypeDescriptor, TypedMessage};
use crate::error::{DfhackError, Result};
use crate::methods::MethodTable;

/// Codec that encodes message bodies as JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    known: HashSet<String>,
}

impl JsonCodec {
    /// Create a codec with no registered types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec that resolves every type named by a method table.
    pub fn for_table(table: &MethodTable) -> Self {
        let known = table.type_names().map(str::to_string).collect();
        Self { known }
    }

    /// Register an additional resolvable type name.
    pub fn register(&mut self, full_name: &str) {
        self.known.insert(full_name.to_string());
    }
}

impl MessageCodec for JsonCodec {
    fn resolve(&self, full_name: &str) -> Result<TypeDescriptor> {
        if self.known.contains(full_name) {
            Ok(TypeDescriptor::new(full_name))
        } else {
            Err(DfhackError::UnknownType(full_name.to_string()))
        }
    }

    fn encode(&self, message: &TypedMessage) -> Result<Vec<u8>> {
        self.resolve(message.type_name())?;
        Ok(serde_json::to_vec(message.body())?)
    }

    fn decode(&self, type_name: &str, payload: &[u8]) -> Result<TypedMessage> {
        self.resolve(type_name)?;
        // A zero-length payload is a valid encoding of an empty message.
        let body = if payload.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(payload)?
        };
        Ok(TypedMessage::new(type_name, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec() -> JsonCodec {
        JsonCodec::for_table(&MethodTable::core())
    }

    #[test]
    fn test_resolve_known_type() {
        let desc = codec().resolve("dfproto.StringMessage").unwrap();
        assert_eq!(desc.full_name(), "dfproto.StringMessage");
    }

    #[test]
    fn test_resolve_unknown_type() {
        let result = codec().resolve("dfproto.NoSuchMessage");
        assert!(matches!(result, Err(DfhackError::UnknownType(_))));
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = codec();
        let msg = TypedMessage::new("dfproto.StringMessage", json!({"value": "1.0.0"}));

        let bytes = codec.encode(&msg).unwrap();
        let decoded = codec.decode("dfproto.StringMessage", &bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_encode_rejects_unknown_type() {
        let msg = TypedMessage::empty("dfproto.NoSuchMessage");
        assert!(codec().encode(&msg).is_err());
    }

    #[test]
    fn test_decode_empty_payload_as_empty_body() {
        let decoded = codec().decode("dfproto.EmptyMessage", &[]).unwrap();
        assert!(decoded.body().as_object().unwrap().is_empty());
    }

    #[test]
    fn test_decode_invalid_payload() {
        let result = codec().decode("dfproto.StringMessage", b"not json");
        assert!(matches!(result, Err(DfhackError::Json(_))));
    }

    #[test]
    fn test_register_custom_type() {
        let mut codec = JsonCodec::new();
        assert!(codec.resolve("myplugin.Custom").is_err());

        codec.register("myplugin.Custom");
        assert!(codec.resolve("myplugin.Custom").is_ok());
    }
}
