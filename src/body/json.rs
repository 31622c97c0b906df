//! `application/json` decoding.

use serde_json::{Map, Value};

use crate::http::error::GatewayError;

/// Decode a JSON body in strict mode: only objects and arrays are accepted
/// at the top level. An empty body decodes to `{}`.
pub fn decode(bytes: &[u8]) -> Result<Value, GatewayError> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    match first {
        None => Ok(Value::Object(Map::new())),
        Some(b'{') | Some(b'[') => serde_json::from_slice(bytes)
            .map_err(|e| GatewayError::BodyMalformed(e.to_string())),
        Some(_) => Err(GatewayError::BodyMalformed(
            "top-level JSON value must be an object or array".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_objects_and_arrays() {
        assert_eq!(decode(br#"{"a": [1, 2]}"#).unwrap(), json!({"a": [1, 2]}));
        assert_eq!(decode(b" [true] ").unwrap(), json!([true]));
    }

    #[test]
    fn empty_body_is_empty_object() {
        assert_eq!(decode(b"").unwrap(), json!({}));
        assert_eq!(decode(b"  \n").unwrap(), json!({}));
    }

    #[test]
    fn rejects_bare_primitives() {
        assert!(matches!(decode(b"42"), Err(GatewayError::BodyMalformed(_))));
        assert!(matches!(decode(br#""str""#), Err(GatewayError::BodyMalformed(_))));
    }

    #[test]
    fn rejects_broken_json() {
        assert!(matches!(decode(b"{\"a\":"), Err(GatewayError::BodyMalformed(_))));
    }
}
