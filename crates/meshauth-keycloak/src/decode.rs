//! Unverified decoding of upstream access tokens
//!
//! The access token arrives straight from the token endpoint over TLS, so its
//! payload is read without checking the signature.
//!
//! Wrong-format errors name the JSON type that was found. A payload that does
//! not decode at all is reported as `null`, never `object`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use meshauth_core::AdapterError;
use serde_json::{Map, Value};

/// Decoded JSON object payload of an upstream token
pub type UpstreamClaims = Map<String, Value>;

/// Decode the payload segment of a JWS, requiring a JSON object
pub fn decode_unverified(token: &str) -> Result<UpstreamClaims, AdapterError> {
    match decode_payload(token) {
        Some(Value::Object(claims)) => Ok(claims),
        Some(other) => Err(AdapterError::WrongFormat(json_type_name(&other).to_string())),
        None => Err(AdapterError::WrongFormat("null".to_string())),
    }
}

fn decode_payload(token: &str) -> Option<Value> {
    let mut parts = token.split('.');
    let _header = parts.next()?;
    let payload = parts.next()?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    serde_json::from_slice(&bytes).ok()
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Non-empty string claim
pub fn string_claim<'a>(claims: &'a UpstreamClaims, name: &str) -> Option<&'a str> {
    claims
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Claim rendered the way it appears in diagnostics, `undefined` when absent
pub fn display_claim(claims: &UpstreamClaims, name: &str) -> String {
    match claims.get(name) {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
