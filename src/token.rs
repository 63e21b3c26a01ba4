//! Authentication tokens issued by the service.

use crate::error::{ApiError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Signed credential structure returned by the authentication endpoint.
///
/// Opaque apart from `data` (the authenticated principal) and the optional
/// `timestamp`. Key order is preserved so the re-encoded JSON matches what
/// the service signed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Token(Map<String, Value>);

impl Token {
    /// Parse a JSON object carrying at least a string `data` field.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::try_from(value)
    }

    /// Parse a token straight from a response body. Bytes that are not
    /// valid UTF-8 are rejected rather than replaced.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::try_from(value)
    }

    /// Principal the token was issued to.
    pub fn data(&self) -> &str {
        // presence is checked on construction
        self.0.get("data").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Issue time from the `timestamp` field, when present and parseable.
    pub fn issued_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.0.get("timestamp")?.as_str()?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S UTC")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// `Authorization` header value: `Token token="<base64(json)>"`.
    pub fn to_header_value(&self) -> Result<String> {
        Ok(format!(r#"Token token="{}""#, STANDARD.encode(self.to_json()?)))
    }
}

impl TryFrom<Value> for Token {
    type Error = ApiError;

    fn try_from(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ApiError::JsonError(
                "token must be a JSON object".to_string(),
            ));
        };
        match map.get("data") {
            Some(Value::String(_)) => Ok(Self(map)),
            Some(_) => Err(ApiError::JsonError(
                "token field 'data' must be a string".to_string(),
            )),
            None => Err(ApiError::JsonError(
                "token is missing the 'data' field".to_string(),
            )),
        }
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Token::try_from(value).map_err(serde::de::Error::custom)
    }
}
