//! Request header construction.

use crate::defaults;
use crate::error::{ApiError, Result};
use crate::token::Token;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;

/// Builder for the headers attached to authenticated requests
pub struct CredentialHeaderBuilder {
    headers: HeaderMap,
}

impl CredentialHeaderBuilder {
    pub fn new() -> Self {
        Self {
            headers: HeaderMap::new(),
        }
    }

    /// `Authorization: Token token="<base64(json)>"`
    pub fn with_token(mut self, token: &Token) -> Result<Self> {
        let value = token.to_header_value()?;
        self.headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| {
                ApiError::ConfigurationError(format!("Invalid token header: {e}"))
            })?,
        );
        Ok(self)
    }

    pub fn with_privilege(self, privilege: Option<&str>) -> Result<Self> {
        match privilege {
            Some(p) => self.with_header(defaults::headers::PRIVILEGE, p),
            None => Ok(self),
        }
    }

    pub fn with_remote_ip(self, remote_ip: Option<&str>) -> Result<Self> {
        match remote_ip {
            Some(ip) => self.with_header(defaults::headers::FORWARDED_FOR, ip),
            None => Ok(self),
        }
    }

    /// Each id percent-encoded and joined with `&`; omitted when empty.
    pub fn with_audit_ids(self, name: &str, ids: &[String]) -> Result<Self> {
        if ids.is_empty() {
            return Ok(self);
        }
        let value = ids
            .iter()
            .map(|id| urlencoding::encode(id).into_owned())
            .collect::<Vec<_>>()
            .join("&");
        self.with_header(name, &value)
    }

    pub fn with_text_content_type(mut self) -> Self {
        self.headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        self
    }

    /// Add a custom header
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ApiError::ConfigurationError(format!("Invalid header name '{name}': {e}"))
        })?;
        self.headers.insert(
            header_name,
            HeaderValue::from_str(value).map_err(|e| {
                ApiError::ConfigurationError(format!("Invalid header value for '{name}': {e}"))
            })?,
        );
        Ok(self)
    }

    pub fn build(self) -> HeaderMap {
        self.headers
    }
}

impl Default for CredentialHeaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert configured string headers into a `HeaderMap`, rejecting invalid entries.
pub fn headers_from_config(extra: &HashMap<String, String>) -> Result<HeaderMap> {
    let mut map = HeaderMap::new();
    for (k, v) in extra {
        let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| {
            ApiError::ConfigurationError(format!("Invalid header name '{k}': {e}"))
        })?;
        let value = HeaderValue::from_str(v).map_err(|e| {
            ApiError::ConfigurationError(format!("Invalid header value for '{k}': {e}"))
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_ids_are_encoded_and_joined() {
        let headers = CredentialHeaderBuilder::new()
            .with_audit_ids(
                defaults::headers::AUDIT_ROLES,
                &["acme:user:alice".to_string(), "acme:group:a&b".to_string()],
            )
            .unwrap()
            .build();
        assert_eq!(
            headers.get(defaults::headers::AUDIT_ROLES).unwrap(),
            "acme%3Auser%3Aalice&acme%3Agroup%3Aa%26b"
        );
    }

    #[test]
    fn optional_headers_are_skipped_when_absent() {
        let headers = CredentialHeaderBuilder::new()
            .with_privilege(None)
            .unwrap()
            .with_remote_ip(None)
            .unwrap()
            .with_audit_ids(defaults::headers::AUDIT_RESOURCES, &[])
            .unwrap()
            .build();
        assert!(headers.is_empty());
    }

    #[test]
    fn invalid_header_values_are_configuration_errors() {
        let err = CredentialHeaderBuilder::new()
            .with_privilege(Some("bad\nvalue"))
            .err()
            .unwrap();
        assert!(matches!(err, ApiError::ConfigurationError(_)));

        let mut extra = HashMap::new();
        extra.insert("bad header".to_string(), "v".to_string());
        assert!(headers_from_config(&extra).is_err());
    }
}
