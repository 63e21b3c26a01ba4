//! Role and resource identifiers.
//!
//! Ids travel as `account:kind:identifier` strings; the account may be
//! omitted (`kind:identifier`), in which case the configured default account
//! applies. Segments are percent-decoded when parsed and percent-encoded when
//! placed in a URL path.

use crate::error::{ApiError, Result};
use std::borrow::Cow;
use std::fmt;

/// Which collection an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdCategory {
    Roles,
    Resources,
}

impl IdCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Resources => "resources",
        }
    }
}

impl fmt::Display for IdCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedId {
    pub account: String,
    pub category: IdCategory,
    pub kind: String,
    pub identifier: String,
}

impl ParsedId {
    /// `(account, category, kind, identifier)` tuple form.
    pub fn parts(&self) -> (&str, &str, &str, &str) {
        (
            &self.account,
            self.category.as_str(),
            &self.kind,
            &self.identifier,
        )
    }

    /// `account:kind:identifier`
    pub fn fully_qualified(&self) -> String {
        format!("{}:{}:{}", self.account, self.kind, self.identifier)
    }

    /// `category/account/kind/identifier`, each segment percent-encoded.
    pub fn path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.category,
            urlencoding::encode(&self.account),
            urlencoding::encode(&self.kind),
            urlencoding::encode(&self.identifier)
        )
    }
}

impl fmt::Display for ParsedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fully_qualified())
    }
}

/// Borrowed view of something that names a role or resource.
#[derive(Debug, Clone)]
pub enum IdRef<'a> {
    /// `kind:identifier` or `account:kind:identifier`
    Raw(&'a str),
    /// Already split; `account` falls back to the default when absent.
    Parts {
        account: Option<&'a str>,
        kind: &'a str,
        identifier: &'a str,
    },
}

/// Anything that can be resolved into a [`ParsedId`].
pub trait ToId {
    fn to_id(&self) -> IdRef<'_>;
}

impl ToId for str {
    fn to_id(&self) -> IdRef<'_> {
        IdRef::Raw(self)
    }
}

impl ToId for String {
    fn to_id(&self) -> IdRef<'_> {
        IdRef::Raw(self)
    }
}

impl ToId for ParsedId {
    fn to_id(&self) -> IdRef<'_> {
        IdRef::Parts {
            account: Some(&self.account),
            kind: &self.kind,
            identifier: &self.identifier,
        }
    }
}

/// `(kind, identifier)` pair
impl<K: AsRef<str>, I: AsRef<str>> ToId for (K, I) {
    fn to_id(&self) -> IdRef<'_> {
        IdRef::Parts {
            account: None,
            kind: self.0.as_ref(),
            identifier: self.1.as_ref(),
        }
    }
}

impl<T: ToId + ?Sized> ToId for &T {
    fn to_id(&self) -> IdRef<'_> {
        (**self).to_id()
    }
}

/// Resolves ids against a default account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdParser {
    default_account: String,
}

impl IdParser {
    /// Parser filling in `default_account` for two-part ids.
    pub fn new(default_account: impl Into<String>) -> Self {
        Self {
            default_account: default_account.into(),
        }
    }

    /// Account used when an id does not name one.
    pub fn default_account(&self) -> &str {
        &self.default_account
    }

    /// Resolve `id` as a role.
    pub fn parse_role_id<T: ToId + ?Sized>(&self, id: &T) -> Result<ParsedId> {
        self.parse(id.to_id(), IdCategory::Roles)
    }

    /// Resolve `id` as a resource.
    pub fn parse_resource_id<T: ToId + ?Sized>(&self, id: &T) -> Result<ParsedId> {
        self.parse(id.to_id(), IdCategory::Resources)
    }

    fn parse(&self, id: IdRef<'_>, category: IdCategory) -> Result<ParsedId> {
        let (account, kind, identifier) = match id {
            IdRef::Raw(raw) => {
                let segments = raw
                    .splitn(3, ':')
                    .map(decode_segment)
                    .collect::<Result<Vec<_>>>()?;
                match segments.as_slice() {
                    [kind, identifier] => (
                        self.default_account.clone(),
                        kind.to_string(),
                        identifier.to_string(),
                    ),
                    [account, kind, identifier] => (
                        account.to_string(),
                        kind.to_string(),
                        identifier.to_string(),
                    ),
                    _ => {
                        return Err(ApiError::IdFormatError(format!(
                            "expected [account:]kind:identifier, got '{raw}'"
                        )));
                    }
                }
            }
            IdRef::Parts {
                account,
                kind,
                identifier,
            } => (
                account.unwrap_or(&self.default_account).to_string(),
                kind.to_string(),
                identifier.to_string(),
            ),
        };

        if account.is_empty() || kind.is_empty() || identifier.is_empty() {
            return Err(ApiError::IdFormatError(format!(
                "empty segment in '{account}:{kind}:{identifier}'"
            )));
        }

        Ok(ParsedId {
            account,
            category,
            kind,
            identifier,
        })
    }
}

fn decode_segment(segment: &str) -> Result<Cow<'_, str>> {
    urlencoding::decode(segment)
        .map_err(|e| ApiError::IdFormatError(format!("segment '{segment}' is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> IdParser {
        IdParser::new("the-account")
    }

    #[test]
    fn short_ids_use_the_default_account() {
        let id = parser().parse_role_id("cat:mouse").unwrap();
        assert_eq!(id.parts(), ("the-account", "roles", "cat", "mouse"));
    }

    #[test]
    fn long_ids_keep_their_account() {
        let id = parser().parse_role_id("acme:cat:mouse").unwrap();
        assert_eq!(id.parts(), ("acme", "roles", "cat", "mouse"));

        let id = parser().parse_resource_id("acme:cat:mouse").unwrap();
        assert_eq!(id.parts(), ("acme", "resources", "cat", "mouse"));
    }

    #[test]
    fn single_segment_is_rejected() {
        assert!(matches!(
            parser().parse_role_id("mouse"),
            Err(ApiError::IdFormatError(_))
        ));
        assert!(matches!(
            parser().parse_resource_id(""),
            Err(ApiError::IdFormatError(_))
        ));
        assert!(matches!(
            parser().parse_role_id("cat:"),
            Err(ApiError::IdFormatError(_))
        ));
    }

    #[test]
    fn identifiers_may_contain_colons() {
        let id = parser().parse_resource_id("acme:variable:db:password").unwrap();
        assert_eq!(id.identifier, "db:password");
    }

    #[test]
    fn segments_are_percent_decoded() {
        let id = parser().parse_role_id("acme:group:ops%2Fadmins%3Aall").unwrap();
        assert_eq!(id.identifier, "ops/admins:all");
        assert_eq!(id.path(), "roles/acme/group/ops%2Fadmins%3Aall");
        assert_eq!(id.fully_qualified(), "acme:group:ops/admins:all");
    }

    #[test]
    fn structured_inputs() {
        let id = parser().parse_role_id(&("user", "alice")).unwrap();
        assert_eq!(id.fully_qualified(), "the-account:user:alice");

        let resource = parser().parse_resource_id("other:host:web-1").unwrap();
        let as_role = parser().parse_role_id(&resource).unwrap();
        assert_eq!(as_role.parts(), ("other", "roles", "host", "web-1"));

        let owned = String::from("layer:web");
        assert_eq!(
            parser().parse_resource_id(&owned).unwrap().account,
            "the-account"
        );
    }
}
