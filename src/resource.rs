//! Role and resource handles.
//!
//! A handle pairs a [`ParsedId`] with the [`Session`] that created it and
//! answers existence and permission questions through that session's
//! credentials.

use crate::error::{ApiError, Result};
use crate::http::HttpRequest;
use crate::id::{IdRef, ParsedId, ToId};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct Role {
    session: Session,
    id: ParsedId,
}

impl Role {
    pub(crate) fn new(session: Session, id: ParsedId) -> Self {
        Self { session, id }
    }

    pub fn id(&self) -> &ParsedId {
        &self.id
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.session.config().core_base(), self.id.path())
    }

    /// Whether the role exists. A role hidden from the caller still exists.
    pub fn exists(&self) -> Result<bool> {
        exists(&self.session, self.url())
    }
}

#[derive(Debug, Clone)]
pub struct Resource {
    session: Session,
    id: ParsedId,
}

impl Resource {
    pub(crate) fn new(session: Session, id: ParsedId) -> Self {
        Self { session, id }
    }

    pub fn id(&self) -> &ParsedId {
        &self.id
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.session.config().core_base(), self.id.path())
    }

    /// Whether the resource exists. A resource hidden from the caller still exists.
    pub fn exists(&self) -> Result<bool> {
        exists(&self.session, self.url())
    }

    /// Whether the session's identity holds `privilege` on this resource.
    pub fn permitted(&self, privilege: &str) -> Result<bool> {
        let request = HttpRequest::get(self.url())
            .with_query("check", "true")
            .with_query("privilege", privilege);
        match self.session.send(request) {
            Ok(_) => Ok(true),
            Err(ApiError::NotFound(_) | ApiError::Forbidden(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

fn exists(session: &Session, url: String) -> Result<bool> {
    match session.send(HttpRequest::head(url)) {
        Ok(_) => Ok(true),
        Err(ApiError::Forbidden(_)) => Ok(true),
        Err(ApiError::NotFound(_)) => Ok(false),
        Err(e) => Err(e),
    }
}

impl ToId for Role {
    fn to_id(&self) -> IdRef<'_> {
        self.id.to_id()
    }
}

impl ToId for Resource {
    fn to_id(&self) -> IdRef<'_> {
        self.id.to_id()
    }
}
