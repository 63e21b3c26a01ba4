//! Authenticator for sessions built from a token the caller already holds.

use crate::authn::Authenticator;
use crate::error::{ApiError, Result};
use crate::token::Token;

/// Never stale, never refreshable.
///
/// The session keeps using the supplied token until the service rejects it;
/// the caller then has to build a new session.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticTokenAuthenticator;

impl StaticTokenAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Authenticator for StaticTokenAuthenticator {
    fn needs_refresh(&self) -> bool {
        false
    }

    fn refresh(&mut self) -> Result<Token> {
        Err(ApiError::RefreshUnsupported(
            "cannot refresh a session created from a token".to_string(),
        ))
    }

    fn kind(&self) -> &'static str {
        "static-token"
    }
}
