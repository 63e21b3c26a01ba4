//! Authentication strategies.
//!
//! An [`Authenticator`] knows how to obtain a fresh [`Token`] and whether the
//! token it last produced should be replaced. The [`crate::Session`] owning
//! it decides when to ask.
//!
//! Notes:
//! - The interface is synchronous; refresh blocks the caller until the
//!   service (or the filesystem) answers.
//! - Implementations record their own freshness state and only update it
//!   after a successful refresh.

use crate::error::Result;
use crate::token::Token;

pub mod api_key;
pub mod static_token;
pub mod token_file;

pub use api_key::ApiKeyAuthenticator;
pub use static_token::StaticTokenAuthenticator;
pub use token_file::{FileTokenSource, TokenFileAuthenticator, TokenSource};

pub trait Authenticator: Send {
    /// Whether the last token produced by this authenticator should be replaced.
    fn needs_refresh(&self) -> bool;

    /// Obtain a new token.
    fn refresh(&mut self) -> Result<Token>;

    /// Short strategy name used in diagnostics.
    fn kind(&self) -> &'static str;

    /// Username this strategy authenticates as, when known up front.
    fn username(&self) -> Option<&str> {
        None
    }
}
