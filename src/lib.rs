//! # rbac-api
//!
//! Blocking client for a role-based access control and secrets service.
//!
#![deny(unsafe_code)]

//! The heart of the crate is the token lifecycle held by a [`Session`]:
//!
//! - **API key** sessions exchange a username and key for a token and
//!   re-authenticate once the token is older than four minutes.
//! - **Token** sessions use a token obtained elsewhere and never refresh.
//! - **Token file** sessions re-read a file written by another process
//!   whenever its modification time changes.
//!
//! Every outgoing request carries headers derived from the current token
//! (see [`Session::credentials`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rbac_api::{ApiConfig, Session};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ApiConfig::new("https://rbac.example.com/api", "acme");
//!     let session = Session::from_api_key(config, "alice", "api-key")?;
//!
//!     let db = session.resource("variable:db/password")?;
//!     if db.permitted("execute")? {
//!         println!("{} may fetch {}", session.username().unwrap_or_default(), db.id());
//!     }
//!     Ok(())
//! }
//! ```

pub mod authn;
pub mod clock;
pub mod config;
pub mod defaults;
pub mod error;
pub mod http;
pub mod id;
pub mod resource;
pub mod session;
pub mod token;

pub use authn::{
    ApiKeyAuthenticator, Authenticator, FileTokenSource, StaticTokenAuthenticator,
    TokenFileAuthenticator, TokenSource,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApiConfig, HttpConfig};
pub use error::{ApiError, Result};
pub use http::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
pub use id::{IdCategory, IdParser, IdRef, ParsedId, ToId};
pub use resource::{Resource, Role};
pub use session::{Credentials, Session, SessionBuilder};
pub use token::Token;
