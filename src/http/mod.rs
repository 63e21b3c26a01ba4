//! HTTP Utilities
//!
//! - Transport abstraction and the default `reqwest` implementation
//! - Credential header construction

pub mod headers;
pub mod transport;

pub use headers::*;
pub use transport::*;
