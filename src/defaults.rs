//! Default Configuration Values
//!
//! This module centralizes the constants used throughout the client: token
//! lifetime handling, request header names and HTTP client defaults.

use std::time::Duration;

/// Token lifecycle defaults
pub mod token {
    use super::*;

    /// Age after which an API-key token is considered stale.
    ///
    /// The service expires tokens after 8 minutes; refreshing at 4 leaves room
    /// for long-running requests started with an older token.
    pub const STALE_THRESHOLD: Duration = Duration::from_secs(4 * 60);
}

/// Request header names attached to outgoing requests
pub mod headers {
    /// Privilege escalation requested for the call (e.g. `elevate`)
    pub const PRIVILEGE: &str = "x-privilege";

    /// Originating client address forwarded by a proxying caller
    pub const FORWARDED_FOR: &str = "x-forwarded-for";

    /// `&`-joined fully-qualified role ids recorded in the audit trail
    pub const AUDIT_ROLES: &str = "x-audit-roles";

    /// `&`-joined fully-qualified resource ids recorded in the audit trail
    pub const AUDIT_RESOURCES: &str = "x-audit-resources";
}

/// HTTP client default configurations
pub mod http {
    use super::*;

    /// Default request timeout for HTTP requests
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

    /// Default connection timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("rbac-api/", env!("CARGO_PKG_VERSION"));
}

/// Environment variables read by [`crate::config::ApiConfig::from_env`]
pub mod env {
    pub const CORE_URL: &str = "RBAC_CORE_URL";
    pub const AUTHN_URL: &str = "RBAC_AUTHN_URL";
    pub const ACCOUNT: &str = "RBAC_ACCOUNT";
}
