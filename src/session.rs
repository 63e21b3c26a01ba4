//! The API handle.
//!
//! A [`Session`] owns one [`Authenticator`], the token it last produced and
//! the request-context overrides (privilege, forwarded address, audit ids).
//! Only [`Session::token`], [`Session::authenticate`],
//! [`Session::credentials`] and [`Session::send`] may perform I/O; every
//! other accessor reads in-memory state.
//!
//! Derived sessions (`with_*`) share the authenticator and its current token
//! with the session they came from, so deriving never re-authenticates.

use crate::authn::{
    ApiKeyAuthenticator, Authenticator, StaticTokenAuthenticator, TokenFileAuthenticator,
    TokenSource,
};
use crate::clock::{Clock, SystemClock};
use crate::config::ApiConfig;
use crate::defaults;
use crate::error::Result;
use crate::http::{
    CredentialHeaderBuilder, HttpRequest, HttpResponse, ReqwestTransport, Transport,
    classify_response,
};
use crate::id::{IdParser, ToId};
use crate::resource::{Resource, Role};
use crate::token::Token;
use reqwest::header::HeaderMap;
use secrecy::SecretString;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Headers to attach to an outgoing request, plus the identity they carry.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub headers: HeaderMap,
    pub username: Option<String>,
}

struct AuthState {
    authenticator: Box<dyn Authenticator>,
    token: Option<Token>,
}

/// Authenticated handle to the service.
///
/// Clones and derived sessions share one lock around the authenticator and
/// its token. The lock is held for the whole of a refresh, including the
/// network round trip or file read, so while one thread refreshes, others
/// block in [`Session::token`], [`Session::username`] and the `Debug`
/// output of the session and of its [`Role`]/[`Resource`] handles.
#[derive(Clone)]
pub struct Session {
    config: Arc<ApiConfig>,
    id_parser: IdParser,
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<AuthState>>,
    username: Option<String>,
    privilege: Option<String>,
    remote_ip: Option<String>,
    audit_roles: Vec<String>,
    audit_resources: Vec<String>,
}

impl Session {
    /// Start building a session on `config`.
    pub fn builder(config: ApiConfig) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Session that authenticates with a username and API key.
    pub fn from_api_key(
        config: ApiConfig,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Self::builder(config).api_key(username, api_key)
    }

    /// Session bound to a token obtained elsewhere. It cannot refresh.
    pub fn from_token(config: ApiConfig, token: Token) -> Result<Self> {
        Self::builder(config).token(token)
    }

    /// Session reading its token from a file kept current by another process.
    pub fn from_token_file(config: ApiConfig, path: impl Into<PathBuf>) -> Result<Self> {
        Self::builder(config).token_file(path)
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Parser resolving ids against the configured account.
    pub fn id_parser(&self) -> &IdParser {
        &self.id_parser
    }

    /// Privilege sent with each request, if any.
    pub fn privilege(&self) -> Option<&str> {
        self.privilege.as_deref()
    }

    /// Forwarded client address, if any.
    pub fn remote_ip(&self) -> Option<&str> {
        self.remote_ip.as_deref()
    }

    /// Fully qualified audit role ids.
    pub fn audit_roles(&self) -> &[String] {
        &self.audit_roles
    }

    /// Fully qualified audit resource ids.
    pub fn audit_resources(&self) -> &[String] {
        &self.audit_resources
    }

    fn state(&self) -> MutexGuard<'_, AuthState> {
        // Token and authenticator are only replaced after a successful
        // refresh, so a poisoned guard still holds consistent state.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current token, refreshed first when absent or stale.
    pub fn token(&self) -> Result<Token> {
        let mut state = self.state();
        if let Some(token) = &state.token
            && !state.authenticator.needs_refresh()
        {
            return Ok(token.clone());
        }
        Self::refresh_locked(&mut state)
    }

    /// Obtain a new token regardless of staleness.
    pub fn authenticate(&self) -> Result<Token> {
        Self::refresh_locked(&mut self.state())
    }

    fn refresh_locked(state: &mut AuthState) -> Result<Token> {
        tracing::debug!(
            authenticator = state.authenticator.kind(),
            had_token = state.token.is_some(),
            "refreshing token"
        );
        let token = state.authenticator.refresh()?;
        state.token = Some(token.clone());
        Ok(token)
    }

    /// Explicit username, else the principal of the cached token.
    ///
    /// Never refreshes: a stale cached token still answers.
    pub fn username(&self) -> Option<String> {
        if let Some(username) = &self.username {
            return Some(username.clone());
        }
        self.state()
            .token
            .as_ref()
            .map(|token| token.data().to_string())
    }

    /// Request headers derived from the (possibly refreshed) token.
    pub fn credentials(&self) -> Result<Credentials> {
        let token = self.token()?;
        let headers = CredentialHeaderBuilder::new()
            .with_token(&token)?
            .with_privilege(self.privilege.as_deref())?
            .with_remote_ip(self.remote_ip.as_deref())?
            .with_audit_ids(defaults::headers::AUDIT_ROLES, &self.audit_roles)?
            .with_audit_ids(defaults::headers::AUDIT_RESOURCES, &self.audit_resources)?
            .build();
        Ok(Credentials {
            headers,
            username: self
                .username
                .clone()
                .or_else(|| Some(token.data().to_string())),
        })
    }

    /// Derived session sending `privilege` with each request.
    pub fn with_privilege(&self, privilege: impl Into<String>) -> Self {
        Self {
            privilege: Some(privilege.into()),
            ..self.clone()
        }
    }

    /// Derived session forwarding `remote_ip` as the client address.
    pub fn with_remote_ip(&self, remote_ip: impl Into<String>) -> Self {
        Self {
            remote_ip: Some(remote_ip.into()),
            ..self.clone()
        }
    }

    /// Derived session recording `roles` in the audit trail.
    pub fn with_audit_roles<I, T>(&self, roles: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: ToId,
    {
        let audit_roles = roles
            .into_iter()
            .map(|id| Ok(self.id_parser.parse_role_id(&id)?.fully_qualified()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            audit_roles,
            ..self.clone()
        })
    }

    /// Derived session recording `resources` in the audit trail.
    pub fn with_audit_resources<I, T>(&self, resources: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: ToId,
    {
        let audit_resources = resources
            .into_iter()
            .map(|id| Ok(self.id_parser.parse_resource_id(&id)?.fully_qualified()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            audit_resources,
            ..self.clone()
        })
    }

    /// Handle on a role; the id is parsed now, the service is not contacted.
    pub fn role<T: ToId + ?Sized>(&self, id: &T) -> Result<Role> {
        Ok(Role::new(self.clone(), self.id_parser.parse_role_id(id)?))
    }

    /// Handle on a resource; the id is parsed now, the service is not contacted.
    pub fn resource<T: ToId + ?Sized>(&self, id: &T) -> Result<Resource> {
        Ok(Resource::new(
            self.clone(),
            self.id_parser.parse_resource_id(id)?,
        ))
    }

    /// Execute `request` with this session's credentials attached.
    ///
    /// 401/403/404 and other non-2xx statuses come back as errors.
    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let credentials = self.credentials()?;
        let url = request.url.clone();
        let response = self
            .transport
            .execute(request.with_headers(credentials.headers))?;
        classify_response(&url, response)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("Session")
            .field("core_url", &self.config.core_url)
            .field("authenticator", &state.authenticator.kind())
            .field("has_token", &state.token.is_some())
            .field("username", &self.username)
            .field("privilege", &self.privilege)
            .field("remote_ip", &self.remote_ip)
            .field("audit_roles", &self.audit_roles)
            .field("audit_resources", &self.audit_resources)
            .finish()
    }
}

/// Builder selecting the authentication strategy of a [`Session`].
pub struct SessionBuilder {
    config: ApiConfig,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
    remote_ip: Option<String>,
}

impl SessionBuilder {
    /// Builder with the default transport and clock.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            config,
            transport: None,
            clock: None,
            remote_ip: None,
        }
    }

    /// Use a custom transport instead of a `reqwest` client built from the config.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Clock used for token age. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Forwarded client address for the built session.
    pub fn remote_ip(mut self, remote_ip: impl Into<String>) -> Self {
        self.remote_ip = Some(remote_ip.into());
        self
    }

    /// Session exchanging `api_key` for a token on first use.
    pub fn api_key(
        self,
        username: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Session> {
        self.config.validate()?;
        let transport = self.resolve_transport()?;
        let clock = self
            .clock
            .clone()
            .unwrap_or_else(|| Arc::new(SystemClock::new()));
        let authenticator = ApiKeyAuthenticator::new(
            username,
            SecretString::from(api_key.into()),
            self.config.authn_base(),
            transport.clone(),
            clock,
        );
        Ok(self.finish(Box::new(authenticator), None, transport))
    }

    /// Session bound to `token`; it never refreshes.
    pub fn token(self, token: Token) -> Result<Session> {
        self.config.validate()?;
        let transport = self.resolve_transport()?;
        Ok(self.finish(
            Box::new(StaticTokenAuthenticator::new()),
            Some(token),
            transport,
        ))
    }

    /// Session re-reading the token at `path` whenever it changes.
    pub fn token_file(self, path: impl Into<PathBuf>) -> Result<Session> {
        self.token_authenticator(TokenFileAuthenticator::new(path))
    }

    /// Like [`SessionBuilder::token_file`] with a custom token source.
    pub fn token_source(self, source: impl TokenSource + 'static) -> Result<Session> {
        self.token_authenticator(TokenFileAuthenticator::with_source(source))
    }

    /// Install any [`Authenticator`]; the first token is fetched lazily.
    pub fn authenticator(self, authenticator: impl Authenticator + 'static) -> Result<Session> {
        self.token_authenticator(authenticator)
    }

    fn token_authenticator(self, authenticator: impl Authenticator + 'static) -> Result<Session> {
        self.config.validate()?;
        let transport = self.resolve_transport()?;
        Ok(self.finish(Box::new(authenticator), None, transport))
    }

    fn resolve_transport(&self) -> Result<Arc<dyn Transport>> {
        match &self.transport {
            Some(transport) => Ok(transport.clone()),
            None => Ok(Arc::new(ReqwestTransport::new(&self.config.http)?)),
        }
    }

    fn finish(
        self,
        authenticator: Box<dyn Authenticator>,
        token: Option<Token>,
        transport: Arc<dyn Transport>,
    ) -> Session {
        let username = authenticator.username().map(str::to_string);
        let id_parser = IdParser::new(self.config.account.clone());
        Session {
            config: Arc::new(self.config),
            id_parser,
            transport,
            state: Arc::new(Mutex::new(AuthState {
                authenticator,
                token,
            })),
            username,
            privilege: None,
            remote_ip: self.remote_ip,
            audit_roles: Vec::new(),
            audit_resources: Vec::new(),
        }
    }
}
