//! Username + API key authentication.
//!
//! Exchanges the key for a token at the authentication endpoint and treats
//! the token as stale once it is older than
//! [`STALE_THRESHOLD`](crate::defaults::token::STALE_THRESHOLD).

use crate::authn::Authenticator;
use crate::clock::Clock;
use crate::defaults;
use crate::error::Result;
use crate::http::{CredentialHeaderBuilder, HttpRequest, Transport, classify_response};
use crate::token::Token;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use std::time::Duration;

pub struct ApiKeyAuthenticator {
    username: String,
    api_key: SecretString,
    authn_url: String,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    /// Clock reading at the last successful refresh
    token_born: Option<Duration>,
}

impl ApiKeyAuthenticator {
    /// `authn_url` is the authentication service base, without trailing slash.
    pub fn new(
        username: impl Into<String>,
        api_key: SecretString,
        authn_url: impl Into<String>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            username: username.into(),
            api_key,
            authn_url: authn_url.into(),
            transport,
            clock,
            token_born: None,
        }
    }

    fn authenticate_url(&self) -> String {
        format!(
            "{}/users/{}/authenticate",
            self.authn_url,
            urlencoding::encode(&self.username)
        )
    }

    /// Age of the current token, if one was obtained.
    pub fn token_age(&self) -> Option<Duration> {
        self.token_born
            .map(|born| self.clock.now().saturating_sub(born))
    }
}

impl std::fmt::Debug for ApiKeyAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyAuthenticator")
            .field("username", &self.username)
            .field("authn_url", &self.authn_url)
            .field("token_born", &self.token_born)
            .finish_non_exhaustive()
    }
}

impl Authenticator for ApiKeyAuthenticator {
    fn needs_refresh(&self) -> bool {
        match self.token_age() {
            Some(age) => age > defaults::token::STALE_THRESHOLD,
            None => true,
        }
    }

    fn refresh(&mut self) -> Result<Token> {
        let url = self.authenticate_url();
        let request = HttpRequest::post(&url)
            .with_headers(CredentialHeaderBuilder::new().with_text_content_type().build())
            .with_body(self.api_key.expose_secret().as_bytes().to_vec());

        let response = classify_response(&url, self.transport.execute(request)?)?;
        let token = Token::from_slice(&response.body)?;

        self.token_born = Some(self.clock.now());
        Ok(token)
    }

    fn kind(&self) -> &'static str {
        "api-key"
    }

    fn username(&self) -> Option<&str> {
        Some(&self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ApiError;
    use crate::http::HttpResponse;
    use reqwest::header::HeaderMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<Vec<(u16, Vec<u8>)>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        fn new(responses: &[(u16, &str)]) -> Arc<Self> {
            let raw: Vec<(u16, &[u8])> = responses
                .iter()
                .map(|(status, body)| (*status, body.as_bytes()))
                .collect();
            Self::from_bytes(&raw)
        }

        fn from_bytes(responses: &[(u16, &[u8])]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .iter()
                        .rev()
                        .map(|(s, b)| (*s, b.to_vec()))
                        .collect(),
                ),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.seen.lock().unwrap().push(request);
            let (status, body) = self.responses.lock().unwrap().pop().unwrap();
            Ok(HttpResponse {
                status,
                headers: HeaderMap::new(),
                body,
            })
        }
    }

    fn authenticator(
        transport: Arc<ScriptedTransport>,
        clock: &ManualClock,
    ) -> ApiKeyAuthenticator {
        ApiKeyAuthenticator::new(
            "host/web 1",
            SecretString::from("s3cret".to_string()),
            "https://authn.example.com",
            transport,
            Arc::new(clock.clone()),
        )
    }

    #[test]
    fn stale_until_first_refresh_then_after_threshold() {
        let clock = ManualClock::new();
        let transport = ScriptedTransport::new(&[
            (200, r#"{"data":"host/web 1"}"#),
            (200, r#"{"data":"host/web 1"}"#),
        ]);
        let mut authn = authenticator(transport.clone(), &clock);

        assert!(authn.needs_refresh());
        authn.refresh().unwrap();
        assert!(!authn.needs_refresh());

        clock.advance(defaults::token::STALE_THRESHOLD);
        assert!(!authn.needs_refresh());
        clock.advance(Duration::from_secs(1));
        assert!(authn.needs_refresh());

        authn.refresh().unwrap();
        assert!(!authn.needs_refresh());
        assert_eq!(transport.seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn posts_the_api_key_to_the_escaped_user_path() {
        let clock = ManualClock::new();
        let transport = ScriptedTransport::new(&[(200, r#"{"data":"host/web 1"}"#)]);
        let mut authn = authenticator(transport.clone(), &clock);
        let token = authn.refresh().unwrap();
        assert_eq!(token.data(), "host/web 1");

        let seen = transport.seen.lock().unwrap();
        assert_eq!(
            seen[0].url,
            "https://authn.example.com/users/host%2Fweb%201/authenticate"
        );
        assert_eq!(seen[0].body.as_deref(), Some(&b"s3cret"[..]));
    }

    #[test]
    fn unauthorized_leaves_state_untouched() {
        let clock = ManualClock::new();
        let transport = ScriptedTransport::new(&[(401, "")]);
        let mut authn = authenticator(transport, &clock);
        assert!(matches!(authn.refresh(), Err(ApiError::Unauthorized(_))));
        assert!(authn.needs_refresh());
        assert_eq!(authn.token_age(), None);
    }

    #[test]
    fn invalid_utf8_in_the_token_is_an_error() {
        let clock = ManualClock::new();
        let transport =
            ScriptedTransport::from_bytes(&[(200, &b"{\"data\":\"al\xffice\"}"[..])]);
        let mut authn = authenticator(transport, &clock);
        assert!(matches!(authn.refresh(), Err(ApiError::JsonError(_))));
        assert!(authn.needs_refresh());
        assert_eq!(authn.token_age(), None);
    }

    #[test]
    fn debug_output_hides_the_key() {
        let clock = ManualClock::new();
        let authn = authenticator(ScriptedTransport::new(&[]), &clock);
        let rendered = format!("{authn:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("host/web 1"));
    }
}
