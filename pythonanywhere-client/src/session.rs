//! Authenticated session plumbing shared by both access paths.
//!
//! The session owns a reqwest client, a manually maintained cookie jar
//! (name→value, last write wins), and a credential capability. Redirects are
//! never delegated to reqwest: the login flow needs the `Set-Cookie` headers
//! that arrive on intermediate 3xx hops, so the session follows redirects
//! itself and records cookies at every hop.

use std::collections::BTreeMap;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::header::{COOKIE, LOCATION, SET_COOKIE};
use reqwest::redirect::Policy;
use reqwest::{Client, RequestBuilder, Response, Url};
use tracing::{debug, warn};

use pythonanywhere_core::ClientError;

// ============================================================================
// Constants
// ============================================================================

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str =
    concat!("pythonanywhere-rs/", env!("CARGO_PKG_VERSION"));

/// Bound on manual redirect following.
const MAX_REDIRECT_HOPS: usize = 10;

// ============================================================================
// Credentials
// ============================================================================

/// Per-request authentication capability.
///
/// One seam, two implementations: the web path authenticates through the
/// session cookie jar after a form login, the API path attaches a token
/// header to every request.
pub trait Credentials: Send + Sync {
    /// Applies authentication to an outgoing request.
    fn apply(&self, request: RequestBuilder) -> RequestBuilder;
}

/// Form-based authentication: nothing is attached per request; the session
/// cookies established by a successful login carry the authentication.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCredentials;

impl Credentials for FormCredentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

/// Token authentication: `Authorization: Token <token>` on every request.
#[derive(Clone)]
pub struct TokenCredentials {
    token: String,
}

impl TokenCredentials {
    /// Wraps an API token obtained from the account page.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Credentials for TokenCredentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
    }
}

impl std::fmt::Debug for TokenCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log the token itself.
        f.debug_struct("TokenCredentials").finish_non_exhaustive()
    }
}

// ============================================================================
// Session
// ============================================================================

/// Redirect handling for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirects {
    /// Follow 3xx responses (bounded), recording cookies at each hop.
    Follow,
    /// Return the first response as-is; logout inspects the raw 302.
    Stop,
}

/// Session configuration supplied by the caller.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// User agent header value.
    pub user_agent: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// An authenticated session: HTTP client, cookie jar, credentials.
///
/// The jar lock only makes individual accesses atomic; the session as a
/// whole is not meant for concurrent use from multiple threads.
pub struct Session {
    client: Client,
    jar: Mutex<BTreeMap<String, String>>,
    credentials: Box<dyn Credentials>,
}

impl Session {
    /// Builds a session. Fails with [`ClientError::Configuration`] if the
    /// underlying HTTP client cannot be constructed.
    pub fn new(
        config: &SessionConfig,
        credentials: Box<dyn Credentials>,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(Policy::none())
            .build()
            .map_err(|e| ClientError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            jar: Mutex::new(BTreeMap::new()),
            credentials,
        })
    }

    /// The underlying HTTP client, for building requests.
    pub(crate) fn http(&self) -> &Client {
        &self.client
    }

    /// Exports the cookie jar as a plain map for persistence.
    pub fn cookies(&self) -> BTreeMap<String, String> {
        self.jar.lock().clone()
    }

    /// Merges a map into the jar; last write wins per cookie name.
    pub fn load_cookies(&self, cookies: BTreeMap<String, String>) {
        self.jar.lock().extend(cookies);
    }

    fn cookie_header(&self) -> Option<String> {
        let jar = self.jar.lock();
        if jar.is_empty() {
            return None;
        }
        Some(
            jar.iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Records every `Set-Cookie` header of a response into the jar.
    fn record_cookies(&self, response: &Response) {
        let mut jar = self.jar.lock();
        for header in response.headers().get_all(SET_COOKIE) {
            let Ok(raw) = header.to_str() else {
                warn!("skipping non-UTF-8 Set-Cookie header");
                continue;
            };
            let pair = raw.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    jar.insert(name.to_string(), value.trim().to_string());
                }
            }
        }
    }

    fn attach(&self, request: RequestBuilder) -> RequestBuilder {
        let request = self.credentials.apply(request);
        match self.cookie_header() {
            Some(cookies) => request.header(COOKIE, cookies),
            None => request,
        }
    }

    /// Sends a request, recording response cookies.
    ///
    /// With [`Redirects::Follow`], 3xx responses are followed as GETs
    /// (bounded at `MAX_REDIRECT_HOPS`), cookies recorded at each hop.
    /// Credentials and cookies are attached only on same-origin hops, and
    /// cookies set by a cross-origin hop are discarded.
    pub async fn send(
        &self,
        request: RequestBuilder,
        redirects: Redirects,
    ) -> Result<Response, ClientError> {
        let mut response = self
            .attach(request)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        self.record_cookies(&response);

        if redirects == Redirects::Stop {
            return Ok(response);
        }

        let origin = response.url().clone();
        let mut hops = 0;
        while response.status().is_redirection() && hops < MAX_REDIRECT_HOPS {
            let Some(location) = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
            else {
                break;
            };
            let next_url = response
                .url()
                .join(location)
                .map_err(|e| ClientError::Transport(format!("bad redirect target {location:?}: {e}")))?;
            let trusted = same_origin(&origin, &next_url);

            debug!(url = %next_url, hop = hops + 1, trusted, "Following redirect");

            let mut request = self.client.get(next_url);
            if trusted {
                request = self.attach(request);
            }
            response = request
                .send()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            if trusted {
                self.record_cookies(&response);
            }
            hops += 1;
        }

        Ok(response)
    }
}

/// Scheme, host, and effective port all match.
fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("cookies", &self.jar.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form_session() -> Session {
        Session::new(&SessionConfig::default(), Box::new(FormCredentials)).unwrap()
    }

    #[test]
    fn test_cookie_roundtrip_between_sessions() {
        let first = form_session();
        first.load_cookies(BTreeMap::from([
            ("csrftoken".to_string(), "abc".to_string()),
            ("sessionid".to_string(), "s1".to_string()),
        ]));

        let second = form_session();
        second.load_cookies(first.cookies());

        let cookies = second.cookies();
        assert_eq!(cookies.get("csrftoken").map(String::as_str), Some("abc"));
        assert_eq!(cookies.get("sessionid").map(String::as_str), Some("s1"));
    }

    #[test]
    fn test_last_write_wins_per_name() {
        let session = form_session();
        session.load_cookies(BTreeMap::from([("sessionid".to_string(), "old".to_string())]));
        session.load_cookies(BTreeMap::from([("sessionid".to_string(), "new".to_string())]));

        assert_eq!(
            session.cookies().get("sessionid").map(String::as_str),
            Some("new")
        );
    }

    #[test]
    fn test_cookie_header_is_sorted_pairs() {
        let session = form_session();
        session.load_cookies(BTreeMap::from([
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]));

        assert_eq!(session.cookie_header().as_deref(), Some("a=1; b=2"));
    }

    #[test]
    fn test_empty_jar_sends_no_cookie_header() {
        assert!(form_session().cookie_header().is_none());
    }

    #[test]
    fn test_token_credentials_debug_hides_token() {
        let debug = format!("{:?}", TokenCredentials::new("secret"));
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_redirect_trust_requires_same_origin() {
        let origin = Url::parse("https://www.pythonanywhere.com/login/").unwrap();

        let same_path = Url::parse("https://www.pythonanywhere.com/dashboard/").unwrap();
        let explicit_port = Url::parse("https://www.pythonanywhere.com:443/x").unwrap();
        assert!(same_origin(&origin, &same_path));
        assert!(same_origin(&origin, &explicit_port));

        let other_host = Url::parse("https://eu.pythonanywhere.com/login/").unwrap();
        let downgraded = Url::parse("http://www.pythonanywhere.com/login/").unwrap();
        let other_port = Url::parse("https://www.pythonanywhere.com:8443/x").unwrap();
        assert!(!same_origin(&origin, &other_host));
        assert!(!same_origin(&origin, &downgraded));
        assert!(!same_origin(&origin, &other_port));
    }
}
