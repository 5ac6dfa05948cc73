//! Sessions through which correlation cookies reach the application.
//!
//! The application under test learns which group and scenario it is serving
//! from three cookies set on the client session before the scenario's first
//! request. A test run may drive several named sessions (for example a plain
//! HTTP client and a real browser); the [`SessionRegistry`] resolves the one a
//! suite asked for, falling back to a configured default.

use crate::result::{CoverageError, CoverageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Cookie telling the application to record coverage for this request
pub const COLLECT_COOKIE: &str = "collect_code_coverage";
/// Cookie carrying the coverage group
pub const GROUP_COOKIE: &str = "coverage_group";
/// Cookie carrying the coverage point id
pub const POINT_COOKIE: &str = "coverage_id";

/// A cookie to attach to later requests of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    /// Cookie name
    pub name: String,
    /// Cookie value (unencoded)
    pub value: String,
    /// Path
    pub path: String,
}

impl Cookie {
    /// Create a new cookie valid for the whole site
    #[must_use]
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            path: "/".to_string(),
        }
    }

    /// Set path
    #[must_use]
    pub fn with_path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// `Set-Cookie` style string with the value form-urlencoded, which is
    /// how PHP and most frameworks decode cookie values
    #[must_use]
    pub fn to_set_cookie_string(&self) -> String {
        let value: String = url::form_urlencoded::byte_serialize(self.value.as_bytes()).collect();
        format!("{}={value}; Path={}", self.name, self.path)
    }

    /// `Set-Cookie` style string that expires this cookie immediately
    #[must_use]
    pub fn to_removal_string(&self) -> String {
        format!(
            "{}=; Path={}; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
            self.name, self.path
        )
    }
}

/// A client session whose cookies travel with its requests to the application
pub trait RemoteSession: Debug {
    /// Whether the session has been started
    fn is_started(&self) -> bool;

    /// Start the session (open the browser, build the client, ...)
    fn start(&mut self) -> CoverageResult<()>;

    /// Attach a cookie to all subsequent requests
    fn set_cookie(&mut self, cookie: Cookie) -> CoverageResult<()>;

    /// Stop sending the cookie `name` (path `/`) with later requests
    fn remove_cookie(&mut self, name: &str) -> CoverageResult<()>;

    /// Decoded value the session currently sends for `name`
    fn cookie_value(&self, name: &str) -> Option<String>;

    /// Base URL the session is pointed at, if it knows one
    fn base_url(&self) -> Option<&str> {
        None
    }
}

/// Session that only remembers what was set on it
#[derive(Debug, Clone, Default)]
pub struct MemorySession {
    started: bool,
    start_count: usize,
    cookies: Vec<Cookie>,
    base_url: Option<String>,
}

impl MemorySession {
    /// Create an unstarted session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    /// Every cookie set, in order
    #[must_use]
    pub fn cookies(&self) -> &[Cookie] {
        &self.cookies
    }

    /// How many times `start` actually started the session
    #[must_use]
    pub fn start_count(&self) -> usize {
        self.start_count
    }

    /// Clear cookies
    pub fn clear_cookies(&mut self) {
        self.cookies.clear();
    }

    /// `Cookie` request header value carrying the latest value of each cookie
    #[must_use]
    pub fn cookie_header(&self) -> String {
        let mut latest: BTreeMap<&str, &str> = BTreeMap::new();
        for cookie in &self.cookies {
            let _ = latest.insert(&cookie.name, &cookie.value);
        }
        latest
            .into_iter()
            .map(|(name, value)| {
                let value: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("{name}={value}")
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl RemoteSession for MemorySession {
    fn is_started(&self) -> bool {
        self.started
    }

    fn start(&mut self) -> CoverageResult<()> {
        self.started = true;
        self.start_count += 1;
        Ok(())
    }

    fn set_cookie(&mut self, cookie: Cookie) -> CoverageResult<()> {
        self.cookies.push(cookie);
        Ok(())
    }

    fn remove_cookie(&mut self, name: &str) -> CoverageResult<()> {
        self.cookies.retain(|c| c.name != name);
        Ok(())
    }

    fn cookie_value(&self, name: &str) -> Option<String> {
        self.cookies
            .iter()
            .rev()
            .find(|c| c.name == name)
            .map(|c| c.value.clone())
    }

    fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }
}

#[cfg(feature = "http")]
pub use http::HttpSession;

#[cfg(feature = "http")]
mod http {
    use super::{Cookie, RemoteSession};
    use crate::result::{CoverageError, CoverageResult};
    use reqwest::blocking::Client;
    use reqwest::cookie::{CookieStore, Jar};
    use std::sync::Arc;
    use std::time::Duration;
    use url::Url;

    /// Blocking HTTP session with a shared cookie jar.
    ///
    /// Step definitions issue their requests through [`HttpSession::client`],
    /// so the correlation cookies set before each scenario accompany them.
    #[derive(Debug)]
    pub struct HttpSession {
        name: String,
        base_url: Url,
        jar: Arc<Jar>,
        timeout: Duration,
        client: Option<Client>,
    }

    impl HttpSession {
        /// Create a session for the application at `base_url`
        pub fn new(name: &str, base_url: &str) -> CoverageResult<Self> {
            let base_url = Url::parse(base_url).map_err(|e| {
                CoverageError::invalid_config(format!("invalid base_url \"{base_url}\": {e}"))
            })?;
            Ok(Self {
                name: name.to_string(),
                base_url,
                jar: Arc::new(Jar::default()),
                timeout: Duration::from_secs(30),
                client: None,
            })
        }

        /// Set the request timeout of the client
        #[must_use]
        pub const fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        /// The cookie jar shared with the client
        #[must_use]
        pub fn jar(&self) -> Arc<Jar> {
            Arc::clone(&self.jar)
        }

        /// Client for requests to the application; `None` until started
        #[must_use]
        pub fn client(&self) -> Option<&Client> {
            self.client.as_ref()
        }
    }

    impl RemoteSession for HttpSession {
        fn is_started(&self) -> bool {
            self.client.is_some()
        }

        fn start(&mut self) -> CoverageResult<()> {
            let client = Client::builder()
                .cookie_provider(Arc::clone(&self.jar))
                .timeout(self.timeout)
                .build()
                .map_err(|e| CoverageError::session(&self.name, e.to_string()))?;
            self.client = Some(client);
            Ok(())
        }

        fn set_cookie(&mut self, cookie: Cookie) -> CoverageResult<()> {
            self.jar
                .add_cookie_str(&cookie.to_set_cookie_string(), &self.base_url);
            Ok(())
        }

        fn remove_cookie(&mut self, name: &str) -> CoverageResult<()> {
            self.jar
                .add_cookie_str(&Cookie::new(name, "").to_removal_string(), &self.base_url);
            Ok(())
        }

        fn cookie_value(&self, name: &str) -> Option<String> {
            let header = self.jar.cookies(&self.base_url)?;
            let header = header.to_str().ok()?;
            header
                .split("; ")
                .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
                .map(|raw| {
                    url::form_urlencoded::parse(raw.as_bytes())
                        .next()
                        .map(|(value, _)| value.into_owned())
                        .unwrap_or_default()
                })
        }

        fn base_url(&self) -> Option<&str> {
            Some(self.base_url.as_str().trim_end_matches('/'))
        }
    }
}

/// Named sessions with a default
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: BTreeMap<String, Box<dyn RemoteSession>>,
    default_session: String,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new("default")
    }
}

impl SessionRegistry {
    /// Create an empty registry whose default session is `default_session`
    #[must_use]
    pub fn new(default_session: &str) -> Self {
        Self {
            sessions: BTreeMap::new(),
            default_session: default_session.to_string(),
        }
    }

    /// Registry holding a single session registered under the default name
    #[must_use]
    pub fn single(session: impl RemoteSession + 'static) -> Self {
        let mut registry = Self::default();
        registry.register("default", session);
        registry
    }

    /// Register a session, replacing any previous one with that name
    pub fn register(&mut self, name: &str, session: impl RemoteSession + 'static) {
        let _ = self.sessions.insert(name.to_string(), Box::new(session));
    }

    /// Name of the default session
    #[must_use]
    pub fn default_session(&self) -> &str {
        &self.default_session
    }

    /// Registered names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sessions.keys().map(String::as_str)
    }

    /// Resolve a requested name (or the default when `None`) to a
    /// registered session name
    pub fn resolve(&self, requested: Option<&str>) -> CoverageResult<String> {
        let name = requested.unwrap_or(&self.default_session);
        if self.sessions.contains_key(name) {
            Ok(name.to_string())
        } else {
            Err(CoverageError::UnknownSession {
                name: name.to_string(),
                registered: self.names().collect::<Vec<_>>().join(", "),
            })
        }
    }

    /// Look up a session by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn RemoteSession> {
        self.sessions.get(name).map(|session| &**session)
    }

    /// Look up a session by name for modification
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn RemoteSession + 'static)> {
        self.sessions.get_mut(name).map(|session| &mut **session)
    }

    /// Number of registered sessions
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True when nothing is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod cookie_tests {
        use super::*;

        #[test]
        fn test_new_cookie() {
            let cookie = Cookie::new(GROUP_COOKIE, "Checkout.abc");
            assert_eq!(cookie.name, "coverage_group");
            assert_eq!(cookie.value, "Checkout.abc");
            assert_eq!(cookie.path, "/");
        }

        #[test]
        fn test_set_cookie_string_encodes_value() {
            let cookie = Cookie::new(POINT_COOKIE, "features/checkout/pay.feature:7");
            assert_eq!(
                cookie.to_set_cookie_string(),
                "coverage_id=features%2Fcheckout%2Fpay.feature%3A7; Path=/"
            );
        }

        #[test]
        fn test_removal_string_expires() {
            let removal = Cookie::new(COLLECT_COOKIE, "true").to_removal_string();
            assert!(removal.starts_with("collect_code_coverage=; Path=/"));
            assert!(removal.contains("Max-Age=0"));
        }

        #[test]
        fn test_with_path() {
            let cookie = Cookie::new("a", "b").with_path("/shop");
            assert!(cookie.to_set_cookie_string().ends_with("Path=/shop"));
        }
    }

    mod memory_session_tests {
        use super::*;

        #[test]
        fn test_start() {
            let mut session = MemorySession::new();
            assert!(!session.is_started());
            session.start().unwrap();
            assert!(session.is_started());
            assert_eq!(session.start_count(), 1);
        }

        #[test]
        fn test_latest_cookie_wins() {
            let mut session = MemorySession::new();
            session.set_cookie(Cookie::new(POINT_COOKIE, "a.feature:1")).unwrap();
            session.set_cookie(Cookie::new(POINT_COOKIE, "a.feature:9")).unwrap();
            assert_eq!(
                session.cookie_value(POINT_COOKIE).as_deref(),
                Some("a.feature:9")
            );
            assert_eq!(session.cookies().len(), 2);
        }

        #[test]
        fn test_remove_cookie() {
            let mut session = MemorySession::new();
            session.set_cookie(Cookie::new(COLLECT_COOKIE, "true")).unwrap();
            session.set_cookie(Cookie::new(GROUP_COOKIE, "g")).unwrap();
            session.remove_cookie(COLLECT_COOKIE).unwrap();
            assert!(session.cookie_value(COLLECT_COOKIE).is_none());
            assert_eq!(session.cookie_header(), "coverage_group=g");
        }

        #[test]
        fn test_cookie_header() {
            let mut session = MemorySession::new();
            session.set_cookie(Cookie::new(COLLECT_COOKIE, "true")).unwrap();
            session.set_cookie(Cookie::new(GROUP_COOKIE, "g 1")).unwrap();
            assert_eq!(
                session.cookie_header(),
                "collect_code_coverage=true; coverage_group=g+1"
            );
        }

        #[test]
        fn test_clear_cookies() {
            let mut session = MemorySession::new();
            session.set_cookie(Cookie::new("a", "b")).unwrap();
            session.clear_cookies();
            assert!(session.cookies().is_empty());
        }
    }

    mod registry_tests {
        use super::*;

        fn registry() -> SessionRegistry {
            let mut registry = SessionRegistry::new("goutte");
            registry.register("goutte", MemorySession::new());
            registry.register("selenium", MemorySession::new());
            registry
        }

        #[test]
        fn test_resolve_default() {
            assert_eq!(registry().resolve(None).unwrap(), "goutte");
        }

        #[test]
        fn test_resolve_requested() {
            assert_eq!(registry().resolve(Some("selenium")).unwrap(), "selenium");
        }

        #[test]
        fn test_resolve_unknown() {
            let err = registry().resolve(Some("chrome")).unwrap_err();
            assert!(err.to_string().contains("chrome"));
            assert!(err.to_string().contains("goutte, selenium"));
        }

        #[test]
        fn test_unregistered_default_is_an_error() {
            let registry = SessionRegistry::new("default");
            assert!(registry.resolve(None).is_err());
            assert!(registry.is_empty());
        }

        #[test]
        fn test_get_mut_sets_cookie() {
            let mut registry = SessionRegistry::single(MemorySession::new());
            let session = registry.get_mut("default").unwrap();
            session.start().unwrap();
            assert!(registry.get("default").unwrap().is_started());
            assert_eq!(registry.len(), 1);
        }
    }

    #[cfg(feature = "http")]
    mod http_session_tests {
        use super::*;
        use reqwest::cookie::CookieStore;

        #[test]
        fn test_invalid_base_url() {
            assert!(HttpSession::new("default", "not a url").is_err());
        }

        #[test]
        fn test_cookies_reach_jar() {
            let mut session = HttpSession::new("default", "http://app.test/").unwrap();
            assert!(!session.is_started());
            session.start().unwrap();
            assert!(session.is_started());
            assert!(session.client().is_some());

            session.set_cookie(Cookie::new(COLLECT_COOKIE, "true")).unwrap();
            session.set_cookie(Cookie::new(GROUP_COOKIE, "Checkout.1")).unwrap();

            let url = url::Url::parse("http://app.test/cart").unwrap();
            let header = session.jar().cookies(&url).unwrap();
            let header = header.to_str().unwrap();
            assert!(header.contains("collect_code_coverage=true"));
            assert!(header.contains("coverage_group=Checkout.1"));
        }

        #[test]
        fn test_cookie_value_is_decoded() {
            let mut session = HttpSession::new("default", "http://app.test").unwrap();
            session
                .set_cookie(Cookie::new(POINT_COOKIE, "features/a/x.feature:3"))
                .unwrap();
            assert_eq!(
                session.cookie_value(POINT_COOKIE).as_deref(),
                Some("features/a/x.feature:3")
            );
            assert!(session.cookie_value(GROUP_COOKIE).is_none());
        }

        #[test]
        fn test_removed_cookies_leave_the_shared_jar() {
            let mut session = HttpSession::new("default", "http://app.test").unwrap();
            let jar = session.jar();
            session.set_cookie(Cookie::new(COLLECT_COOKIE, "true")).unwrap();
            session.set_cookie(Cookie::new(GROUP_COOKIE, "A.1")).unwrap();

            session.remove_cookie(COLLECT_COOKIE).unwrap();

            let url = url::Url::parse("http://app.test/page").unwrap();
            let header = jar.cookies(&url).unwrap();
            let header = header.to_str().unwrap();
            assert!(!header.contains(COLLECT_COOKIE), "{header}");
            assert!(header.contains("coverage_group=A.1"));
        }

        #[test]
        fn test_base_url_trimmed() {
            let session = HttpSession::new("default", "http://app.test/").unwrap();
            assert_eq!(session.base_url(), Some("http://app.test"));
        }
    }
}
