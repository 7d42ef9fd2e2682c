//! Routing rules.
//!
//! A [`Rule`] couples a match pattern ([`RuleKey`]) with what to do on a
//! hit: where to forward ([`Target`]), whether to block either direction,
//! and which interceptors to run for matched exchanges. Rules are identified
//! by their key; the [`RuleTable`] enforces key uniqueness.

mod table;
pub use table::RuleTable;

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::interceptor::Interceptor;

/// The host or method pattern that matches anything.
pub const WILDCARD: &str = "*";

/// Immutable match pattern of a rule: listening port, host, method and a
/// path regular expression.
///
/// The path pattern matches by substring search, not full-line match, so a
/// rule path of `/orders` also hits `/v2/orders/7`. Anchor with `^...$`
/// when exact matching is wanted.
#[derive(Debug, Clone)]
pub struct RuleKey {
    host: String,
    method: String,
    path: String,
    port: u16,
    path_pattern: Regex,
}

impl RuleKey {
    /// Builds a key, compiling the path pattern eagerly so invalid rules
    /// are rejected at configuration time rather than at match time.
    pub fn new<H, M, P>(host: H, method: M, path: P, port: u16) -> Result<Self, regex::Error>
    where
        H: Into<String>,
        M: Into<String>,
        P: Into<String>,
    {
        let path = path.into();
        let path_pattern = Regex::new(&path)?;
        Ok(Self { host: host.into(), method: method.into(), path, port, path_pattern })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_wildcard_host(&self) -> bool {
        self.host == WILDCARD
    }

    /// Whether a request with the given coordinates hits this key.
    ///
    /// The request host is compared without any `:port` suffix and
    /// case-insensitively. Method compares literally unless the key holds
    /// the wildcard. The path pattern searches, it does not anchor.
    pub fn matches(&self, host: &str, method: &str, path: &str, port: u16) -> bool {
        self.port == port
            && self.host_matches(host)
            && (self.method == WILDCARD || self.method == method)
            && self.path_pattern.is_match(path)
    }

    fn host_matches(&self, request_host: &str) -> bool {
        if self.host == WILDCARD {
            return true;
        }
        let bare_host = request_host.split(':').next().unwrap_or(request_host);
        self.host.eq_ignore_ascii_case(bare_host)
    }
}

/// Two keys are equal when all four coordinates are, with the host compared
/// case-insensitively. The compiled pattern is derived state and ignored.
impl PartialEq for RuleKey {
    fn eq(&self, other: &Self) -> bool {
        self.port == other.port
            && self.method == other.method
            && self.path == other.path
            && self.host.eq_ignore_ascii_case(&other.host)
    }
}

impl Eq for RuleKey {}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {} {}", self.host, self.port, self.method, self.path)
    }
}

/// Where a matched exchange is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Forward to a fixed upstream address.
    Forward { host: String, port: u16 },
    /// Forward to whatever the request itself addresses (absolute-form
    /// target or `Host` header), proxy style.
    PassThrough,
}

impl Target {
    pub fn forward<H: Into<String>>(host: H, port: u16) -> Self {
        Target::Forward { host: host.into(), port }
    }

    /// The upstream `host:port` address, when the target is fixed.
    pub fn address(&self) -> Option<String> {
        match self {
            Target::Forward { host, port } => Some(format!("{host}:{port}")),
            Target::PassThrough => None,
        }
    }
}

/// A configured routing rule.
pub struct Rule {
    key: RuleKey,
    target: Target,
    name: String,
    block_request: bool,
    block_response: bool,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl Rule {
    pub fn new(key: RuleKey, target: Target) -> Self {
        let name = key.to_string();
        Self { key, target, name, block_request: false, block_response: false, interceptors: Vec::new() }
    }

    pub fn named<N: Into<String>>(mut self, name: N) -> Self {
        self.name = name.into();
        self
    }

    pub fn block_request(mut self, block: bool) -> Self {
        self.block_request = block;
        self
    }

    pub fn block_response(mut self, block: bool) -> Self {
        self.block_response = block;
        self
    }

    /// Appends an interceptor to run for exchanges this rule matches.
    pub fn with_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn key(&self) -> &RuleKey {
        &self.key
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request_blocked(&self) -> bool {
        self.block_request
    }

    pub fn response_blocked(&self) -> bool {
        self.block_response
    }

    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("key", &self.key)
            .field("target", &self.target)
            .field("name", &self.name)
            .field("block_request", &self.block_request)
            .field("block_response", &self.block_response)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
