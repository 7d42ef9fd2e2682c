//! The per-request context flowing through the pipeline.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use portico_http::conn::TargetConnection;
use portico_http::protocol::{Request, Response};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

use crate::interceptor::Interceptor;
use crate::rules::Rule;

/// The upstream connection type carried by an exchange.
pub type UpstreamConnection = TargetConnection<OwnedReadHalf, OwnedWriteHalf>;

/// Well-known property keys.
pub mod keys {
    /// IP address of the client that opened the source connection.
    pub const SOURCE_IP: &str = "source.ip";
}

/// One request/response round trip through the gateway.
///
/// Owns the request, the response once one exists, the matched rule once
/// matching ran, a string-keyed property map for side-channel data between
/// interceptors, and the invocation stack that records which interceptors
/// ran on the request side (see the pipeline in
/// [`FlowController`](crate::interceptor::FlowController)).
pub struct Exchange {
    request: Request,
    response: Option<Response>,
    rule: Option<Arc<Rule>>,
    properties: HashMap<String, Box<dyn Any + Send + Sync>>,
    stack: Vec<Arc<dyn Interceptor>>,
    destination: Option<String>,
    upstream: Option<UpstreamConnection>,
    listen_port: u16,
    created_at: Instant,
}

impl Exchange {
    /// Wraps a freshly decoded request arriving on the given listen port.
    pub fn new(request: Request, listen_port: u16) -> Self {
        Self {
            request,
            response: None,
            rule: None,
            properties: HashMap::new(),
            stack: Vec::new(),
            destination: None,
            upstream: None,
            listen_port,
            created_at: Instant::now(),
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn request_mut(&mut self) -> &mut Request {
        &mut self.request
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn response_mut(&mut self) -> Option<&mut Response> {
        self.response.as_mut()
    }

    /// Installs a response, replacing any earlier one.
    pub fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Takes the response out of the exchange for writing it to the client.
    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    pub fn rule(&self) -> Option<&Arc<Rule>> {
        self.rule.as_ref()
    }

    /// Fixes the rule handling this exchange. Assigned once during
    /// matching; later interceptors only read it.
    pub fn set_rule(&mut self, rule: Arc<Rule>) {
        self.rule = Some(rule);
    }

    /// Reads a typed property, `None` when absent or of another type.
    pub fn property<T: Any + Send + Sync>(&self, name: &str) -> Option<&T> {
        self.properties.get(name).and_then(|value| value.downcast_ref())
    }

    pub fn set_property<T: Any + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.properties.insert(name.into(), Box::new(value));
    }

    /// The upstream address chosen by dispatching, as `host:port`.
    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    pub fn set_destination(&mut self, destination: String) {
        self.destination = Some(destination);
    }

    pub fn set_upstream(&mut self, conn: UpstreamConnection) {
        self.upstream = Some(conn);
    }

    /// Takes the upstream connection, if the exchange went upstream. The
    /// transport releases it once the response has been written out.
    pub fn take_upstream(&mut self) -> Option<UpstreamConnection> {
        self.upstream.take()
    }

    /// The port the source connection was accepted on; one of the rule
    /// matching coordinates.
    pub fn listen_port(&self) -> u16 {
        self.listen_port
    }

    /// Time since this exchange was created.
    pub fn elapsed(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Records that an interceptor's response side still has to run.
    pub fn push_interceptor(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.stack.push(interceptor);
    }

    /// Pops the next interceptor due for response handling, LIFO.
    pub fn pop_interceptor(&mut self) -> Option<Arc<dyn Interceptor>> {
        self.stack.pop()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }
}

impl fmt::Debug for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Exchange")
            .field("request", &self.request)
            .field("response", &self.response)
            .field("rule", &self.rule.as_ref().map(|r| r.name()))
            .field("destination", &self.destination)
            .field("listen_port", &self.listen_port)
            .field("stack", &self.stack.len())
            .finish_non_exhaustive()
    }
}
