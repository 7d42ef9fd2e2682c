//! A rule-based HTTP/1.x forwarding gateway built on [`portico_http`].
//!
//! The gateway accepts client connections on any number of listen ports,
//! matches every request against a table of routing rules and forwards it
//! to the service the winning rule names, relaying the response back.
//! Between the two sockets sits an interceptor pipeline that can inspect,
//! rewrite, answer or block the exchange on both its request and its
//! response side.
//!
//! # Features
//!
//! - Rules keyed by listen port, host, method and path pattern, with
//!   wildcard host/method and literal-host precedence
//! - Forwarding to a fixed target or proxy-style to whatever authority the
//!   request itself names
//! - Streaming relay: bodies flow through chunk by chunk, in their original
//!   wire framing, without full buffering
//! - Keep-alive on the client side, `Expect: 100-continue`,
//!   `X-Forwarded-For` stamping and optional `Host` rewriting
//! - Per-rule interceptors sharing one response unwind with the global
//!   chain
//!
//! # Example
//!
//! ```no_run
//! use portico_gateway::Gateway;
//! use portico_gateway::rules::{Rule, RuleKey, Target};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = Gateway::builder().build();
//!
//!     let key = RuleKey::new("*", "*", ".*", 2000)?;
//!     gateway.add_rule(Rule::new(key, Target::forward("127.0.0.1", 3000))).await?;
//!
//!     std::future::pending::<()>().await;
//!     Ok(())
//! }
//! ```

mod client;
mod exchange;
mod gateway;
pub mod interceptor;
pub mod rules;
mod transport;

pub use client::{ClientError, HttpClient};
pub use exchange::{Exchange, UpstreamConnection, keys};
pub use gateway::{Gateway, GatewayBuilder};
