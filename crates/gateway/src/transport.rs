//! The TCP transport: accepting client connections and driving exchanges
//! through the interceptor chain.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use http::{Method, StatusCode};
use portico_http::conn::SourceConnection;
use portico_http::protocol::{Body, HttpError, Message, ParseError, Response, header};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::exchange::{Exchange, keys};
use crate::gateway::Gateway;
use crate::interceptor::{FlowController, Outcome};
use crate::rules::Rule;

impl Gateway {
    /// Binds `port` on all interfaces and serves it until [`close_port`] or
    /// the end of the process.
    ///
    /// Returns the locally bound port, so passing 0 picks a free one. The
    /// listen port is one of the rule matching coordinates.
    ///
    /// [`close_port`]: Gateway::close_port
    pub async fn open_port(self: &Arc<Self>, port: u16) -> io::Result<u16> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let local_port = listener.local_addr()?.port();
        info!(port = local_port, "listening");

        let gateway = Arc::clone(self);
        let acceptor = tokio::spawn(gateway.accept_loop(listener, local_port));
        self.register_port(local_port, acceptor);
        Ok(local_port)
    }

    /// Stops accepting on `port`. Connections already accepted are served
    /// to completion. Returns whether the port was open.
    pub fn close_port(&self, port: u16) -> bool {
        match self.unregister_port(port) {
            Some(acceptor) => {
                acceptor.abort();
                info!(port, "stopped listening");
                true
            }
            None => false,
        }
    }

    /// Stops accepting on every open port.
    pub fn close_all(&self) {
        for (port, acceptor) in self.unregister_all_ports() {
            acceptor.abort();
            info!(port, "stopped listening");
        }
    }

    /// Registers a rule and makes sure its listen port is served.
    ///
    /// The key must name a concrete port. Returns whether the rule was new
    /// to the table; a bind failure leaves the table unchanged.
    pub async fn add_rule(self: &Arc<Self>, rule: Rule) -> io::Result<bool> {
        let port = rule.key().port();
        if !self.is_port_open(port) {
            self.open_port(port).await?;
        }
        Ok(self.table().add_if_new(rule))
    }

    /// Drops every rule on `port`, then stops serving the port once no
    /// rule needs it.
    pub fn remove_rules_by_port(&self, port: u16) {
        self.table().remove_by_port(port);
        if !self.table().any_rule_for_port(port) {
            self.close_port(port);
        }
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener, port: u16) {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(cause = %e, "failed to accept");
                    continue;
                }
            };

            let gateway = Arc::clone(&self);
            tokio::spawn(async move {
                if let Err(error) = gateway.handle_connection(stream, peer, port).await {
                    debug!(%peer, %error, "connection closed on error");
                }
            });
        }
    }

    /// Serves one client connection, exchange by exchange, until the client
    /// closes, keep-alive ends or the connection becomes unusable.
    async fn handle_connection(
        &self,
        stream: TcpStream,
        peer: SocketAddr,
        port: u16,
    ) -> Result<(), HttpError> {
        stream.set_nodelay(true).map_err(ParseError::from)?;
        let mut source = SourceConnection::new(stream, self.read_timeout());
        debug!(%peer, port, "connection opened");

        loop {
            let request = match source.read_request().await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    debug!(%peer, "client closed the connection");
                    return Ok(());
                }
                Err(ParseError::Timeout(after)) => {
                    debug!(%peer, ?after, "idle connection timed out");
                    let _ = source.shutdown().await;
                    return Ok(());
                }
                // A malformed request leaves the stream unframed; close it
                // without answering.
                Err(error) => {
                    warn!(%peer, %error, "unreadable request");
                    let _ = source.shutdown().await;
                    return Err(error.into());
                }
            };

            if request.header().expects_100_continue() {
                source.send_continue().await?;
            }

            let head_request = *request.method() == Method::HEAD;
            let client_keep_alive = request.is_keep_alive();

            let mut exchange = Exchange::new(request, port);
            exchange.set_property(keys::SOURCE_IP, peer.ip().to_string());

            let outcome = FlowController::invoke_handlers(self.chain(), &mut exchange).await;
            if outcome == Outcome::Abort {
                debug!(%peer, "exchange aborted, closing without a response");
                let _ = source.shutdown().await;
                return Ok(());
            }

            let mut response = match exchange.take_response() {
                Some(response) => response,
                None => {
                    warn!(%peer, "the chain produced no response");
                    Response::error_page(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "The gateway produced no response.",
                    )
                }
            };

            let keep_alive = client_keep_alive && response.is_keep_alive();
            if !keep_alive {
                response.header_mut().set_value(header::CONNECTION, "close");
            }
            if head_request {
                // HEAD answers keep the entity header but carry no payload.
                response.set_body(Body::empty());
            }

            source.write_response(&mut response).await?;

            if let Some(mut upstream) = exchange.take_upstream() {
                let _ = upstream.shutdown().await;
            }

            if !keep_alive {
                let _ = source.shutdown().await;
                debug!(%peer, "connection closed");
                return Ok(());
            }

            // The next head cannot be decoded while request body bytes sit
            // unread on the stream.
            exchange.request_mut().body_mut().discard().await?;
        }
    }
}
