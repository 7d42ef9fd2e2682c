//! The upstream HTTP client used to call target services.

use std::io;
use std::time::Duration;

use http::{Method, StatusCode};
use portico_http::conn::TargetConnection;
use portico_http::protocol::{ParseError, SendError};
use thiserror::Error;
use tracing::debug;

use crate::exchange::Exchange;

/// Failures while calling the upstream service.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to {addr}: {source}")]
    Connect { addr: String, source: io::Error },

    #[error("could not send the request upstream: {0}")]
    Send(#[from] SendError),

    #[error("could not read the upstream response: {0}")]
    Receive(#[from] ParseError),

    #[error("the exchange has no destination to call")]
    NoDestination,
}

/// Opens a connection to the exchange's destination, relays the request and
/// installs the response.
///
/// The connection is handed to the exchange afterwards: the response body
/// may still be unread, so the connection has to outlive the call until the
/// body has been relayed to the client.
#[derive(Debug)]
pub struct HttpClient {
    connect_timeout: Duration,
    read_timeout: Duration,
}

impl HttpClient {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> Self {
        Self { connect_timeout, read_timeout }
    }

    pub async fn call(&self, exchange: &mut Exchange) -> Result<(), ClientError> {
        let addr = exchange.destination().ok_or(ClientError::NoDestination)?.to_owned();

        let mut conn = TargetConnection::connect(&addr, self.connect_timeout, self.read_timeout)
            .await
            .map_err(|source| ClientError::Connect { addr: addr.clone(), source })?;
        debug!(%addr, "connected upstream");

        let head_request = *exchange.request().method() == Method::HEAD;
        conn.write_request(exchange.request_mut()).await?;

        // Interim responses are not the answer; keep reading.
        let response = loop {
            let response = conn.read_response(head_request).await?;
            if response.status() == StatusCode::CONTINUE {
                debug!("skipping an interim 100 response");
                continue;
            }
            break response;
        };

        debug!(status = response.status().as_u16(), "upstream answered");
        exchange.set_response(response);
        exchange.set_upstream(conn);
        Ok(())
    }
}
