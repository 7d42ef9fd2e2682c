use async_trait::async_trait;
use http::StatusCode;
use portico_http::protocol::Response;
use tracing::warn;

use crate::client::HttpClient;
use crate::exchange::Exchange;
use crate::interceptor::{Flow, Interceptor, InterceptorError, Outcome};

/// The terminal request-phase stage: calls the upstream service.
///
/// Always turns the exchange around. A failed call answers 502 instead of
/// killing the client connection.
#[derive(Debug)]
pub struct HttpClientInterceptor {
    client: HttpClient,
}

impl HttpClientInterceptor {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Interceptor for HttpClientInterceptor {
    fn name(&self) -> &str {
        "http-client"
    }

    fn flow(&self) -> Flow {
        Flow::Request
    }

    async fn handle_request(&self, exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        if let Err(error) = self.client.call(exchange).await {
            warn!(%error, "upstream call failed");
            exchange.set_response(Response::error_page(
                StatusCode::BAD_GATEWAY,
                &format!("The target service could not be reached: {error}"),
            ));
        }
        Ok(Outcome::Return)
    }
}
