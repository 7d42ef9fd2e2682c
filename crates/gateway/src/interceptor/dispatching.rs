use async_trait::async_trait;
use http::StatusCode;
use portico_http::protocol::{Message, Request, Response};
use tracing::debug;

use crate::exchange::Exchange;
use crate::interceptor::{Flow, Interceptor, InterceptorError, Outcome};
use crate::rules::Target;

/// Resolves where the exchange goes upstream.
///
/// Forwarding rules carry a fixed address; pass-through rules take the
/// address the request itself names, absolute-form target first, `Host`
/// header second.
#[derive(Debug)]
pub struct Dispatching {
    adjust_host_header: bool,
}

impl Dispatching {
    pub fn new(adjust_host_header: bool) -> Self {
        Self { adjust_host_header }
    }
}

#[async_trait]
impl Interceptor for Dispatching {
    fn name(&self) -> &str {
        "dispatching"
    }

    fn flow(&self) -> Flow {
        Flow::Request
    }

    async fn handle_request(&self, exchange: &mut Exchange) -> Result<Outcome, InterceptorError> {
        let Some(rule) = exchange.rule() else {
            return Ok(Outcome::Continue);
        };

        match rule.target().clone() {
            Target::Forward { host, port } => {
                let destination = format!("{host}:{port}");
                if self.adjust_host_header {
                    exchange.request_mut().header_mut().set_host(destination.clone());
                }
                debug!(%destination, "dispatching to rule target");
                exchange.set_destination(destination);
            }
            Target::PassThrough => match derive_destination(exchange.request()) {
                Some(destination) => {
                    debug!(%destination, "dispatching by request authority");
                    exchange.set_destination(destination);
                }
                None => {
                    exchange.set_response(Response::error_page(
                        StatusCode::BAD_REQUEST,
                        "The request names no host to forward to.",
                    ));
                    return Ok(Outcome::Return);
                }
            },
        }
        Ok(Outcome::Continue)
    }
}

/// The authority a pass-through request addresses, with the default HTTP
/// port filled in.
fn derive_destination(request: &Request) -> Option<String> {
    let uri = request.uri();
    let from_uri = uri
        .strip_prefix("http://")
        .or_else(|| uri.strip_prefix("https://"))
        .map(|rest| match rest.find('/') {
            Some(idx) => &rest[..idx],
            None => rest,
        })
        .filter(|authority| !authority.is_empty());

    let authority = match from_uri {
        Some(authority) => authority.to_owned(),
        None => request.header().host()?.to_owned(),
    };
    Some(if authority.contains(':') { authority } else { format!("{authority}:80") })
}
